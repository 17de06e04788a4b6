/*!
# IO utilities

Reading of input locations (archives, directories, single files) and writing of blocks and records.
!*/
pub mod reader;
pub mod writer;

pub use reader::{ComponentSet, InputFormat};
pub use writer::{CorpusRecords, DocumentStore};
