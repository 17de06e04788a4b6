/*! Content processing

Turns the files of a component into normalized sentences, aggregates their metadata
and gathers them into size-bounded blocks.
!*/
pub mod chunks;
pub mod convert;
pub mod metadata;
pub mod sentence;

pub use chunks::{chunk, Block, Blocks};
pub use convert::{Converter, NoConverter, ProcessConverter};
pub use metadata::{Facet, FieldDescriptor, MetadataDiscovery};
pub use sentence::{MetaEntry, Normalizer, Sentence};
