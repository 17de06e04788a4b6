/*!
# Block and record writing

Blocks leave the pipeline through a [DocumentStore], each one becoming a named document set.
What was created is recorded through [CorpusRecords], so that a failed corpus can be rolled back as a whole by the caller.
!*/
pub mod records;
pub mod store;

pub use records::{ComponentRecord, CorpusRecords, DocumentSetRecord, Manifest, ManifestRecords};
pub use store::{DirectoryStore, DocumentStore};
