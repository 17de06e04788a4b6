/*! Corpus reading utilities

Input locations are unpacked if needed ([unpack]), then walked and split into components ([corpus]),
each file being classified beforehand ([format]).
!*/
pub mod corpus;
pub mod format;
pub mod unpack;

pub use corpus::{Component, ComponentSet, Organizer, MAIN_COMPONENT};
pub use format::{probe, InputFormat};
pub use unpack::{ArchiveUnpacker, Unpacker};
