/*!
# Treebank ingestion

Ingests linguistic corpora (plain text, CHAT, FoLiA, Alpino XML or archives of those)
into a document store, as size-bounded blocks of normalized sentences,
while inferring filter descriptors from sentence metadata.

The [pipelines::Upload] controller drives the whole run. External systems
(converter, document store, record persistence, progress observers) are plugged in through traits.
!*/
#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod io;
pub mod pipelines;
pub mod processing;
pub mod progress;
pub mod slug;
