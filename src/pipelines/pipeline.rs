//! Pipeline trait.
use crate::error::Error;

/// Runs a pipeline from start to end.
///
/// Generic over the output so that pipelines that produce a summary
/// can share the trait with the ones that don't.
pub trait Pipeline<T> {
    fn run(&mut self) -> Result<T, Error>;
}
