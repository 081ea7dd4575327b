use crate::error::Result;
use crate::Timestamp;
use std::fmt;

/// Anything that emits a byte sequence per `(index, timestamp)` sample.
///
/// Frames, cycle frames, packets and packet data units all implement this,
/// so a driver can step any of them the same way.
pub trait Generator: fmt::Debug + Send {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>>;

    /// Length of every output, or `None` when it varies between calls.
    fn output_len(&self) -> Option<usize>;

    /// Short human-readable description of the layout.
    fn describe(&self) -> String;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&mut self, index: u64, timestamp: Timestamp) -> Result<Vec<u8>> {
        (**self).generate(index, timestamp)
    }

    fn output_len(&self) -> Option<usize> {
        (**self).output_len()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
