use std_alloc::vec::Vec;

use crate::block::Digest;

/// Diagnostic hook invoked with the [`Digest`] of every
/// block right after the transport accepted it.
///
/// Provided implementations:
///  - `()` ignores everything (the default)
///  - `Vec<Digest>` collects every digest, handy in tests
///  - [`LogDigests`] logs every digest at `TRACE`
pub trait Inspect {
  /// A block was handed to the transport
  fn dispatched(&mut self, digest: &Digest);
}

impl Inspect for () {
  fn dispatched(&mut self, _: &Digest) {}
}

impl Inspect for Vec<Digest> {
  fn dispatched(&mut self, digest: &Digest) {
    self.push(*digest);
  }
}

/// [`Inspect`]or that writes every digest to the `log` facade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogDigests;

impl Inspect for LogDigests {
  fn dispatched(&mut self, d: &Digest) {
    log!(LogDigests::dispatched,
         log::Level::Trace,
         "block {} offset={} len={} crc32={:08x}",
         d.num,
         d.offset,
         d.len,
         d.crc);
  }
}
