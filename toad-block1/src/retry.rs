//! Blocks are never re-sent by the engine.
//!
//! A lost or rejected block fails the whole upload; retransmission
//! of individual messages is left to the transport's own CON retry
//! budget. Each dispatched block still records how many times it has
//! been sent so that a bounded re-send policy can be added later
//! without changing the session layout.

/// A number of attempts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Attempts(pub u16);

impl Attempts {
  /// The first send of a block
  pub const FIRST: Attempts = Attempts(1);
}
