use rand::{RngCore, SeedableRng};
use tinyvec::ArrayVec;
use toad_msg::Token;

/// Number of bytes in every upload token
pub const LEN: usize = 4;

/// Hands out the token for each new upload session.
///
/// Tokens are drawn from a ChaCha8 stream seeded with
/// [`Msg.token_seed`](crate::config::Msg::token_seed), and a token
/// is never equal to the one issued right before it, so a late
/// response for the previous session can't be mistaken
/// for one belonging to the current session.
#[derive(Debug, Clone)]
pub struct Tokens {
  rng: rand_chacha::ChaCha8Rng,
  last: Option<Token>,
}

impl Tokens {
  /// Create a token source
  pub fn new(seed: u64) -> Self {
    Self { rng: rand_chacha::ChaCha8Rng::seed_from_u64(seed),
           last: None }
  }

  /// Get a fresh token
  ///
  /// ```
  /// use toad_block1::token::{Tokens, LEN};
  ///
  /// let mut tokens = Tokens::new(0);
  /// let a = tokens.next();
  /// let b = tokens.next();
  ///
  /// assert_eq!(a.0.len(), LEN);
  /// assert_ne!(a, b);
  /// ```
  #[allow(clippy::should_implement_trait)]
  pub fn next(&mut self) -> Token {
    loop {
      let mut bytes = [0u8; LEN];
      self.rng.fill_bytes(&mut bytes);

      let token = Token(bytes.into_iter().collect::<ArrayVec<[u8; 8]>>());
      if Some(token) != self.last {
        self.last = Some(token);
        break token;
      }
    }
  }

  /// The most recently issued token
  pub fn last(&self) -> Option<Token> {
    self.last
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_seed_same_sequence() {
    let mut a = Tokens::new(1234);
    let mut b = Tokens::new(1234);
    (0..16).for_each(|_| assert_eq!(a.next(), b.next()));
  }

  #[test]
  fn different_seeds_diverge() {
    let mut a = Tokens::new(1);
    let mut b = Tokens::new(2);
    assert_ne!(a.next(), b.next());
  }

  #[test]
  fn consecutive_tokens_never_repeat() {
    let mut tokens = Tokens::new(0);
    let mut prev = tokens.next();
    (0..1000).for_each(|_| {
               let t = tokens.next();
               assert_ne!(t, prev);
               assert_eq!(tokens.last(), Some(t));
               prev = t;
             });
  }
}
