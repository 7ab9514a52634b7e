use crate::block::Size;
use crate::method::Method;

/// Configuration options related to the messages an upload sends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Msg {
  /// Seed used to generate upload [`Token`](toad_msg::Token)s.
  ///
  /// The default value is 0, although it is
  /// best practice to set this to something else.
  /// (random integer, machine identifier)
  ///
  /// _e.g. if you're deploying a fleet of sensors that
  /// all push firmware logs to the same LwM2M server, each one
  /// would ideally have a distinct token seed._
  ///
  /// ```
  /// use toad_block1::config::Msg;
  ///
  /// assert_eq!(Msg::default().token_seed, 0);
  /// ```
  pub token_seed: u64,

  /// Request method used when an [`Upload`](crate::Upload)
  /// doesn't specify one.
  ///
  /// Defaults to POST.
  ///
  /// ```
  /// use toad_block1::config::Msg;
  /// use toad_block1::Method;
  ///
  /// assert_eq!(Msg::default().method, Method::POST);
  /// ```
  pub method: Method,
}

/// Configuration options related to slicing & pipelining blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Block {
  /// Size of every block but the last.
  ///
  /// Defaults to 1024 bytes, the largest size RFC7959 permits.
  /// Links with a small MTU, or DTLS sessions with large
  /// record overhead, may need 512 or less.
  ///
  /// ```
  /// use toad_block1::block::Size;
  /// use toad_block1::config::Block;
  ///
  /// assert_eq!(Block::default().size, Size::S1024);
  /// ```
  pub size: Size,

  /// Maximum number of blocks that may be sent
  /// and not yet acknowledged at any moment.
  ///
  /// Default value is `1` (strict lock-step)
  ///
  /// ```
  /// use toad_block1::config::Block;
  ///
  /// assert_eq!(Block::default().window, 1);
  /// ```
  pub window: u32,
}

impl Default for Msg {
  fn default() -> Self {
    Msg { token_seed: 0,
          method: Method::POST }
  }
}

impl Default for Block {
  fn default() -> Self {
    Block { size: Size::S1024,
            window: 1 }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Config {
  /// See [`Msg`]
  pub msg: Msg,
  /// See [`Block`]
  pub block: Block,
}
