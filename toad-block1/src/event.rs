use toad_msg::{Code, Token};

use crate::code::Verdict;
use crate::session::Upload;

/// Context attached to every block the engine hands to
/// [`Transport::enqueue_and_send`](crate::transport::Transport::enqueue_and_send).
///
/// The transport gives it back, exactly once, when the block's
/// exchange is over (see [`Engine::on_complete`](crate::Engine::on_complete)).
///
/// `token` and `generation` identify the session the block
/// belongs to; completions that don't match the active session
/// (because it was cancelled or has already ended) are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
  /// Token of the session the block belongs to
  pub token: Token,
  /// Engine-local counter, bumped for every admitted session
  pub generation: u32,
  /// Block number
  pub num: u32,
}

/// Everything that moves the upload state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Event<Src> {
  /// A caller wants to start an upload
  AdmissionRequested(Upload<Src>),
  /// 2.31 Continue; the server stored the block and wants more
  BlockAckReceived(Completion),
  /// 2.04 Changed or 2.01 Created; the server applied the whole body
  TransferApplied(Completion, Code),
  /// Any other response status
  BlockRejected(Completion, Code),
  /// The transport got no response within its own retry budget
  BlockTimedOut(Completion),
  /// The caller gave up on the active upload
  Cancelled,
}

impl<Src> Event<Src> {
  /// Turn what a transport knows about a finished exchange
  /// (`Some(status)`, or `None` when no response arrived)
  /// into an [`Event`].
  ///
  /// ```
  /// use toad_block1::code;
  /// use toad_block1::event::{Completion, Event};
  /// use toad_msg::Token;
  ///
  /// let c = Completion { token: Token(Default::default()),
  ///                      generation: 0,
  ///                      num: 0 };
  ///
  /// assert_eq!(Event::<&[u8]>::completed(c, None), Event::BlockTimedOut(c));
  /// assert_eq!(Event::<&[u8]>::completed(c, Some(code::CONTINUE)),
  ///            Event::BlockAckReceived(c));
  /// assert_eq!(Event::<&[u8]>::completed(c, Some(code::NOT_FOUND)),
  ///            Event::BlockRejected(c, code::NOT_FOUND));
  /// ```
  pub fn completed(completion: Completion, status: Option<Code>) -> Self {
    match status.map(|c| (c, Verdict::of(c))) {
      | None => Event::BlockTimedOut(completion),
      | Some((_, Verdict::Continue)) => Event::BlockAckReceived(completion),
      | Some((c, Verdict::Applied)) => Event::TransferApplied(completion, c),
      | Some((c, Verdict::Rejected)) => Event::BlockRejected(completion, c),
    }
  }

  /// The completion this event is about, if any
  pub fn completion(&self) -> Option<Completion> {
    match self {
      | Event::BlockAckReceived(c)
      | Event::TransferApplied(c, _)
      | Event::BlockRejected(c, _)
      | Event::BlockTimedOut(c) => Some(*c),
      | Event::AdmissionRequested(_) | Event::Cancelled => None,
    }
  }
}
