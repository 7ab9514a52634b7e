use toad_msg::{Code, ContentFormat};
use toad_stem::Stem;

use crate::block::Piece;
use crate::code::{self, dotted};
use crate::config::Config;
use crate::error::{Cause, Outcome, Report, UploadError};
use crate::event::{Completion, Event};
use crate::inspect::Inspect;
use crate::logging;
use crate::session::{Progress, Session, Status, Upload};
use crate::token::Tokens;
use crate::transport::{Outbound, Transport};

/// The engine's one upload slot, and what outlives
/// the sessions that pass through it
#[derive(Debug)]
struct Slot<Src> {
  session: Option<Session<Src>>,
  tokens: Tokens,
  generation: u32,
  last: Status,
}

/// Drives at most one Block1 upload at a time.
///
/// The engine performs no IO and never blocks; [`Engine::start`]
/// sends the first window of blocks and returns, and every further
/// step happens when the transport reports a block's outcome through
/// [`Engine::on_complete`] (or [`Engine::handle`]).
///
/// Every method takes `&self`; the session slot is guarded by a
/// [`Stem`] (an `RwLock` with feature `std`, a `RefCell` without),
/// so the admission check and every session mutation are serialized.
///
/// ```
/// use toad_block1::block::Size;
/// use toad_block1::config::{Block, Config};
/// use toad_block1::Engine;
///
/// let engine = Engine::<Vec<u8>>::new(Config { block: Block { size: Size::S512,
///                                                             window: 4 },
///                                               ..Default::default() });
///
/// assert!(!engine.is_active());
/// assert!(engine.progress().is_none());
/// ```
pub struct Engine<Src, I = ()> {
  config: Config,
  slot: Stem<Slot<Src>>,
  inspect: Stem<I>,
}

impl<Src, I> core::fmt::Debug for Engine<Src, I> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Engine")
     .field("config", &self.config)
     .field("status", &self.status())
     .finish()
  }
}

impl<Src> Engine<Src, ()> {
  /// Create an engine with no [`Inspect`]or
  pub fn new(config: Config) -> Self {
    Self::with_inspector(config, ())
  }
}

impl<Src> Default for Engine<Src, ()> {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl<Src, I> Engine<Src, I> {
  /// Create an engine that reports every dispatched block to `inspect`
  ///
  /// ```
  /// use toad_block1::block::Digest;
  /// use toad_block1::config::Config;
  /// use toad_block1::Engine;
  ///
  /// let engine = Engine::<Vec<u8>, Vec<Digest>>::with_inspector(Config::default(), vec![]);
  /// assert!(engine.map_inspector(|ds| ds.is_empty()));
  /// ```
  pub fn with_inspector(config: Config, inspect: I) -> Self {
    Self { slot: Stem::new(Slot { session: None,
                                  tokens: Tokens::new(config.msg.token_seed),
                                  generation: 0,
                                  last: Status::Idle }),
           inspect: Stem::new(inspect),
           config }
  }

  /// Borrow the [`Inspect`]or
  pub fn map_inspector<R>(&self, f: impl FnOnce(&I) -> R) -> R {
    let mut f = Some(f);
    self.inspect.map_ref(|i| match Option::take(&mut f) {
                  | Some(f) => f(i),
                  | None => unreachable!(),
                })
  }

  /// The config this engine was created with
  pub fn config(&self) -> Config {
    self.config
  }

  /// [`Status::Active`] while an upload is running, otherwise the
  /// terminal status of the most recent upload
  pub fn status(&self) -> Status {
    self.slot.map_ref(|slot| slot.session.as_ref().map(|s| s.status).unwrap_or(slot.last))
  }

  /// Is an upload running?
  pub fn is_active(&self) -> bool {
    self.status() == Status::Active
  }

  fn with_slot<R>(&self, f: impl FnOnce(&mut Slot<Src>) -> R) -> R {
    let mut f = Some(f);
    self.slot.map_mut(|slot| match Option::take(&mut f) {
               | Some(f) => f(slot),
               | None => unreachable!(),
             })
  }
}

impl<Src, I> Engine<Src, I>
  where Src: AsRef<[u8]>,
        I: Inspect
{
  /// Upload `data` to `path` with the configured block size,
  /// window and method.
  ///
  /// See [`Engine::start`].
  pub fn start_upload<T>(&self,
                         transport: &mut T,
                         path: &str,
                         data: Src,
                         content_format: ContentFormat)
                         -> Result<(), UploadError<T::Error>>
    where T: Transport
  {
    self.start(transport,
               Upload::new(path, data).content_format(content_format))
  }

  /// Start an upload and send its first window of blocks.
  ///
  /// Errors returned here mean the upload is over (or never
  /// began); nothing further will be reported for it.
  ///
  /// If this returns `Ok`, exactly one [`Outcome`] will eventually be
  /// returned from [`Engine::on_complete`] / [`Engine::handle`]
  /// (or [`Engine::cancel`]).
  pub fn start<T>(&self, transport: &mut T, upload: Upload<Src>) -> Result<(), UploadError<T::Error>>
    where T: Transport
  {
    self.with_slot(|slot| self.admit(slot, transport, upload))
  }

  /// Translate the outcome of a block's exchange into an
  /// [`Event`] and [`handle`](Engine::handle) it.
  ///
  /// `status` is `None` when the transport gave up waiting
  /// for a response.
  pub fn on_complete<T>(&self,
                        transport: &mut T,
                        completion: Completion,
                        status: Option<Code>)
                        -> Option<Outcome<T::Error>>
    where T: Transport
  {
    self.handle(transport, Event::completed(completion, status))
  }

  /// Advance the upload state machine.
  ///
  /// Yields `Some` exactly once per admitted upload, when it
  /// reaches a terminal state, or when an
  /// [`Event::AdmissionRequested`] is refused.
  pub fn handle<T>(&self, transport: &mut T, event: Event<Src>) -> Option<Outcome<T::Error>>
    where T: Transport
  {
    self.with_slot(|slot| self.step(slot, transport, event))
  }

  /// Give up on the active upload.
  ///
  /// Blocks already handed to the transport are not recalled;
  /// their completions will be ignored.
  pub fn cancel<E>(&self) -> Option<Outcome<E>> {
    self.with_slot(|slot| Self::cancel_in(slot))
  }

  /// Snapshot of the active upload
  pub fn progress(&self) -> Option<Progress> {
    self.slot.map_ref(|slot| slot.session.as_ref().map(Session::progress))
  }

  fn step<T>(&self,
             slot: &mut Slot<Src>,
             transport: &mut T,
             event: Event<Src>)
             -> Option<Outcome<T::Error>>
    where T: Transport
  {
    let completion = match event {
      | Event::AdmissionRequested(upload) => {
        return self.admit(slot, transport, upload).err().map(Err)
      },
      | Event::Cancelled => return Self::cancel_in(slot),
      | ref ev => ev.completion()?,
    };

    let session = match slot.session.as_mut() {
      | Some(s) if s.owns(&completion) => s,
      | _ => {
        log!(Engine::step,
             log::Level::Debug,
             "ignoring completion for block {} of a session that is over or never sent it",
             completion.num);
        return None;
      },
    };

    match event {
      | Event::BlockAckReceived(_) if session.is_last(completion.num) => {
        session.settle(completion.num);
        log!(Engine::step,
             log::Level::Error,
             "server answered {} to the last block; no final status will follow",
             dotted(code::CONTINUE).as_str());
        Some(Err(Self::fail(slot, Cause::RemoteRejected(code::CONTINUE))))
      },
      | Event::BlockAckReceived(_) => {
        session.acked(completion.num);

        if session.all_sent() {
          None
        } else {
          match self.fill(session, transport) {
            | Ok(()) => None,
            | Err(cause) => Some(Err(Self::fail(slot, cause))),
          }
        }
      },
      | Event::TransferApplied(_, code) => {
        session.settle(completion.num);

        if !session.is_last(completion.num) {
          log!(Engine::step,
               log::Level::Warn,
               "server answered {} to block {} of {}; treating the upload as applied",
               dotted(code).as_str(),
               completion.num,
               session.total_blocks);
        }

        let report = Report { token: session.token,
                              blocks: session.total_blocks,
                              bytes: session.total_bytes(),
                              code };
        Self::finish(slot, Status::Completed);

        log!(Engine::step,
             log::Level::Info,
             "upload applied ({}): {} bytes in {} blocks",
             dotted(code).as_str(),
             report.bytes,
             report.blocks);
        Some(Ok(report))
      },
      | Event::BlockRejected(_, code) => {
        let attempts = session.settle(completion.num).map(|d| d.attempts.0);
        log!(Engine::step,
             log::Level::Error,
             "server rejected block {} (sent {:?} times): {}",
             completion.num,
             attempts,
             dotted(code).as_str());
        Some(Err(Self::fail(slot, Cause::RemoteRejected(code))))
      },
      | Event::BlockTimedOut(_) => {
        let attempts = session.settle(completion.num).map(|d| d.attempts.0);
        log!(Engine::step,
             log::Level::Error,
             "no response to block {} (sent {:?} times)",
             completion.num,
             attempts);
        Some(Err(Self::fail(slot, Cause::Timeout)))
      },
      | Event::AdmissionRequested(_) | Event::Cancelled => None,
    }
  }

  fn admit<T>(&self,
              slot: &mut Slot<Src>,
              transport: &mut T,
              upload: Upload<Src>)
              -> Result<(), UploadError<T::Error>>
    where T: Transport
  {
    if slot.session.is_some() {
      log!(Engine::admit,
           log::Level::Warn,
           "refusing upload to /{}; another upload is in progress",
           upload.path);
      return Err(UploadError::TransferInProgress);
    }

    if !transport.ready() {
      log!(Engine::admit, log::Level::Warn, "no server connection");
      return Err(UploadError::NotReady);
    }

    let generation = slot.generation.wrapping_add(1);
    let token = slot.tokens.next();
    let mut session = match Session::admit(upload, &self.config, token, generation) {
      | Ok(s) => s,
      | Err(e) => {
        log!(Engine::admit, log::Level::Warn, "{}", e);
        return Err(UploadError::InvalidArgument(e));
      },
    };
    slot.generation = generation;

    log!(Engine::admit,
         log::Level::Info,
         "sending {} bytes to /{} in {} blocks of {} bytes (window {}, token {:x?})",
         session.total_bytes(),
         session.path,
         session.total_blocks,
         session.size.bytes(),
         session.window,
         token.0.as_slice());

    match self.fill(&mut session, transport) {
      | Ok(()) => {
        slot.session = Some(session);
        Ok(())
      },
      | Err(cause) => {
        slot.session = Some(session);
        Err(match Self::fail(slot, cause) {
          | UploadError::Failed(Cause::ResourceExhausted(e)) => UploadError::ResourceExhausted(e),
          | UploadError::Failed(Cause::SendFailed(e)) => UploadError::SendFailed(e),
          | other => other,
        })
      },
    }
  }

  /// Send as many not-yet-sent blocks as the window allows
  fn fill<T>(&self, session: &mut Session<Src>, transport: &mut T) -> Result<(), Cause<T::Error>>
    where T: Transport
  {
    while session.can_send() {
      let num = session.next_to_send;
      let piece = match session.piece(num) {
        | Some(p) => p,
        | None => break,
      };

      let mut msg = transport.create_message(session.method, session.token)
                             .map_err(Cause::ResourceExhausted)?;
      Self::populate(&mut msg, session, &piece).map_err(|e| Cause::ResourceExhausted(T::Error::from(e)))?;
      transport.enqueue_and_send(msg, session.completion(num))
               .map_err(Cause::SendFailed)?;

      let digest = piece.digest();
      session.dispatched(num);
      self.inspect.map_mut(|i| i.dispatched(&digest));

      log!(Engine::fill,
           log::Level::Debug,
           "{}",
           logging::block_summary(&digest, session.total_blocks).as_str());
    }

    Ok(())
  }

  fn populate<M>(msg: &mut M, session: &Session<Src>, piece: &Piece<'_>) -> Result<(), M::Error>
    where M: Outbound
  {
    msg.set_path(&session.path)?;
    msg.set_content_format(session.content_format)?;
    msg.set_block1(piece.header)?;
    msg.set_payload(piece.payload)
  }

  fn cancel_in<E>(slot: &mut Slot<Src>) -> Option<Outcome<E>> {
    slot.session.as_ref()?;
    log!(Engine::cancel, log::Level::Info, "upload cancelled");
    Some(Err(Self::fail(slot, Cause::Cancelled)))
  }

  fn fail<E>(slot: &mut Slot<Src>, cause: Cause<E>) -> UploadError<E> {
    Self::finish(slot, Status::Failed);
    cause.into()
  }

  /// Release the session; anything still in flight for it
  /// is stale from here on.
  fn finish(slot: &mut Slot<Src>, status: Status) {
    if let Some(mut session) = slot.session.take() {
      session.status = status;
      slot.last = session.status;
    }
  }
}
