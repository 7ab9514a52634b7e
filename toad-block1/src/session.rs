use std_alloc::collections::BTreeMap;
use std_alloc::string::{String, ToString};

use toad_msg::{ContentFormat, Token};

use crate::block::{self, Piece, Size};
use crate::config::Config;
use crate::error::Invalid;
use crate::event::Completion;
use crate::method::Method;
use crate::retry::Attempts;

/// Lifecycle of the engine's upload slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
  /// No upload has been started yet
  Idle,
  /// An upload is in progress
  Active,
  /// The most recent upload was applied by the server
  Completed,
  /// The most recent upload ended without success
  Failed,
}

/// A request to upload `body` to `path`.
///
/// Anything not set here falls back to the engine's
/// [`Config`](crate::config::Config).
///
/// ```
/// use toad_block1::{Method, Upload};
/// use toad_msg::ContentFormat;
///
/// let image = [0u8; 4096];
/// let up = Upload::new("/5/0/0", &image[..]).method(Method::PUT)
///                                           .content_format(ContentFormat::OctetStream)
///                                           .block_size(512)
///                                           .window(4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Upload<Src> {
  pub(crate) path: String,
  pub(crate) body: Src,
  pub(crate) content_format: ContentFormat,
  pub(crate) block_size: Option<u16>,
  pub(crate) window: Option<u32>,
  pub(crate) method: Option<Method>,
}

impl<Src> Upload<Src> {
  /// Creates an `application/octet-stream` upload.
  ///
  /// Leading and trailing `/` on `path` are ignored.
  pub fn new(path: impl AsRef<str>, body: Src) -> Self {
    Self { path: path.as_ref().trim_matches('/').to_string(),
           body,
           content_format: ContentFormat::OctetStream,
           block_size: None,
           window: None,
           method: None }
  }

  /// Set the Content-Format sent with every block
  pub fn content_format(mut self, format: ContentFormat) -> Self {
    self.content_format = format;
    self
  }

  /// Set the block size; must be a power of two from 16 to 1024
  pub fn block_size(mut self, bytes: u16) -> Self {
    self.block_size = Some(bytes);
    self
  }

  /// Set the maximum number of unacknowledged blocks
  pub fn window(mut self, blocks: u32) -> Self {
    self.window = Some(blocks);
    self
  }

  /// Set the request method
  pub fn method(mut self, method: Method) -> Self {
    self.method = Some(method);
    self
  }
}

/// Bookkeeping for one block that was handed to the transport
/// and whose completion hasn't arrived yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dispatch {
  pub(crate) attempts: Attempts,
}

/// The single in-flight upload
#[derive(Debug)]
pub(crate) struct Session<Src> {
  pub(crate) body: Src,
  pub(crate) path: String,
  pub(crate) content_format: ContentFormat,
  pub(crate) method: Method,
  pub(crate) size: Size,
  pub(crate) window: u32,
  pub(crate) token: Token,
  pub(crate) generation: u32,
  pub(crate) total_blocks: u32,
  pub(crate) next_to_send: u32,
  pub(crate) highest_acked: u32,
  pub(crate) in_flight: BTreeMap<u32, Dispatch>,
  pub(crate) status: Status,
}

/// Snapshot of the active upload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
  /// Token shared by every block
  pub token: Token,
  /// Number of blocks the body is sliced into
  pub total_blocks: u32,
  /// Number of the next block that hasn't been sent yet
  pub next_to_send: u32,
  /// One past the highest block the server has acknowledged
  pub highest_acked: u32,
  /// Blocks sent and not yet completed
  pub in_flight: usize,
  /// Configured window
  pub window: u32,
  /// Size of the body
  pub total_bytes: usize,
  /// Bytes carried by blocks the server has acknowledged
  pub acked_bytes: usize,
}

impl<Src> Session<Src> where Src: AsRef<[u8]>
{
  /// Validate an [`Upload`] and turn it into an `Active` session
  pub(crate) fn admit(upload: Upload<Src>,
                      config: &Config,
                      token: Token,
                      generation: u32)
                      -> Result<Self, Invalid> {
    let size = match upload.block_size {
      | Some(n) => Size::try_from(n).map_err(Invalid::BlockSize)?,
      | None => config.block.size,
    };

    let window = upload.window.unwrap_or(config.block.window);
    let len = upload.body.as_ref().len();
    let blocks = size.blocks_for(len);

    if upload.path.is_empty() {
      Err(Invalid::EmptyPath)
    } else if len == 0 {
      Err(Invalid::EmptyBody)
    } else if window == 0 {
      Err(Invalid::Window)
    } else if blocks > block::MAX_NUM as usize + 1 {
      Err(Invalid::TooManyBlocks(blocks))
    } else {
      Ok(Session { body: upload.body,
                   path: upload.path,
                   content_format: upload.content_format,
                   method: upload.method.unwrap_or(config.msg.method),
                   size,
                   window,
                   token,
                   generation,
                   total_blocks: blocks as u32,
                   next_to_send: 0,
                   highest_acked: 0,
                   in_flight: BTreeMap::new(),
                   status: Status::Active })
    }
  }

  pub(crate) fn total_bytes(&self) -> usize {
    self.body.as_ref().len()
  }

  /// Blocks dispatched and not yet acknowledged
  pub(crate) fn outstanding(&self) -> u32 {
    self.next_to_send - self.highest_acked
  }

  /// May another block go out right now?
  ///
  /// Both the acknowledged prefix and the blocks still waiting
  /// for a completion must leave room in the window; an early ack
  /// for a later block does not free slots held by earlier ones.
  pub(crate) fn can_send(&self) -> bool {
    self.next_to_send < self.total_blocks
    && self.outstanding() < self.window
    && self.in_flight.len() < self.window as usize
  }

  /// Have all blocks been handed to the transport?
  pub(crate) fn all_sent(&self) -> bool {
    self.next_to_send == self.total_blocks
  }

  pub(crate) fn piece(&self, num: u32) -> Option<Piece<'_>> {
    block::construct(self.body.as_ref(), self.size, num)
  }

  pub(crate) fn completion(&self, num: u32) -> Completion {
    Completion { token: self.token,
                 generation: self.generation,
                 num }
  }

  /// Does this completion belong to a block of this session
  /// that is still waiting for one?
  pub(crate) fn owns(&self, c: &Completion) -> bool {
    c.token == self.token && c.generation == self.generation && self.in_flight.contains_key(&c.num)
  }

  /// Record that block `num` was handed to the transport
  pub(crate) fn dispatched(&mut self, num: u32) {
    self.in_flight.insert(num,
                          Dispatch { attempts: Attempts::FIRST });
    self.next_to_send = num + 1;
  }

  /// Record that block `num`'s exchange is over
  pub(crate) fn settle(&mut self, num: u32) -> Option<Dispatch> {
    self.in_flight.remove(&num)
  }

  /// Record a 2.31 Continue for block `num`.
  ///
  /// Acknowledgements can arrive out of order within a window;
  /// `highest_acked` only ever moves forward.
  pub(crate) fn acked(&mut self, num: u32) {
    self.settle(num);
    self.highest_acked = self.highest_acked.max(num + 1);
  }

  pub(crate) fn is_last(&self, num: u32) -> bool {
    num + 1 == self.total_blocks
  }

  pub(crate) fn progress(&self) -> Progress {
    let sent_bytes = (self.next_to_send as usize).saturating_mul(usize::from(self.size.bytes()))
                                                 .min(self.total_bytes());
    let pending_bytes = self.in_flight
                            .keys()
                            .filter_map(|num| self.piece(*num))
                            .map(|p| p.payload.len())
                            .sum::<usize>();
    let acked_bytes = sent_bytes - pending_bytes;

    Progress { token: self.token,
               total_blocks: self.total_blocks,
               next_to_send: self.next_to_send,
               highest_acked: self.highest_acked,
               in_flight: self.in_flight.len(),
               window: self.window,
               total_bytes: self.total_bytes(),
               acked_bytes }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn token() -> Token {
    Token(tinyvec::array_vec!([u8; 8] => 1, 2, 3, 4))
  }

  fn admit(up: Upload<&[u8]>) -> Result<Session<&[u8]>, Invalid> {
    Session::admit(up, &Config::default(), token(), 0)
  }

  #[test]
  fn admit_rejects_bad_arguments() {
    let body = [0u8; 10];

    assert_eq!(admit(Upload::new("", &body[..])).unwrap_err(),
               Invalid::EmptyPath);
    assert_eq!(admit(Upload::new("///", &body[..])).unwrap_err(),
               Invalid::EmptyPath);
    assert_eq!(admit(Upload::new("a", &body[..0])).unwrap_err(),
               Invalid::EmptyBody);
    assert_eq!(admit(Upload::new("a", &body[..]).block_size(100)).unwrap_err(),
               Invalid::BlockSize(100));
    assert_eq!(admit(Upload::new("a", &body[..]).window(0)).unwrap_err(),
               Invalid::Window);
  }

  #[test]
  fn admit_rejects_bodies_block1_cannot_number() {
    let body = std_alloc::vec![0u8; (block::MAX_NUM as usize + 1) * 16 + 1];
    assert_eq!(admit(Upload::new("a", &body[..]).block_size(16)).unwrap_err(),
               Invalid::TooManyBlocks(block::MAX_NUM as usize + 2));

    assert!(admit(Upload::new("a", &body[..]).block_size(32)).is_ok());
  }

  #[test]
  fn admit_falls_back_to_config() {
    let body = [0u8; 2000];
    let s = admit(Upload::new("/fw/", &body[..])).unwrap();

    assert_eq!(s.path, "fw");
    assert_eq!(s.size, Size::S1024);
    assert_eq!(s.window, 1);
    assert_eq!(s.method, Method::POST);
    assert_eq!(s.total_blocks, 2);
    assert_eq!(s.status, Status::Active);
    assert_eq!((s.next_to_send, s.highest_acked), (0, 0));
  }

  #[test]
  fn window_bounds_outstanding_blocks() {
    let body = [0u8; 100];
    let mut s = admit(Upload::new("a", &body[..]).block_size(16).window(2)).unwrap();
    assert_eq!(s.total_blocks, 7);

    assert!(s.can_send());
    s.dispatched(0);
    assert!(s.can_send());
    s.dispatched(1);
    assert!(!s.can_send());
    assert_eq!(s.outstanding(), 2);

    // ack for block 1 arrives before block 0's
    s.acked(1);
    assert_eq!(s.highest_acked, 2);
    assert!(s.can_send());
    s.dispatched(2);

    // blocks 0 and 2 are both still waiting
    assert_eq!(s.outstanding(), 1);
    assert!(!s.can_send());

    s.acked(0);
    assert_eq!(s.highest_acked, 2);
    assert!(s.can_send());
    assert_eq!(s.in_flight.keys().copied().collect::<Vec<_>>(), vec![2]);
  }

  #[test]
  fn owns_only_in_flight_blocks_of_this_session() {
    let body = [0u8; 100];
    let mut s = admit(Upload::new("a", &body[..]).block_size(16)).unwrap();
    s.dispatched(0);

    assert!(s.owns(&s.completion(0)));
    assert!(!s.owns(&s.completion(1)));

    let mut stale = s.completion(0);
    stale.generation += 1;
    assert!(!s.owns(&stale));

    let mut other = s.completion(0);
    other.token = Token(Default::default());
    assert!(!s.owns(&other));

    s.acked(0);
    assert!(!s.owns(&s.completion(0)));
  }

  #[test]
  fn progress_reports_acked_bytes() {
    let body = [0u8; 40];
    let mut s = admit(Upload::new("a", &body[..]).block_size(16).window(3)).unwrap();
    (0..3).for_each(|n| s.dispatched(n));
    s.acked(0);
    s.acked(1);

    let p = s.progress();
    assert_eq!(p.acked_bytes, 32);
    assert_eq!(p.in_flight, 1);

    s.acked(2);
    assert_eq!(s.progress().acked_bytes, 40);
  }

  #[test]
  fn progress_counts_only_acknowledged_blocks() {
    let body = [0u8; 40];
    let mut s = admit(Upload::new("a", &body[..]).block_size(16).window(3)).unwrap();
    (0..3).for_each(|n| s.dispatched(n));

    // only the short last block has been acknowledged
    s.acked(2);
    let p = s.progress();
    assert_eq!(p.highest_acked, 3);
    assert_eq!(p.acked_bytes, 8);
    assert_eq!(p.in_flight, 2);
  }
}
