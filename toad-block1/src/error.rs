use toad_msg::{Code, Token};

use crate::code::dotted;

/// Which argument to [`Engine::start`](crate::Engine::start) was unacceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Invalid {
  /// Destination path was empty
  EmptyPath,
  /// Body to upload was empty
  EmptyBody,
  /// Block size was not a power of two between 16 and 1024
  BlockSize(u16),
  /// Window was zero
  Window,
  /// Body needs more blocks than a Block1 option can number
  TooManyBlocks(usize),
}

/// Why an upload that had been admitted ended without success
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cause<E> {
  /// The transport gave up waiting for a response to a block
  Timeout,
  /// The server answered a block with a status other than
  /// 2.31 Continue, 2.04 Changed or 2.01 Created
  RemoteRejected(Code),
  /// The transport could not create or populate
  /// the message for a block
  ResourceExhausted(E),
  /// The transport refused to enqueue a block
  SendFailed(E),
  /// [`Engine::cancel`](crate::Engine::cancel) was invoked
  Cancelled,
}

/// Errors encounterable while uploading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UploadError<E> {
  /// An argument was unacceptable; nothing was sent
  InvalidArgument(Invalid),
  /// The transport reported it has no usable
  /// server connection; nothing was sent
  NotReady,
  /// Another upload is still active; it was left untouched
  TransferInProgress,
  /// The transport could not create the message for a block
  /// while the upload was being started
  ResourceExhausted(E),
  /// The transport refused to enqueue a block
  /// while the upload was being started
  SendFailed(E),
  /// The upload was running and has now ended
  Failed(Cause<E>),
}

impl<E> UploadError<E> {
  /// Was this raised before any block could be sent?
  ///
  /// ```
  /// use toad_block1::error::{Cause, UploadError};
  ///
  /// assert!(UploadError::<()>::TransferInProgress.is_admission());
  /// assert!(!UploadError::<()>::Failed(Cause::Timeout).is_admission());
  /// ```
  pub fn is_admission(&self) -> bool {
    matches!(self,
             UploadError::InvalidArgument(_)
             | UploadError::NotReady
             | UploadError::TransferInProgress)
  }
}

impl<E> From<Cause<E>> for UploadError<E> {
  fn from(c: Cause<E>) -> Self {
    UploadError::Failed(c)
  }
}

impl core::fmt::Display for Invalid {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Invalid::EmptyPath => write!(f, "path is empty"),
      | Invalid::EmptyBody => write!(f, "body is empty"),
      | Invalid::BlockSize(n) => write!(f, "{} is not a permitted block size", n),
      | Invalid::Window => write!(f, "window must be at least 1"),
      | Invalid::TooManyBlocks(n) => write!(f, "{} blocks cannot be numbered by Block1", n),
    }
  }
}

impl<E: core::fmt::Debug> core::fmt::Display for Cause<E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Cause::Timeout => write!(f, "no response to a block"),
      | Cause::RemoteRejected(c) => write!(f, "server responded {}", dotted(*c)),
      | Cause::ResourceExhausted(e) => write!(f, "could not create message: {:?}", e),
      | Cause::SendFailed(e) => write!(f, "could not send message: {:?}", e),
      | Cause::Cancelled => write!(f, "cancelled"),
    }
  }
}

impl<E: core::fmt::Debug> core::fmt::Display for UploadError<E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | UploadError::InvalidArgument(i) => write!(f, "invalid argument: {}", i),
      | UploadError::NotReady => write!(f, "no server connection"),
      | UploadError::TransferInProgress => write!(f, "another upload is in progress"),
      | UploadError::ResourceExhausted(e) => write!(f, "could not create message: {:?}", e),
      | UploadError::SendFailed(e) => write!(f, "could not send message: {:?}", e),
      | UploadError::Failed(c) => write!(f, "upload failed: {}", c),
    }
  }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for UploadError<E> {}

/// Summary of an upload the server applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
  /// Token shared by every block of the upload
  pub token: Token,
  /// Number of blocks the body was sent in
  pub blocks: u32,
  /// Size of the body
  pub bytes: usize,
  /// Status the server applied the body with
  pub code: Code,
}

/// Terminal result of an upload
pub type Outcome<E> = Result<Report, UploadError<E>>;
