pub use toad_msg::Code;

use crate::coap_code;

// 2.xx
coap_code!(rfc7252("5.9.1.1") CREATED = 2*01);
coap_code!(rfc7252("5.9.1.4") CHANGED = 2*04);
coap_code!(
  #[doc = concat!(
    "## [2.31 Continue](https://www.rfc-editor.org/rfc/rfc7959#section-2.9.1)\n",
    "This success status code indicates that the transfer of this\n",
    "block of the request body was successful and that the server\n",
    "encourages sending further blocks, but that a final outcome of the\n",
    "whole block-wise request cannot yet be determined.  No payload is\n",
    "returned with this response code.",
  )]
  CONTINUE = 2 * 31
);

// 4.xx
coap_code!(rfc7252("5.9.2.1")  BAD_REQUEST                = 4*00);
coap_code!(rfc7252("5.9.2.2")  UNAUTHORIZED               = 4*01);
coap_code!(rfc7252("5.9.2.4")  FORBIDDEN                  = 4*03);
coap_code!(rfc7252("5.9.2.5")  NOT_FOUND                  = 4*04);
coap_code!(rfc7252("5.9.2.6")  METHOD_NOT_ALLOWED         = 4*05);
coap_code!(
  #[doc = concat!(
    "## [4.08 Request Entity Incomplete](https://www.rfc-editor.org/rfc/rfc7959#section-2.9.2)\n",
    "This client error status code indicates that the server has not\n",
    "received the blocks of the request body that it needs to proceed.\n",
    "The client has not sent all blocks, not sent them in the order\n",
    "required by the server, or has sent them long enough ago that the\n",
    "server has already discarded them.",
  )]
  REQUEST_ENTITY_INCOMPLETE = 4 * 08
);
coap_code!(rfc7252("5.9.2.9")  REQUEST_ENTITY_TOO_LARGE   = 4*13);
coap_code!(rfc7252("5.9.2.10") UNSUPPORTED_CONTENT_FORMAT = 4*15);

// 5.xx
coap_code!(rfc7252("5.9.3.1") INTERNAL_SERVER_ERROR = 5*00);
coap_code!(rfc7252("5.9.3.4") SERVICE_UNAVAILABLE   = 5*03);

/// How the engine reads the status of a response to one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  /// [`CONTINUE`]; the block was stored and the server wants the next one
  Continue,
  /// [`CHANGED`] or [`CREATED`]; the whole body was applied
  Applied,
  /// Any other status; the transfer is over
  Rejected,
}

impl Verdict {
  /// Classify a response code
  ///
  /// ```
  /// use toad_block1::code::{self, Verdict};
  /// use toad_msg::Code;
  ///
  /// assert_eq!(Verdict::of(code::CONTINUE), Verdict::Continue);
  /// assert_eq!(Verdict::of(code::CHANGED), Verdict::Applied);
  /// assert_eq!(Verdict::of(code::CREATED), Verdict::Applied);
  /// assert_eq!(Verdict::of(Code::new(2, 05)), Verdict::Rejected);
  /// assert_eq!(Verdict::of(code::REQUEST_ENTITY_INCOMPLETE), Verdict::Rejected);
  /// ```
  pub fn of(code: Code) -> Self {
    if code == CONTINUE {
      Verdict::Continue
    } else if code == CHANGED || code == CREATED {
      Verdict::Applied
    } else {
      Verdict::Rejected
    }
  }
}

/// `"2.31"`-style rendering of a code, used in log lines
pub(crate) fn dotted(code: Code) -> toad_writable::Writable<tinyvec::ArrayVec<[u8; 8]>> {
  use core::fmt::Write;

  let mut buf = toad_writable::Writable::<tinyvec::ArrayVec<[u8; 8]>>::default();
  write!(buf, "{}.{:02}", code.class, code.detail).ok();
  buf
}
