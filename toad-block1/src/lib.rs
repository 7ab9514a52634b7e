//! `toad-block1` drives large request bodies (firmware images, camera frames,
//! log bundles) to a CoAP / LwM2M server using
//! [Block1 block-wise transfers](https://www.rfc-editor.org/rfc/rfc7959).
//!
//! ## Block-wise uploads
//! A CoAP message has to fit in a single datagram, so a body that is larger
//! than the link MTU is split into numbered blocks of a fixed power-of-two
//! size. Every block is a separate request carrying the same token and a
//! Block1 option telling the server:
//! - which block this is (`NUM`)
//! - whether more blocks follow (`M`)
//! - how big each block is (`SZX`)
//!
//! The server answers every block except the last one with
//! [`2.31 Continue`](code::CONTINUE), and answers the last one with the final
//! outcome of the whole request, usually [`2.04 Changed`](code::CHANGED).
//!
//! ## The engine
//! [`Engine`] owns at most one upload at a time. It does no IO of its own;
//! messages are created and sent through a [`Transport`](transport::Transport)
//! you provide, and the transport's event loop hands each response (or
//! timeout) back to the engine as an [`Event`](event::Event).
//!
//! ```
//! use toad_block1::event::Completion;
//! use toad_block1::transport::Transport;
//! use toad_block1::{code, Engine, Method};
//! use toad_msg::{ContentFormat, Token};
//!
//! # #[derive(Default)]
//! # struct Sent(Vec<Completion>);
//! # impl Transport for Sent {
//! #   type Message = toad_msg::alloc::Message;
//! #   type Error = toad_block1::transport::BuildError;
//! #   fn create_message(&mut self, method: Method, token: Token) -> Result<Self::Message, Self::Error> {
//! #     Ok(toad_block1::transport::message(method, token))
//! #   }
//! #   fn enqueue_and_send(&mut self, _: Self::Message, c: Completion) -> Result<(), Self::Error> {
//! #     self.0.push(c);
//! #     Ok(())
//! #   }
//! # }
//! let image = vec![0u8; 2000];
//! let engine = Engine::<&[u8]>::default();
//! let mut transport = Sent::default();
//!
//! engine.start_upload(&mut transport, "fw/image", &image, ContentFormat::OctetStream)
//!       .unwrap();
//!
//! // the server accepts block 0 and expects more
//! let block0 = transport.0.remove(0);
//! assert!(engine.on_complete(&mut transport, block0, Some(code::CONTINUE))
//!               .is_none());
//!
//! // the server applies the whole image after block 1
//! let block1 = transport.0.remove(0);
//! let report = engine.on_complete(&mut transport, block1, Some(code::CHANGED))
//!                    .unwrap()
//!                    .unwrap();
//! assert_eq!(report.bytes, 2000);
//! ```

// x-release-please-version
#![doc(html_root_url = "https://docs.rs/toad-block1/0.1.0")]
// x-release-please-end
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]
// -
// features
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc as std_alloc;

#[macro_use]
pub(crate) mod logging;

#[cfg(test)]
pub(crate) mod test;

/// slicing a buffer into Block1 pieces
pub mod block;

/// response codes and how the engine interprets them
pub mod code;

/// configuring runtime behavior
pub mod config;

/// the upload state machine
pub mod engine;

/// errors and terminal outcomes
pub mod error;

/// inputs to the upload state machine
pub mod event;

/// observing every block as it is dispatched
pub mod inspect;

/// request methods
pub mod method;

/// seam for re-sending blocks
pub mod retry;

/// upload requests and the in-flight session record
pub mod session;

/// per-session correlation tokens
pub mod token;

/// the message layer the engine sends through
pub mod transport;

pub use engine::Engine;
pub use error::{Cause, Outcome, Report, UploadError};
pub use method::Method;
pub use session::Upload;

macro_rules! coap_code {
  (rfc7252($section:literal) $name:ident = $c:literal * $d:literal) => {
    #[doc = toad_macros::rfc_7252_doc!($section)]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: toad_msg::Code = toad_msg::Code::new($c, $d);
  };
  (rfc7252($section:literal) $name:ident = $newtype:tt($c:literal * $d:literal)) => {
    #[doc = toad_macros::rfc_7252_doc!($section)]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: $newtype = $newtype(toad_msg::Code::new($c, $d));
  };
  (#[doc = $doc:expr] $name:ident = $c:literal * $d:literal) => {
    #[doc = $doc]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: toad_msg::Code = toad_msg::Code::new($c, $d);
  };
}

pub(crate) use coap_code;
