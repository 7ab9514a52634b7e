use std_alloc::vec::Vec;

use toad_msg::{ContentFormat, Id, MessageOptions, Payload, Token, Type};

use crate::block::Header;
use crate::event::Completion;
use crate::method::Method;

/// A message under construction, before it's handed back
/// to the [`Transport`] to be sent.
pub trait Outbound {
  /// Error yielded when the message can't hold what's being added
  type Error;

  /// Set the Uri-Path options from a `/`-separated path
  fn set_path(&mut self, path: &str) -> Result<(), Self::Error>;

  /// Set the Content-Format option
  fn set_content_format(&mut self, format: ContentFormat) -> Result<(), Self::Error>;

  /// Set the Block1 option
  fn set_block1(&mut self, header: Header) -> Result<(), Self::Error>;

  /// Set the payload
  fn set_payload(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// The message layer uploads are sent through.
///
/// This is expected to be the client's existing CoAP stack:
/// it owns the server session (DTLS or plain UDP), assigns
/// message ids, retransmits CON messages, and matches responses
/// to requests by token.
///
/// For every message accepted by [`Transport::enqueue_and_send`],
/// the transport must later report the exchange's outcome **exactly once**
/// by passing the [`Completion`] back to
/// [`Engine::on_complete`](crate::Engine::on_complete), from its own event
/// loop; never from inside `enqueue_and_send`.
pub trait Transport {
  /// Message type created by this transport
  type Message: Outbound;

  /// Error yielded by this transport
  type Error: core::fmt::Debug + From<<Self::Message as Outbound>::Error>;

  /// Is there a server session messages can be sent on right now?
  ///
  /// Uploads are refused with [`UploadError::NotReady`](crate::UploadError::NotReady)
  /// while this is `false`.
  fn ready(&self) -> bool {
    true
  }

  /// Create an empty confirmable request
  fn create_message(&mut self, method: Method, token: Token) -> Result<Self::Message, Self::Error>;

  /// Queue the message to be sent, and remember `completion`
  /// so it can be handed back once the exchange is over.
  fn enqueue_and_send(&mut self,
                      msg: Self::Message,
                      completion: Completion)
                      -> Result<(), Self::Error>;
}

/// Errors encounterable while populating a [`toad_msg`] message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
  /// Ran out of storage space for options
  TooManyOptions,
}

/// Create a CON request with id 0 (the transport is expected
/// to assign a real id when it sends it)
pub fn message(method: Method, token: Token) -> toad_msg::alloc::Message {
  toad_msg::alloc::Message::new(Type::Con, method.code(), Id(0), token)
}

impl Outbound for toad_msg::alloc::Message {
  type Error = BuildError;

  fn set_path(&mut self, path: &str) -> Result<(), BuildError> {
    MessageOptions::set_path(self, path).map(|_| ())
                                        .map_err(|_| BuildError::TooManyOptions)
  }

  fn set_content_format(&mut self, format: ContentFormat) -> Result<(), BuildError> {
    MessageOptions::set_content_format(self, format).map(|_| ())
                                                    .map_err(|_| BuildError::TooManyOptions)
  }

  fn set_block1(&mut self, header: Header) -> Result<(), BuildError> {
    MessageOptions::set_block1(self, header.size.bytes(), header.num, header.more).map(|_| ())
                                                                                  .map_err(|_| {
                                                                                    BuildError::TooManyOptions
                                                                                  })
  }

  fn set_payload(&mut self, bytes: &[u8]) -> Result<(), BuildError> {
    self.payload = Payload(bytes.iter().copied().collect::<Vec<u8>>());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::Size;

  #[test]
  fn populates_toad_msg_message() {
    let token = Token(tinyvec::array_vec!([u8; 8] => 9, 9, 9, 9));
    let mut msg = message(Method::PUT, token);

    Outbound::set_path(&mut msg, "5/0/0").unwrap();
    Outbound::set_content_format(&mut msg, ContentFormat::OctetStream).unwrap();
    Outbound::set_block1(&mut msg,
                         Header { num: 7,
                                  more: true,
                                  size: Size::S256 }).unwrap();
    Outbound::set_payload(&mut msg, &[1, 2, 3]).unwrap();

    assert_eq!(msg.token, token);
    assert_eq!(msg.ty, Type::Con);
    assert_eq!(msg.code, toad_msg::Code::new(0, 3));
    assert_eq!(msg.payload.0, vec![1, 2, 3]);

    let block = msg.block1().unwrap();
    assert_eq!((block.num(), block.more(), block.size()), (7, true, 256));
  }
}
