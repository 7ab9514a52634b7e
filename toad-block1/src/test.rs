#![allow(dead_code)]

use std_alloc::vec::Vec;

use toad_msg::{MessageOptions, Token};

use crate::event::Completion;
use crate::method::Method;
use crate::transport::{self, BuildError, Transport};

pub type Message = toad_msg::alloc::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
  Create,
  Send,
  Build(BuildError),
}

impl From<BuildError> for MockError {
  fn from(e: BuildError) -> Self {
    MockError::Build(e)
  }
}

/// Transport that keeps every message it's asked to send,
/// and can be told to refuse the n-th create or enqueue.
#[derive(Debug)]
pub struct TransportMock {
  pub ready: bool,
  pub sent: Vec<(Message, Completion)>,
  pub fail_create_at: Option<usize>,
  pub fail_send_at: Option<usize>,
  pub created: usize,
}

impl Default for TransportMock {
  fn default() -> Self {
    Self { ready: true,
           sent: vec![],
           fail_create_at: None,
           fail_send_at: None,
           created: 0 }
  }
}

impl TransportMock {
  /// Completion of the most recent message carrying block `num`
  pub fn completion_of(&self, num: u32) -> Completion {
    self.sent
        .iter()
        .rev()
        .find(|(_, c)| c.num == num)
        .map(|(_, c)| *c)
        .unwrap_or_else(|| panic!("block {} was never sent", num))
  }

  /// Block numbers in the order they were enqueued
  pub fn nums(&self) -> Vec<u32> {
    self.sent.iter().map(|(m, _)| block1(m).0).collect()
  }

  pub fn tokens(&self) -> Vec<Token> {
    self.sent.iter().map(|(m, _)| m.token).collect()
  }

  /// Concatenation of every payload, in block order
  pub fn reassembled(&self) -> Vec<u8> {
    let mut sent = self.sent.iter().collect::<Vec<_>>();
    sent.sort_by_key(|(m, _)| block1(m).0);
    sent.into_iter()
        .flat_map(|(m, _)| m.payload.0.iter().copied())
        .collect()
  }
}

/// `(num, more, size)` of a message's Block1 option
pub fn block1(msg: &Message) -> (u32, bool, u16) {
  let b = msg.block1().expect("message has no Block1 option");
  (b.num(), b.more(), b.size())
}

impl Transport for TransportMock {
  type Message = Message;
  type Error = MockError;

  fn ready(&self) -> bool {
    self.ready
  }

  fn create_message(&mut self, method: Method, token: Token) -> Result<Message, MockError> {
    let n = self.created;
    self.created += 1;

    if self.fail_create_at == Some(n) {
      Err(MockError::Create)
    } else {
      Ok(transport::message(method, token))
    }
  }

  fn enqueue_and_send(&mut self, msg: Message, completion: Completion) -> Result<(), MockError> {
    if self.fail_send_at == Some(self.sent.len()) {
      Err(MockError::Send)
    } else {
      self.sent.push((msg, completion));
      Ok(())
    }
  }
}
