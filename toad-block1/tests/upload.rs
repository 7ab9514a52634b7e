use std::collections::VecDeque;

use toad_block1::block::{Digest, Size};
use toad_block1::config::{Block, Config, Msg};
use toad_block1::event::Completion;
use toad_block1::transport::{self, BuildError, Transport};
use toad_block1::{code, Cause, Engine, Method, Outcome, Upload, UploadError};
use toad_msg::{Code, MessageOptions, Token};

type Message = toad_msg::alloc::Message;

/// A server resource that accepts a Block1 upload the
/// way an LwM2M firmware object would
#[derive(Debug, Default)]
struct Remote {
  token: Option<Token>,
  body: Vec<u8>,
  next: u32,
  reject_at: Option<u32>,
  applied: Vec<Vec<u8>>,
}

impl Remote {
  fn respond(&mut self, msg: &Message) -> Code {
    let block = msg.block1().expect("request without Block1");

    if self.reject_at == Some(block.num()) {
      return code::INTERNAL_SERVER_ERROR;
    }

    if block.num() == 0 {
      self.token = Some(msg.token);
      self.body.clear();
      self.next = 0;
    }

    if Some(msg.token) != self.token || block.num() != self.next {
      return code::REQUEST_ENTITY_INCOMPLETE;
    }

    self.body.extend(msg.payload.0.iter().copied());
    self.next += 1;

    if block.more() {
      code::CONTINUE
    } else {
      self.applied.push(core::mem::take(&mut self.body));
      code::CHANGED
    }
  }
}

/// Lossless link; exchanges complete in the order they were sent
#[derive(Debug, Default)]
struct Link {
  queue: VecDeque<(Message, Completion)>,
  sent: usize,
  drop_at: Option<usize>,
}

impl Transport for Link {
  type Message = Message;
  type Error = BuildError;

  fn create_message(&mut self, method: Method, token: Token) -> Result<Message, BuildError> {
    Ok(transport::message(method, token))
  }

  fn enqueue_and_send(&mut self, msg: Message, completion: Completion) -> Result<(), BuildError> {
    self.queue.push_back((msg, completion));
    Ok(())
  }
}

/// Deliver exchanges to `remote` one at a time until the upload ends
fn run(engine: &Engine<Vec<u8>, Vec<Digest>>,
       link: &mut Link,
       remote: &mut Remote)
       -> Outcome<BuildError> {
  loop {
    let (msg, completion) = link.queue.pop_front().expect("upload stalled");
    let n = link.sent;
    link.sent += 1;

    let status = if link.drop_at == Some(n) {
      None
    } else {
      Some(remote.respond(&msg))
    };

    if let Some(outcome) = engine.on_complete(link, completion, status) {
      return outcome;
    }
  }
}

fn engine(size: Size, window: u32) -> Engine<Vec<u8>, Vec<Digest>> {
  Engine::with_inspector(Config { msg: Msg { token_seed: 0xf00d,
                                             method: Method::PUT },
                                  block: Block { size, window } },
                         vec![])
}

fn firmware(len: usize) -> Vec<u8> {
  (0..len).map(|n| (n * 7 % 251) as u8).collect()
}

#[test]
fn uploads_are_reassembled_by_remote() {
  simple_logger::init_with_level(log::Level::Debug).ok();

  for (len, size, window) in [(2000, Size::S1024, 1),
                              (2048, Size::S1024, 2),
                              (10_000, Size::S512, 1),
                              (333, Size::S16, 1)]
  {
    let engine = engine(size, window);
    let mut link = Link::default();
    let mut remote = Remote::default();
    let image = firmware(len);

    engine.start(&mut link, Upload::new("5/0/0", image.clone()))
          .unwrap();

    let report = run(&engine, &mut link, &mut remote).unwrap();
    assert_eq!(report.bytes, len);
    assert_eq!(report.blocks as usize, size.blocks_for(len));
    assert_eq!(remote.applied, vec![image.clone()]);

    let digests = engine.map_inspector(|ds| ds.clone());
    let crcs = digests.iter()
                      .map(|d| toad_block1::block::crc32(&image[d.offset..d.offset + d.len]))
                      .collect::<Vec<_>>();
    assert_eq!(digests.iter().map(|d| d.crc).collect::<Vec<_>>(), crcs);
    assert!(!engine.is_active());
  }
}

#[test]
fn remote_error_fails_upload_and_nothing_is_applied() {
  let engine = engine(Size::S256, 1);
  let mut link = Link::default();
  let mut remote = Remote { reject_at: Some(2),
                            ..Default::default() };

  engine.start_upload(&mut link,
                      "5/0/0",
                      firmware(1000),
                      toad_msg::ContentFormat::OctetStream)
        .unwrap();

  assert_eq!(run(&engine, &mut link, &mut remote),
             Err(UploadError::Failed(Cause::RemoteRejected(code::INTERNAL_SERVER_ERROR))));
  assert!(remote.applied.is_empty());
}

#[test]
fn lost_block_fails_upload_and_retry_starts_over() {
  let engine = engine(Size::S256, 1);
  let mut link = Link { drop_at: Some(1),
                        ..Default::default() };
  let mut remote = Remote::default();
  let image = firmware(1000);

  engine.start(&mut link, Upload::new("5/0/0", image.clone()))
        .unwrap();
  assert_eq!(run(&engine, &mut link, &mut remote),
             Err(UploadError::Failed(Cause::Timeout)));

  link.drop_at = None;
  engine.start(&mut link, Upload::new("5/0/0", image.clone()))
        .unwrap();
  assert!(run(&engine, &mut link, &mut remote).is_ok());
  assert_eq!(remote.applied, vec![image]);
}
