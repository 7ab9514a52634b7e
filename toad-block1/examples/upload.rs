//! Upload a file (or 5000 generated bytes) to an in-process
//! CoAP resource in 512-byte blocks.
//!
//! ```text
//! cargo run --example upload -- ./firmware.bin 5/0/0
//! ```

use std::collections::VecDeque;

use toad_block1::block::Size;
use toad_block1::config::{Block, Config};
use toad_block1::event::Completion;
use toad_block1::inspect::LogDigests;
use toad_block1::transport::{self, BuildError, Transport};
use toad_block1::{code, Engine, Method, Upload};
use toad_msg::{Code, ContentFormat, MessageOptions, Token};

type Message = toad_msg::alloc::Message;

#[derive(Default)]
struct Loopback(VecDeque<(Message, Completion)>);

impl Transport for Loopback {
  type Message = Message;
  type Error = BuildError;

  fn create_message(&mut self, method: Method, token: Token) -> Result<Message, BuildError> {
    Ok(transport::message(method, token))
  }

  fn enqueue_and_send(&mut self, msg: Message, completion: Completion) -> Result<(), BuildError> {
    self.0.push_back((msg, completion));
    Ok(())
  }
}

fn serve(msg: &Message, stored: &mut Vec<u8>) -> Code {
  match msg.block1() {
    | Some(block) => {
      stored.extend(msg.payload.0.iter().copied());
      if block.more() {
        code::CONTINUE
      } else {
        code::CHANGED
      }
    },
    | None => code::BAD_REQUEST,
  }
}

fn main() {
  simple_logger::init_with_level(log::Level::Trace).unwrap();

  let mut args = std::env::args().skip(1);
  let data = match args.next() {
    | Some(file) => std::fs::read(&file).unwrap(),
    | None => (0..5000u32).map(|n| n as u8).collect(),
  };
  let path = args.next().unwrap_or_else(|| "upload".to_string());

  let engine = Engine::<Vec<u8>, LogDigests>::with_inspector(Config { block: Block { size: Size::S512,
                                                                                       window: 1 },
                                                                      ..Default::default() },
                                                             LogDigests);
  let mut link = Loopback::default();
  let mut stored = vec![];

  engine.start(&mut link,
               Upload::new(&path, data.clone()).content_format(ContentFormat::OctetStream))
        .unwrap();

  let outcome = loop {
    let (msg, completion) = link.0.pop_front().expect("upload stalled");
    let status = serve(&msg, &mut stored);

    if let Some(outcome) = engine.on_complete(&mut link, completion, Some(status)) {
      break outcome;
    }
  };

  match outcome {
    | Ok(report) => println!("uploaded {} bytes in {} blocks", report.bytes, report.blocks),
    | Err(e) => println!("upload failed: {}", e),
  }

  assert_eq!(stored, data);
}
