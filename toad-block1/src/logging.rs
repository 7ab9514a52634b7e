use core::fmt::Write;

use tinyvec::ArrayVec;
use toad_writable::Writable;

use crate::block::Digest;

/// Log through the `log` facade, prefixed with the
/// function the line came from:
///
/// ```text
/// log!(Engine::fill, log::Level::Debug, "sent {}", n);
/// // [toad_block1::Engine::fill] sent 3
/// ```
macro_rules! log {
  ($at:path, $lvl:expr, $($arg:tt)*) => {
    ::log::log!(target: "toad_block1", $lvl, "[{}] {}", stringify!($at), format_args!($($arg)*))
  };
}

pub(crate) fn block_summary(d: &Digest, total_blocks: u32) -> Writable<ArrayVec<[u8; 96]>> {
  let mut buf: Writable<ArrayVec<[u8; 96]>> = Default::default();
  write!(buf,
         "block {}/{} (offset={}, len={}, more={})",
         d.num + 1,
         total_blocks,
         d.offset,
         d.len,
         d.more).ok();
  buf
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_fits_largest_values() {
    let d = Digest { num: crate::block::MAX_NUM,
                     offset: usize::MAX,
                     len: 1024,
                     more: false,
                     crc: u32::MAX };
    let s = block_summary(&d, crate::block::MAX_NUM + 1);
    assert!(s.as_str().ends_with("more=false)"));
  }

  #[test]
  fn summary() {
    let d = Digest { num: 0,
                     offset: 0,
                     len: 1024,
                     more: true,
                     crc: 0 };
    assert_eq!(block_summary(&d, 2).as_str(),
               "block 1/2 (offset=0, len=1024, more=true)");
  }
}
