/// Largest block number a Block1 option can carry (20 bits)
pub const MAX_NUM: u32 = (1 << 20) - 1;

/// One of the 7 block sizes RFC7959 permits (16 to 1024, powers of 2)
///
/// ```
/// use toad_block1::block::Size;
///
/// assert_eq!(Size::new(512), Some(Size::S512));
/// assert_eq!(Size::new(500), None);
/// assert_eq!(Size::new(2048), None);
/// assert_eq!(Size::S1024.szx(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Size(u16);

impl Size {
  #[allow(missing_docs)]
  pub const S16: Size = Size(16);
  #[allow(missing_docs)]
  pub const S32: Size = Size(32);
  #[allow(missing_docs)]
  pub const S64: Size = Size(64);
  #[allow(missing_docs)]
  pub const S128: Size = Size(128);
  #[allow(missing_docs)]
  pub const S256: Size = Size(256);
  #[allow(missing_docs)]
  pub const S512: Size = Size(512);
  #[allow(missing_docs)]
  pub const S1024: Size = Size(1024);

  /// Accepts only the permitted sizes; anything else is `None`
  pub fn new(bytes: u16) -> Option<Self> {
    if (16..=1024).contains(&bytes) && bytes.is_power_of_two() {
      Some(Size(bytes))
    } else {
      None
    }
  }

  /// Size in bytes
  pub fn bytes(&self) -> u16 {
    self.0
  }

  /// The 3-bit size exponent sent on the wire; `size = 2^(szx + 4)`
  pub fn szx(&self) -> u8 {
    (self.0.trailing_zeros() - 4) as u8
  }

  /// How many blocks of this size it takes to carry `len` bytes
  ///
  /// ```
  /// use toad_block1::block::Size;
  ///
  /// assert_eq!(Size::S1024.blocks_for(2000), 2);
  /// assert_eq!(Size::S1024.blocks_for(2048), 2);
  /// assert_eq!(Size::S1024.blocks_for(2049), 3);
  /// assert_eq!(Size::S1024.blocks_for(0), 0);
  /// ```
  pub fn blocks_for(&self, len: usize) -> usize {
    let size = usize::from(self.0);
    (len + size - 1) / size
  }
}

impl TryFrom<u16> for Size {
  type Error = u16;

  fn try_from(bytes: u16) -> Result<Self, u16> {
    Size::new(bytes).ok_or(bytes)
  }
}

/// The three fields of a Block1 option
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Header {
  /// Index of this block within the body
  pub num: u32,
  /// Whether more blocks follow this one
  pub more: bool,
  /// Size of every block in the body
  pub size: Size,
}

impl Header {
  /// Option value as laid out on the wire: `NUM | M | SZX`
  ///
  /// ```
  /// use toad_block1::block::{Header, Size};
  ///
  /// let h = Header { num: 3,
  ///                  more: true,
  ///                  size: Size::S128 };
  /// assert_eq!(h.value(), 59);
  /// ```
  pub fn value(&self) -> u32 {
    (self.num << 4) | (u32::from(self.more) << 3) | u32::from(self.size.szx())
  }
}

/// Block `n` of some body, borrowed straight out of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
  /// Block1 fields for this piece
  pub header: Header,
  /// Byte offset of the payload within the body
  pub offset: usize,
  /// The bytes this block carries
  pub payload: &'a [u8],
}

impl<'a> Piece<'a> {
  /// Compute the diagnostic record for this piece
  pub fn digest(&self) -> Digest {
    Digest { num: self.header.num,
             offset: self.offset,
             len: self.payload.len(),
             more: self.header.more,
             crc: crc32(self.payload) }
  }
}

/// What was sent as block `num`, for logs & cross-checking
/// against the body.
///
/// The CRC never gates progress; corrupt blocks are caught
/// by the transport (DTLS / UDP checksum), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
  /// Block number
  pub num: u32,
  /// Byte offset of the block within the body
  pub offset: usize,
  /// Payload length
  pub len: usize,
  /// Whether more blocks follow
  pub more: bool,
  /// CRC-32 (IEEE 802.3) of the payload
  pub crc: u32,
}

/// Slice block `num` out of `body`.
///
/// Length and the "more" flag are derived from
/// `(num, size, body.len())` and nothing else, so
/// every caller agrees on them.
///
/// Yields `None` when `num` is past the end of `body`.
///
/// ```
/// use toad_block1::block::{self, Size};
///
/// let body = [7u8; 2000];
///
/// let first = block::construct(&body, Size::S1024, 0).unwrap();
/// assert_eq!(first.payload.len(), 1024);
/// assert!(first.header.more);
///
/// let last = block::construct(&body, Size::S1024, 1).unwrap();
/// assert_eq!(last.offset, 1024);
/// assert_eq!(last.payload.len(), 976);
/// assert!(!last.header.more);
///
/// assert!(block::construct(&body, Size::S1024, 2).is_none());
/// ```
pub fn construct(body: &[u8], size: Size, num: u32) -> Option<Piece<'_>> {
  let offset = (num as usize).checked_mul(usize::from(size.bytes()))?;
  if offset >= body.len() {
    return None;
  }

  let len = usize::from(size.bytes()).min(body.len() - offset);
  let more = offset + len < body.len();

  Some(Piece { header: Header { num, more, size },
               offset,
               payload: &body[offset..offset + len] })
}

/// CRC-32 with the IEEE 802.3 polynomial (reflected,
/// init `0xFFFFFFFF`, final complement)
///
/// ```
/// assert_eq!(toad_block1::block::crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn crc32(bytes: &[u8]) -> u32 {
  let mut hasher = crc32fast::Hasher::new();
  hasher.update(bytes);
  hasher.finalize()
}
