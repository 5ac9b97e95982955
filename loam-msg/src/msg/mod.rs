use std_alloc::collections::BTreeMap;
use std_alloc::string::String;
use std_alloc::vec::Vec;

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

use crate::cursor::Cursor;
use crate::from_bytes::TryConsumeBytes;
use crate::TryFromBytes;

/// The message body, possibly empty.
///
/// On the wire a non-empty payload is preceded by the `0xFF`
/// payload marker; the marker is never part of the payload itself.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Payload(pub Vec<u8>);

/// The set of options in a message.
///
/// Keyed by [`OptNumber`] so that serialization (which must emit
/// options sorted by number to delta-encode them) is a plain in-order
/// walk. Repeatable options (Uri-Path, Uri-Query, Location-Path) hold
/// several values under one number.
pub type OptMap = BTreeMap<OptNumber, Vec<OptValue>>;

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl TryFrom<u8> for Byte1 {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Ok(Byte1 { ver: Version(ver),
               ty: Type::try_from(ty)?,
               tkl })
  }
}

/// # `Message` struct
/// Low-level representation of a CoAP message, close to the raw binary format.
///
/// Supports serializing to bytes and parsing from bytes via
/// [`crate::TryIntoBytes`] and [`TryFromBytes`].
///
/// ```
/// use loam_msg::{Code, Id, Message, Token, TryFromBytes, Type};
///
/// # //                       version  token len  code (2.05 Content)
/// # //                       |        |          /
/// # //                       |  type  |         /  message ID
/// # //                       |  |     |        |   |
/// # //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
/// # let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
/// # let token: [u8; 1] = [254u8];
/// # let payload: [&[u8]; 2] = [&[0b_11111111u8], b"hello, world!"];
/// let packet: Vec<u8> = /* bytes! */
/// # [header.as_ref(), token.as_ref(), payload.concat().as_ref()].concat();
///
/// let msg = Message::try_from_bytes(packet).unwrap();
///
/// assert_eq!(msg.id, Id(1));
/// assert_eq!(msg.ty, Type::Con);
/// assert_eq!(msg.code, Code { class: 2, detail: 5 });
/// assert_eq!(msg.payload.0, b"hello, world!".to_vec());
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`OptMap`] for details
  pub opts: OptMap,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// Create a message with no options and an empty payload.
  pub fn new(ty: Type, code: Code, id: Id, token: Token) -> Self {
    Self { id,
           ty,
           ver: Default::default(),
           token,
           code,
           opts: Default::default(),
           payload: Payload(Default::default()) }
  }

  /// Create a new message that ACKs this one.
  ///
  /// The ACK shares this message's [`Id`] and carries no token,
  /// options or payload (an empty ACK in RFC 7252 terms).
  pub fn ack(&self) -> Self {
    Self { id: self.id,
           token: Token(Default::default()),
           ver: Default::default(),
           ty: Type::Ack,
           code: Code::new(0, 0),
           payload: Payload(Default::default()),
           opts: Default::default() }
  }

  /// Replace all values of option `num` with `value`.
  pub fn set(&mut self, num: OptNumber, value: OptValue) {
    self.opts.insert(num, std_alloc::vec![value]);
  }

  /// Append a value to option `num`, keeping any existing values.
  pub fn add(&mut self, num: OptNumber, value: OptValue) {
    self.opts.entry(num).or_default().push(value);
  }

  /// All values of option `num`.
  pub fn get(&self, num: OptNumber) -> &[OptValue] {
    self.opts.get(&num).map(|vs| vs.as_slice()).unwrap_or(&[])
  }

  /// The first value of option `num`, if present.
  pub fn get_first(&self, num: OptNumber) -> Option<&OptValue> {
    self.get(num).first()
  }

  /// Set the Uri-Path options from a `/`-separated path.
  ///
  /// Empty segments are skipped, so `"/3/0/0"` and `"3/0/0"` produce
  /// the same three options.
  pub fn set_path(&mut self, path: &str) {
    let vals = path.split('/')
                   .filter(|seg| !seg.is_empty())
                   .map(|seg| OptValue(seg.as_bytes().to_vec()))
                   .collect::<Vec<_>>();
    self.opts.insert(opt::URI_PATH, vals);
  }

  /// The Uri-Path options joined with `/`.
  ///
  /// Yields `None` when any segment is not valid UTF-8.
  pub fn path(&self) -> Option<String> {
    self.joined_path(opt::URI_PATH)
  }

  /// Append a Uri-Query option.
  pub fn add_query(&mut self, query: &str) {
    self.add(opt::URI_QUERY, OptValue(query.as_bytes().to_vec()));
  }

  /// All Uri-Query options that are valid UTF-8.
  pub fn queries(&self) -> impl Iterator<Item = &str> {
    self.get(opt::URI_QUERY)
        .iter()
        .filter_map(|v| core::str::from_utf8(&v.0).ok())
  }

  /// Set the Observe option (see [`OptValue::observe_seq`] for the encoding).
  pub fn set_observe(&mut self, n: u32) {
    self.set(opt::OBSERVE, OptValue::observe_seq(n));
  }

  /// The Observe option, if present.
  pub fn observe(&self) -> Option<u32> {
    self.get_first(opt::OBSERVE).map(|v| v.as_observe_seq())
  }

  /// Set the Content-Format option.
  pub fn set_content_format(&mut self, format: ContentFormat) {
    self.set(opt::CONTENT_FORMAT, OptValue::uint(u16::from(&format) as u32));
  }

  /// The Content-Format option, if present.
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.get_first(opt::CONTENT_FORMAT)
        .map(|v| ContentFormat::from(v.as_uint() as u16))
  }

  /// Set the Accept option.
  pub fn set_accept(&mut self, format: ContentFormat) {
    self.set(opt::ACCEPT, OptValue::uint(u16::from(&format) as u32));
  }

  /// The Accept option, if present.
  pub fn accept(&self) -> Option<ContentFormat> {
    self.get_first(opt::ACCEPT)
        .map(|v| ContentFormat::from(v.as_uint() as u16))
  }

  /// Set the Location-Path options from a `/`-separated path.
  pub fn set_location_path(&mut self, path: &str) {
    let vals = path.split('/')
                   .filter(|seg| !seg.is_empty())
                   .map(|seg| OptValue(seg.as_bytes().to_vec()))
                   .collect::<Vec<_>>();
    self.opts.insert(opt::LOCATION_PATH, vals);
  }

  /// The Location-Path options joined with `/`.
  pub fn location_path(&self) -> Option<String> {
    self.joined_path(opt::LOCATION_PATH)
  }

  /// Set the Max-Age option, in seconds.
  pub fn set_max_age(&mut self, seconds: u32) {
    self.set(opt::MAX_AGE, OptValue::uint(seconds));
  }

  fn joined_path(&self, num: OptNumber) -> Option<String> {
    let vals = self.get(num);
    let mut out = String::new();

    for val in vals {
      match core::str::from_utf8(&val.0) {
        | Ok(seg) => {
          if !out.is_empty() {
            out.push('/');
          }
          out.push_str(seg);
        },
        | Err(_) => return None,
      }
    }

    Some(out)
  }
}

impl<Bytes: AsRef<[u8]>> TryFromBytes<Bytes> for Message {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);

    let Byte1 { tkl, ty, ver } = bytes.next()
                                      .ok_or_else(MessageParseError::eof)?
                                      .try_into()?;

    if tkl > 8 {
      return Err(Self::Error::InvalidTokenLength(tkl));
    }

    let code: Code = bytes.next().ok_or_else(MessageParseError::eof)?.into();
    let id: Id = Id::try_consume_bytes(&mut bytes)?;

    let token = bytes.take_exact(tkl as usize)
                     .ok_or_else(MessageParseError::eof)?;
    let token = tinyvec::ArrayVec::<[u8; 8]>::try_from(token).expect("tkl was checked to be <= 8");
    let token = Token(token);

    let opts = OptMap::try_consume_bytes(&mut bytes).map_err(Self::Error::OptParseError)?;
    let payload = Payload(bytes.take_until_end().to_vec());

    Ok(Message { id,
                 ty,
                 ver,
                 code,
                 token,
                 opts,
                 payload })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_msg() {
    let (expect, msg) = crate::test_msg();
    assert_eq!(Message::try_from_bytes(&msg).unwrap(), expect)
  }

  #[test]
  fn parse_byte1() {
    let byte = 0b_01_10_0011u8;
    let byte = Byte1::try_from(byte).unwrap();
    assert_eq!(byte,
               Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 })
  }

  #[test]
  fn parse_id() {
    let mut id_bytes = Cursor::new(34u16.to_be_bytes());
    let id = Id::try_consume_bytes(&mut id_bytes).unwrap();
    assert_eq!(id, Id(34));
  }

  #[test]
  fn parse_rejects_long_token() {
    let mut bytes = std_alloc::vec![0b_0100_1001u8, 0x45, 0, 1];
    bytes.extend([0u8; 9]);
    assert_eq!(Message::try_from_bytes(&bytes),
               Err(MessageParseError::InvalidTokenLength(9)));
  }

  #[test]
  fn path_round_trips() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token(Default::default()));
    msg.set_path("/3/0/13");
    assert_eq!(msg.path().unwrap(), "3/0/13");
    assert_eq!(msg.get(opt::URI_PATH).len(), 3);
  }

  #[test]
  fn queries_skip_invalid_utf8() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1), Token(Default::default()));
    msg.add_query("ep=device");
    msg.add(opt::URI_QUERY, OptValue(std_alloc::vec![0xff, 0xfe]));
    assert_eq!(msg.queries().collect::<Vec<_>>(), std_alloc::vec!["ep=device"]);
  }
}
