use std_alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::from_bytes::TryConsumeBytes;

/// Option parsing errors
pub mod parse_error;
pub use parse_error::*;

use super::OptMap;

/// # Option Number
///
/// Identifies which option an [`OptValue`] belongs to
/// (e.g. Uri-Path has number 11).
///
/// On the wire options do not carry their number directly; each
/// carries the delta between its number and the previous option's,
/// which is why serialization walks options sorted by number.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

/// Uri-Host (RFC 7252 5.10.1)
pub const URI_HOST: OptNumber = OptNumber(3);
/// Observe (RFC 7641)
pub const OBSERVE: OptNumber = OptNumber(6);
/// Uri-Port (RFC 7252 5.10.1)
pub const URI_PORT: OptNumber = OptNumber(7);
/// Location-Path (RFC 7252 5.10.7)
pub const LOCATION_PATH: OptNumber = OptNumber(8);
/// Uri-Path (RFC 7252 5.10.1)
pub const URI_PATH: OptNumber = OptNumber(11);
/// Content-Format (RFC 7252 5.10.3)
pub const CONTENT_FORMAT: OptNumber = OptNumber(12);
/// Max-Age (RFC 7252 5.10.5)
pub const MAX_AGE: OptNumber = OptNumber(14);
/// Uri-Query (RFC 7252 5.10.1)
pub const URI_QUERY: OptNumber = OptNumber(15);
/// Accept (RFC 7252 5.10.4)
pub const ACCEPT: OptNumber = OptNumber(17);

/// # Option Value
///
/// The raw bytes of an option in a message.
#[derive(Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct OptValue(pub Vec<u8>);

impl OptValue {
  /// Encode an unsigned integer option value
  /// (big-endian, minimal width, zero is empty - RFC 7252 3.2).
  pub fn uint(n: u32) -> Self {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    Self(bytes[skip..].to_vec())
  }

  /// Decode an unsigned integer option value
  /// (big-endian, an empty value is zero).
  pub fn as_uint(&self) -> u32 {
    self.0
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | (*b as u32))
  }

  /// Encode an Observe sequence number
  /// (little-endian, minimal width, at most 3 bytes; zero is empty).
  pub fn observe_seq(n: u32) -> Self {
    let n = n & 0x00ff_ffff;
    let bytes = n.to_le_bytes();
    let len = match n {
      | 0 => 0,
      | n if n <= 0xff => 1,
      | n if n <= 0xffff => 2,
      | _ => 3,
    };
    Self(bytes[..len].to_vec())
  }

  /// Decode an Observe sequence number
  /// (little-endian, an empty value is zero).
  pub fn as_observe_seq(&self) -> u32 {
    self.0
        .iter()
        .take(3)
        .rev()
        .fold(0u32, |acc, b| (acc << 8) | (*b as u32))
  }

  /// The value as UTF-8 text, if it is valid UTF-8.
  pub fn as_str(&self) -> Option<&str> {
    core::str::from_utf8(&self.0).ok()
  }
}

/// Content-Format / Accept option values
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
  /// `text/plain; charset=utf-8`
  Text,
  /// `application/link-format`
  LinkFormat,
  /// `application/octet-stream`
  OctetStream,
  /// `application/vnd.oma.lwm2m+tlv`
  Tlv,
  /// Another content format
  Other(u16),
}

impl ContentFormat {
  /// Convert this content format to the CoAP byte value
  pub fn bytes(&self) -> [u8; 2] {
    u16::from(self).to_be_bytes()
  }
}

impl<'a> From<&'a ContentFormat> for u16 {
  fn from(f: &'a ContentFormat) -> Self {
    use ContentFormat::*;
    match *f {
      | Text => 0,
      | LinkFormat => 40,
      | OctetStream => 42,
      | Tlv => 11542,
      | Other(n) => n,
    }
  }
}

impl From<u16> for ContentFormat {
  fn from(n: u16) -> Self {
    use ContentFormat::*;
    match n {
      | 0 => Text,
      | 40 => LinkFormat,
      | 42 => OctetStream,
      | 11542 => Tlv,
      | n => Other(n),
    }
  }
}

pub(crate) fn parse_opt_len_or_delta<A: AsRef<[u8]>>(head: u8,
                                                     bytes: &mut Cursor<A>,
                                                     reserved_err: OptParseError)
                                                     -> Result<u16, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok((n as u16) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u16::from_be_bytes([a, b]) + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(head as u16),
  }
}

impl<Bytes: AsRef<[u8]>> TryConsumeBytes<Bytes> for OptMap {
  type Error = OptParseError;

  fn try_consume_bytes(bytes: &mut Cursor<Bytes>) -> Result<Self, Self::Error> {
    let mut opts = OptMap::default();
    let mut number = 0u32;

    loop {
      let head = match bytes.next() {
        | None | Some(0b1111_1111) => return Ok(opts),
        | Some(b) => b,
      };

      let delta_head = head >> 4;
      let len_head = head & 0b1111;

      let delta = parse_opt_len_or_delta(delta_head,
                                         bytes,
                                         OptParseError::OptionDeltaReservedValue(delta_head))?;
      let len = parse_opt_len_or_delta(len_head,
                                       bytes,
                                       OptParseError::ValueLengthReservedValue(len_head))?;

      let value = bytes.take_exact(len as usize)
                       .ok_or_else(OptParseError::eof)?
                       .to_vec();

      number += delta as u32;
      opts.entry(OptNumber(number))
          .or_insert_with(Vec::new)
          .push(OptValue(value));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_ext_delta() {
    let mut bytes = Cursor::new([11u8]);
    assert_eq!(parse_opt_len_or_delta(13,
                                      &mut bytes,
                                      OptParseError::OptionDeltaReservedValue(13)),
               Ok(24));

    let mut bytes = Cursor::new((300u16 - 269).to_be_bytes());
    assert_eq!(parse_opt_len_or_delta(14,
                                      &mut bytes,
                                      OptParseError::OptionDeltaReservedValue(14)),
               Ok(300));

    let mut bytes = Cursor::new([0u8; 0]);
    assert_eq!(parse_opt_len_or_delta(15,
                                      &mut bytes,
                                      OptParseError::OptionDeltaReservedValue(15)),
               Err(OptParseError::OptionDeltaReservedValue(15)));
  }

  #[test]
  fn parse_opts_accumulates_numbers() {
    // Uri-Path "3" (delta 11), then Content-Format (delta 1)
    let bytes = [0b1011_0001u8, b'3', 0b0001_0001, 42];
    let mut cursor = Cursor::new(bytes);
    let opts = OptMap::try_consume_bytes(&mut cursor).unwrap();

    assert_eq!(opts.get(&URI_PATH).unwrap(),
               &std_alloc::vec![OptValue(b"3".to_vec())]);
    assert_eq!(opts.get(&CONTENT_FORMAT).unwrap(),
               &std_alloc::vec![OptValue(std_alloc::vec![42])]);
  }

  #[test]
  fn parse_opts_stops_at_payload_marker() {
    let bytes = [0b1011_0001u8, b'3', 0xff, 1, 2, 3];
    let mut cursor = Cursor::new(bytes);
    let opts = OptMap::try_consume_bytes(&mut cursor).unwrap();

    assert_eq!(opts.len(), 1);
    assert_eq!(cursor.remaining(), 3);
  }

  #[test]
  fn parse_opts_rejects_truncated_value() {
    let bytes = [0b1011_0100u8, b'3'];
    let mut cursor = Cursor::new(bytes);
    assert_eq!(OptMap::try_consume_bytes(&mut cursor),
               Err(OptParseError::eof()));
  }

  #[test]
  fn uint_round_trip() {
    assert_eq!(OptValue::uint(0).0, Vec::<u8>::new());
    assert_eq!(OptValue::uint(42).0, std_alloc::vec![42]);
    assert_eq!(OptValue::uint(11542).0, 11542u16.to_be_bytes().to_vec());
    assert_eq!(OptValue::uint(11542).as_uint(), 11542);
  }

  #[test]
  fn observe_seq_minimal_width() {
    assert_eq!(OptValue::observe_seq(0).0.len(), 0);
    assert_eq!(OptValue::observe_seq(1).0, std_alloc::vec![1]);
    assert_eq!(OptValue::observe_seq(0x1234).0, std_alloc::vec![0x34, 0x12]);
    assert_eq!(OptValue::observe_seq(0x0101_0101).0,
               std_alloc::vec![0x01, 0x01, 0x01]);
    assert_eq!(OptValue::observe_seq(0xffffff).as_observe_seq(), 0xffffff);
  }
}
