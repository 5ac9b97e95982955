use std_alloc::vec::Vec;
use tinyvec::ArrayVec;

use crate::msg::{Byte1, Message, OptValue, Type};

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use loam_msg::{Code, Id, Message, Token, TryIntoBytes, Type};
  ///
  /// let msg = Message::new(Type::Con, Code::GET, Id(1), Token(Default::default()));
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// ```
  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// The gap between two consecutive option numbers was too
  /// large for the 16-bit extended delta encoding
  OptionDeltaOverflow {
    /// The delta that could not be encoded
    delta: u32,
  },
  /// An option value was longer than the 16-bit extended
  /// length encoding can express
  ValueLengthOverflow {
    /// The length that could not be encoded
    len: usize,
  },
}

impl TryIntoBytes for Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(self) -> Result<Vec<u8>, Self::Error> {
    let mut bytes = Vec::with_capacity(4 + self.token.0.len() + self.payload.0.len() + 16);

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: self.ver,
                            ty: self.ty }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();
    let token: ArrayVec<[u8; 8]> = self.token.0;

    bytes.push(byte1);
    bytes.push(code);

    bytes.extend(id);
    bytes.extend(token);

    let mut prev = 0u32;
    for (number, values) in self.opts {
      for value in values {
        extend_opt(&mut bytes, number.0 - prev, value)?;
        prev = number.0;
      }
    }

    if !self.payload.0.is_empty() {
      bytes.push(0b1111_1111);
      bytes.extend(self.payload.0);
    }

    Ok(bytes)
  }
}

fn extend_opt(bytes: &mut Vec<u8>,
              delta: u32,
              value: OptValue)
              -> Result<(), MessageToBytesError> {
  let delta =
    u16::try_from(delta).map_err(|_| MessageToBytesError::OptionDeltaOverflow { delta })?;
  let value_len = value.0.len();
  let len = u16::try_from(value_len).map_err(|_| {
                                      MessageToBytesError::ValueLengthOverflow { len: value_len }
                                    })?;

  let (del, del_bytes) = opt_len_or_delta(delta);
  let (len, len_bytes) = opt_len_or_delta(len);
  let header = (del << 4) | len;

  bytes.push(header);

  if let Some(bs) = del_bytes {
    bytes.extend(bs);
  }

  if let Some(bs) = len_bytes {
    bytes.extend(bs);
  }

  bytes.extend(value.0);
  Ok(())
}

pub(crate) fn opt_len_or_delta(val: u16) -> (u8, Option<ArrayVec<[u8; 2]>>) {
  match val {
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend((n - 269).to_be_bytes());
      (14, Some(bytes))
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n as u8) - 13);
      (13, Some(bytes))
    },
    | n => (n as u8, None),
  }
}

impl From<crate::msg::Id> for [u8; 2] {
  fn from(id: crate::msg::Id) -> [u8; 2] {
    id.0.to_be_bytes()
  }
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    use Type::*;
    match t {
      | Con => 0,
      | Non => 1,
      | Ack => 2,
      | Reset => 3,
    }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}

#[cfg(test)]
mod tests {
  use std_alloc::vec::Vec;

  use super::*;
  use crate::msg::{Code, Id, Payload, Token, Version};
  use crate::{assert_eqb, assert_eqb_iter, test_msg, TryFromBytes};

  #[test]
  fn msg() {
    let (msg, expected) = test_msg();
    let actual: Vec<u8> = msg.try_into_bytes().unwrap();
    assert_eqb_iter!(actual, expected);
  }

  #[test]
  fn byte_1() {
    let byte = Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 };
    let actual: u8 = byte.into();
    let expected = 0b_01_10_0011u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn code() {
    let code = Code { class: 2,
                      detail: 5 };
    let actual: u8 = code.into();
    let expected = 0b0100_0101_u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn id() {
    let id = Id(16);
    let actual = u16::from_be_bytes(id.into());
    assert_eqb!(actual, 16)
  }

  #[test]
  fn opt() {
    use core::iter::repeat;
    let cases: [(u32, Vec<u8>, Vec<u8>); 4] =
      [(24,
        repeat(1).take(100).collect(),
        [[0b1101_1101u8, 24 - 13, 100 - 13].as_ref(),
         repeat(1).take(100).collect::<Vec<u8>>().as_ref()].concat()),
       (1, std_alloc::vec![1], std_alloc::vec![0b0001_0001, 1]),
       (24, std_alloc::vec![1], std_alloc::vec![0b1101_0001, 11, 1]),
       (24,
        repeat(1).take(300).collect(),
        [[0b1101_1110, 24 - 13].as_ref(),
         (300u16 - 269).to_be_bytes().as_ref(),
         repeat(1).take(300).collect::<Vec<u8>>().as_ref()].concat())];

    cases.into_iter().for_each(|(delta, values, expected)| {
                       let mut actual = Vec::<u8>::new();
                       extend_opt(&mut actual, delta, OptValue(values)).unwrap();
                       assert_eqb_iter!(actual, expected)
                     });
  }

  #[test]
  fn no_payload_marker() {
    let msg = Message::new(Type::Con, Code::CONTENT, Id(0), Token(Default::default()));

    assert_ne!(msg.try_into_bytes().unwrap().last(), Some(&0b11111111));
  }

  #[test]
  fn round_trip_with_repeated_options() {
    let mut msg = Message::new(Type::Con, Code::GET, Id(77), Token(Default::default()));
    msg.set_path("3/0/13");
    msg.add_query("ep=device");
    msg.add_query("lt=3600");
    msg.payload = Payload(b"x".to_vec());

    let bytes = msg.clone().try_into_bytes().unwrap();
    let parsed = Message::try_from_bytes(bytes).unwrap();
    assert_eq!(parsed, msg);
    assert_eq!(parsed.queries().count(), 2);
  }
}
