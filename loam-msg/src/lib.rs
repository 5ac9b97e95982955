//! Low-level representation of CoAP messages and OMA LWM2M payloads.
//!
//! The most notable item in `loam_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout.
//!
//! On top of the plain CoAP codec this crate carries the two payload
//! formats an LWM2M client speaks on that transport:
//! - [`tlv`] - the OMA-TLV binary encoding used for objects, object
//!   instances and multiple resources
//! - [`link_format`] - the RFC 6690 link-format document published at
//!   registration time
//!
//! ## Allocation
//! Messages allocate through the global allocator (`Vec` for payloads,
//! option values and TLV trees, a `BTreeMap` for the option set). Tokens
//! are small and bounded (8 bytes) and live on the stack.
//!
//! This crate performs no IO and owns no clock; it is pure data.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![deny(missing_docs)]

extern crate alloc as std_alloc;

#[doc(hidden)]
pub mod cursor;

#[doc(hidden)]
pub mod from_bytes;

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod to_bytes;

/// OMA-TLV payloads
pub mod tlv;

/// RFC 6690 link-format documents
pub mod link_format;

#[doc(inline)]
pub use cursor::Cursor;
#[doc(inline)]
pub use from_bytes::TryFromBytes;
#[doc(inline)]
pub use msg::*;
#[doc(inline)]
pub use to_bytes::TryIntoBytes;

#[cfg(test)]
pub(crate) fn test_msg() -> (Message, std_alloc::vec::Vec<u8>) {
  use std_alloc::collections::BTreeMap;

  let header: [u8; 4] = 0b0100_0001_0100_0101_0000_0000_0000_0001_u32.to_be_bytes();
  let token: [u8; 1] = [254u8];
  let content_format: &[u8] = b"application/link-format";
  let options: [&[u8]; 2] = [&[0b_1100_1101u8, 0b0000_1010u8], content_format];
  let payload: [&[u8]; 2] = [&[0b1111_1111_u8], b"hello, world!"];
  let bytes = [header.as_ref(),
               token.as_ref(),
               options.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let msg = Message { id: Id(1),
                      ty: Type::Con,
                      ver: Version(1),
                      token: Token(tinyvec::array_vec!([u8; 8] => 254)),
                      opts: BTreeMap::from([(OptNumber(12),
                                             std_alloc::vec![OptValue(content_format.to_vec())])]),
                      code: Code { class: 2,
                                   detail: 5 },
                      payload: Payload(b"hello, world!".to_vec()) };
  (msg, bytes)
}

#[cfg(test)]
pub(crate) mod tests {
  /// Asserts two values are equal, printing both sides in binary on failure.
  #[macro_export]
  macro_rules! assert_eqb {
    ($actual:expr, $expected:expr) => {
      if $actual != $expected {
        panic!("expected {:08b} to equal {:08b}", $actual, $expected)
      }
    };
  }

  /// Asserts two iterables are equal element-wise, printing both sides in binary on failure.
  #[macro_export]
  macro_rules! assert_eqb_iter {
    ($actual:expr, $expected:expr) => {
      if $actual.iter().ne($expected.iter()) {
        panic!("expected {:?} to equal {:?}",
               $actual.into_iter()
                      .map(|b| format!("{:08b}", b))
                      .collect::<Vec<_>>(),
               $expected.into_iter()
                        .map(|b| format!("{:08b}", b))
                        .collect::<Vec<_>>())
      }
    };
  }
}
