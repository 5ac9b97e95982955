//! OMA-TLV, the binary payload format LWM2M uses for objects,
//! object instances and multiple resources.
//!
//! Every entry starts with a type byte:
//!
//! ```text
//! entry kind (object instance, resource instance,
//! |  multiple resource, resource with value)
//! |
//! |  id width (0: 8-bit, 1: 16-bit)
//! |  |
//! |  |  length-of-length (0: length is the low 3 bits,
//! |  |  |  1/2/3: that many length bytes follow)
//! |  |  |
//! |  |  |   length, when length-of-length is 0
//! |  |  |   |
//! vv v  vv vvv
//! 00 0  00 000
//! ```
//!
//! followed by the entry id (big-endian), the extended length bytes
//! (big-endian) when present, and the value. Object instances and
//! multiple resources nest further TLV entries as their value.

use std_alloc::vec::Vec;

use crate::cursor::Cursor;

/// A single TLV entry.
///
/// Nesting is part of the format: an [`Tlv::ObjectInstance`] holds the
/// resources of one instance, a [`Tlv::MultipleResource`] holds the
/// instances of one multi-instance resource. The two leaf kinds hold
/// raw value bytes whose interpretation (int, string, ...) is up to
/// the data model on top.
#[derive(Clone, Debug, PartialEq)]
pub enum Tlv {
  /// An object instance and its resources (kind bits `0b00`)
  ObjectInstance {
    /// Instance id
    id: u16,
    /// The instance's resources ([`Tlv::ResourceValue`] or
    /// [`Tlv::MultipleResource`] entries)
    resources: Vec<Tlv>,
  },
  /// One instance of a multi-instance resource (kind bits `0b01`)
  ResourceInstance {
    /// Resource instance id
    id: u16,
    /// Value bytes
    value: Vec<u8>,
  },
  /// A multi-instance resource and its instances (kind bits `0b10`)
  MultipleResource {
    /// Resource id
    id: u16,
    /// The resource's instances ([`Tlv::ResourceInstance`] entries)
    instances: Vec<Tlv>,
  },
  /// A single-instance resource with its value (kind bits `0b11`)
  ResourceValue {
    /// Resource id
    id: u16,
    /// Value bytes
    value: Vec<u8>,
  },
}

/// Errors encounterable while parsing TLV from bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlvParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// An entry kind may not appear where it did, e.g. an object
  /// instance nested in a multiple resource. The two kind bit pairs
  /// are `(parent, child)`.
  InvalidNesting(u8, u8),
}

impl TlvParseError {
  /// Shorthand for [`TlvParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

/// Errors encounterable serializing TLV to bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlvEncodeError {
  /// An entry's value was longer than the 24-bit length field
  /// can express
  ValueTooLong {
    /// The length that could not be encoded
    len: usize,
  },
}

const KIND_OBJECT_INSTANCE: u8 = 0b00;
const KIND_RESOURCE_INSTANCE: u8 = 0b01;
const KIND_MULTIPLE_RESOURCE: u8 = 0b10;
const KIND_RESOURCE_VALUE: u8 = 0b11;

impl Tlv {
  /// The id of this entry
  pub fn id(&self) -> u16 {
    match self {
      | Tlv::ObjectInstance { id, .. }
      | Tlv::ResourceInstance { id, .. }
      | Tlv::MultipleResource { id, .. }
      | Tlv::ResourceValue { id, .. } => *id,
    }
  }

  fn kind_bits(&self) -> u8 {
    match self {
      | Tlv::ObjectInstance { .. } => KIND_OBJECT_INSTANCE,
      | Tlv::ResourceInstance { .. } => KIND_RESOURCE_INSTANCE,
      | Tlv::MultipleResource { .. } => KIND_MULTIPLE_RESOURCE,
      | Tlv::ResourceValue { .. } => KIND_RESOURCE_VALUE,
    }
  }

  /// Serialize a sequence of entries, e.g. the object instances of a
  /// whole object or the resources of one instance.
  pub fn encode(entries: &[Tlv]) -> Result<Vec<u8>, TlvEncodeError> {
    let mut bytes = Vec::new();
    for entry in entries {
      entry.extend_bytes(&mut bytes)?;
    }
    Ok(bytes)
  }

  /// Given a byte buffer and an entry, add that entry's bytes to the buffer.
  pub fn extend_bytes(&self, bytes: &mut Vec<u8>) -> Result<(), TlvEncodeError> {
    let value: Vec<u8> = match self {
      | Tlv::ObjectInstance { resources: children, .. }
      | Tlv::MultipleResource { instances: children, .. } => Self::encode(children)?,
      | Tlv::ResourceInstance { value, .. } | Tlv::ResourceValue { value, .. } => value.clone(),
    };

    if value.len() > 0xff_ffff {
      return Err(TlvEncodeError::ValueTooLong { len: value.len() });
    }

    let id = self.id();
    let id_wide = id > 0xff;
    let len = value.len() as u32;
    let length_of_length: u8 = match len {
      | n if n < 8 => 0,
      | n if n <= 0xff => 1,
      | n if n <= 0xffff => 2,
      | _ => 3,
    };

    let mut head = self.kind_bits() << 6;
    head |= (id_wide as u8) << 5;
    head |= length_of_length << 3;
    if length_of_length == 0 {
      head |= len as u8;
    }

    bytes.push(head);

    if id_wide {
      bytes.extend(id.to_be_bytes());
    } else {
      bytes.push(id as u8);
    }

    match length_of_length {
      | 1 => bytes.push(len as u8),
      | 2 => bytes.extend((len as u16).to_be_bytes()),
      | 3 => bytes.extend(&len.to_be_bytes()[1..]),
      | _ => (),
    }

    bytes.extend(value);
    Ok(())
  }

  /// Parse a sequence of entries from bytes.
  ///
  /// Total for valid input: any byte sequence either parses fully or
  /// yields a [`TlvParseError`]. Never panics.
  pub fn decode(bytes: &[u8]) -> Result<Vec<Tlv>, TlvParseError> {
    let mut cursor = Cursor::new(bytes);
    let mut entries = Vec::new();

    while !cursor.is_exhausted() {
      entries.push(Self::consume_entry(&mut cursor)?);
    }

    Ok(entries)
  }

  fn consume_entry<A: AsRef<[u8]>>(cursor: &mut Cursor<A>) -> Result<Tlv, TlvParseError> {
    let head = cursor.next().ok_or_else(TlvParseError::eof)?;
    let kind = head >> 6;
    let id_wide = head & 0b10_0000 != 0;
    let length_of_length = (head >> 3) & 0b11;

    let id = if id_wide {
      match cursor.take_exact(2) {
        | Some(&[a, b]) => u16::from_be_bytes([a, b]),
        | _ => return Err(TlvParseError::eof()),
      }
    } else {
      cursor.next().ok_or_else(TlvParseError::eof)? as u16
    };

    let len = match length_of_length {
      | 0 => (head & 0b111) as u32,
      | n => cursor.take_exact(n as usize)
                   .ok_or_else(TlvParseError::eof)?
                   .iter()
                   .fold(0u32, |acc, b| (acc << 8) | (*b as u32)),
    };

    let value = cursor.take_exact(len as usize)
                      .ok_or_else(TlvParseError::eof)?
                      .to_vec();

    match kind {
      | KIND_RESOURCE_VALUE => Ok(Tlv::ResourceValue { id, value }),
      | KIND_RESOURCE_INSTANCE => Ok(Tlv::ResourceInstance { id, value }),
      | KIND_MULTIPLE_RESOURCE => {
        let instances = Self::decode(&value)?;
        for inst in &instances {
          if inst.kind_bits() != KIND_RESOURCE_INSTANCE {
            return Err(TlvParseError::InvalidNesting(kind, inst.kind_bits()));
          }
        }
        Ok(Tlv::MultipleResource { id, instances })
      },
      | _ => {
        let resources = Self::decode(&value)?;
        for res in &resources {
          if res.kind_bits() == KIND_OBJECT_INSTANCE || res.kind_bits() == KIND_RESOURCE_INSTANCE {
            return Err(TlvParseError::InvalidNesting(kind, res.kind_bits()));
          }
        }
        Ok(Tlv::ObjectInstance { id, resources })
      },
    }
  }
}
