use std_alloc::string::String;
use std_alloc::vec::Vec;

/// The type a [`Resource`](super::Resource) declares for its values.
///
/// Writes are decoded against the declared type, so a resource keeps
/// its type for its whole life regardless of what a server tries to
/// put in it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
  /// UTF-8 text
  String,
  /// Signed 64-bit integer
  Int,
  /// 64-bit float
  Float,
  /// Boolean
  Bool,
  /// Raw bytes
  Opaque,
  /// Unix time, in seconds
  Time,
  /// A link to an object instance, as `(object id, instance id)`
  ObjLink,
}

/// A resource value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  /// UTF-8 text
  String(String),
  /// Signed 64-bit integer
  Int(i64),
  /// 64-bit float
  Float(f64),
  /// Boolean
  Bool(bool),
  /// Raw bytes
  Opaque(Vec<u8>),
  /// Unix time, in seconds
  Time(i64),
  /// A link to an object instance
  ObjLink(u16, u16),
}

/// Errors encounterable decoding a value from wire bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueParseError {
  /// The text form could not be parsed as the declared type
  InvalidText,
  /// The TLV value length is not one the declared type allows
  InvalidLength(usize),
  /// The bytes were not valid UTF-8 for a string value
  InvalidUtf8,
}

impl Value {
  /// The [`ValueType`] this value inhabits
  pub fn value_type(&self) -> ValueType {
    match self {
      | Value::String(_) => ValueType::String,
      | Value::Int(_) => ValueType::Int,
      | Value::Float(_) => ValueType::Float,
      | Value::Bool(_) => ValueType::Bool,
      | Value::Opaque(_) => ValueType::Opaque,
      | Value::Time(_) => ValueType::Time,
      | Value::ObjLink(_, _) => ValueType::ObjLink,
    }
  }

  /// The value as a float, for numeric threshold comparison
  /// (`lt`/`gt`/`st` observe attributes). None for non-numeric values.
  pub fn as_numeric(&self) -> Option<f64> {
    match self {
      | Value::Int(n) | Value::Time(n) => Some(*n as f64),
      | Value::Float(f) => Some(*f),
      | _ => None,
    }
  }

  /// Serialize to `text/plain` bytes, the format single resources
  /// are read in by default.
  pub fn to_text(&self) -> Vec<u8> {
    match self {
      | Value::String(s) => s.as_bytes().to_vec(),
      | Value::Int(n) => std_alloc::format!("{}", n).into_bytes(),
      | Value::Float(f) => std_alloc::format!("{}", f).into_bytes(),
      | Value::Bool(b) => if *b { b"1".to_vec() } else { b"0".to_vec() },
      | Value::Opaque(bytes) => bytes.clone(),
      | Value::Time(n) => std_alloc::format!("{}", n).into_bytes(),
      | Value::ObjLink(oid, iid) => std_alloc::format!("{}:{}", oid, iid).into_bytes(),
    }
  }

  /// Decode `text/plain` bytes against a declared type.
  pub fn from_text(ty: ValueType, bytes: &[u8]) -> Result<Value, ValueParseError> {
    if ty == ValueType::Opaque {
      return Ok(Value::Opaque(bytes.to_vec()));
    }

    let text = core::str::from_utf8(bytes).map_err(|_| ValueParseError::InvalidUtf8)?;

    match ty {
      | ValueType::String => Ok(Value::String(text.into())),
      | ValueType::Int => text.parse()
                              .map(Value::Int)
                              .map_err(|_| ValueParseError::InvalidText),
      | ValueType::Float => text.parse()
                                .map(Value::Float)
                                .map_err(|_| ValueParseError::InvalidText),
      | ValueType::Bool => match text {
        | "0" => Ok(Value::Bool(false)),
        | "1" => Ok(Value::Bool(true)),
        | _ => Err(ValueParseError::InvalidText),
      },
      | ValueType::Time => text.parse()
                               .map(Value::Time)
                               .map_err(|_| ValueParseError::InvalidText),
      | ValueType::ObjLink => match text.split_once(':') {
        | Some((oid, iid)) => {
          let oid = oid.parse().map_err(|_| ValueParseError::InvalidText)?;
          let iid = iid.parse().map_err(|_| ValueParseError::InvalidText)?;
          Ok(Value::ObjLink(oid, iid))
        },
        | None => Err(ValueParseError::InvalidText),
      },
      | ValueType::Opaque => unreachable!("handled above"),
    }
  }

  /// Serialize to the value bytes of a TLV entry.
  pub fn to_tlv_bytes(&self) -> Vec<u8> {
    match self {
      | Value::String(s) => s.as_bytes().to_vec(),
      | Value::Int(n) | Value::Time(n) => int_to_minimal_be(*n),
      | Value::Float(f) => {
        if (*f as f32) as f64 == *f {
          (*f as f32).to_be_bytes().to_vec()
        } else {
          f.to_be_bytes().to_vec()
        }
      },
      | Value::Bool(b) => std_alloc::vec![*b as u8],
      | Value::Opaque(bytes) => bytes.clone(),
      | Value::ObjLink(oid, iid) => {
        let mut out = Vec::with_capacity(4);
        out.extend(oid.to_be_bytes());
        out.extend(iid.to_be_bytes());
        out
      },
    }
  }

  /// Decode the value bytes of a TLV entry against a declared type.
  pub fn from_tlv_bytes(ty: ValueType, bytes: &[u8]) -> Result<Value, ValueParseError> {
    match ty {
      | ValueType::String => core::str::from_utf8(bytes).map(|s| Value::String(s.into()))
                                                        .map_err(|_| ValueParseError::InvalidUtf8),
      | ValueType::Opaque => Ok(Value::Opaque(bytes.to_vec())),
      | ValueType::Int => int_from_be(bytes).map(Value::Int),
      | ValueType::Time => int_from_be(bytes).map(Value::Time),
      | ValueType::Bool => match bytes {
        | [0] => Ok(Value::Bool(false)),
        | [1] => Ok(Value::Bool(true)),
        | _ => Err(ValueParseError::InvalidLength(bytes.len())),
      },
      | ValueType::Float => match bytes.len() {
        | 4 => Ok(Value::Float(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64)),
        | 8 => {
          let mut buf = [0u8; 8];
          buf.copy_from_slice(bytes);
          Ok(Value::Float(f64::from_be_bytes(buf)))
        },
        | n => Err(ValueParseError::InvalidLength(n)),
      },
      | ValueType::ObjLink => match bytes {
        | &[a, b, c, d] => Ok(Value::ObjLink(u16::from_be_bytes([a, b]), u16::from_be_bytes([c, d]))),
        | _ => Err(ValueParseError::InvalidLength(bytes.len())),
      },
    }
  }
}

/// Minimal-width (1, 2, 4 or 8 byte) big-endian two's complement.
fn int_to_minimal_be(n: i64) -> Vec<u8> {
  if let Ok(n) = i8::try_from(n) {
    n.to_be_bytes().to_vec()
  } else if let Ok(n) = i16::try_from(n) {
    n.to_be_bytes().to_vec()
  } else if let Ok(n) = i32::try_from(n) {
    n.to_be_bytes().to_vec()
  } else {
    n.to_be_bytes().to_vec()
  }
}

fn int_from_be(bytes: &[u8]) -> Result<i64, ValueParseError> {
  match bytes.len() {
    | 1 => Ok(i8::from_be_bytes([bytes[0]]) as i64),
    | 2 => Ok(i16::from_be_bytes([bytes[0], bytes[1]]) as i64),
    | 4 => {
      let mut buf = [0u8; 4];
      buf.copy_from_slice(bytes);
      Ok(i32::from_be_bytes(buf) as i64)
    },
    | 8 => {
      let mut buf = [0u8; 8];
      buf.copy_from_slice(bytes);
      Ok(i64::from_be_bytes(buf))
    },
    | n => Err(ValueParseError::InvalidLength(n)),
  }
}
