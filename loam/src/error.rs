use loam_msg::Code;

/// The error kinds surfaced to the [`crate::InterfaceObserver`].
///
/// CoAP response codes received during registration exchanges are
/// mapped onto these before delivery; the raw code never reaches the
/// application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Error {
  /// The entity being created already exists
  /// (e.g. an object instance id collision)
  AlreadyExists,
  /// The entity addressed does not exist
  NotFound,
  /// An argument failed validation before any wire activity
  /// (empty endpoint name, unparseable server URI, ...)
  InvalidParameters,
  /// The operation is not valid in the engine's current state
  /// (e.g. `update_registration` while not registered)
  InvalidState,
  /// A confirmable exchange exhausted its retransmissions, or the
  /// registration lifetime lapsed without a successful refresh
  Timeout,
  /// The transport failed to carry a datagram
  NetworkError,
  /// The server answered `4.05 Method Not Allowed` (or kin)
  NotAllowed,
  /// The server answered `4.06 Not Acceptable`
  NotAcceptable,
  /// Anything else
  Unknown,
}

impl Error {
  /// Map a CoAP response code onto the error surfaced to the observer.
  pub fn from_code(code: Code) -> Self {
    match code {
      | Code { class: 4, detail: 0 } => Error::InvalidParameters,
      | Code { class: 4, detail: 4 } => Error::NotFound,
      | Code { class: 4, detail: 5 } => Error::NotAllowed,
      | Code { class: 4, detail: 6 } => Error::NotAcceptable,
      | Code { class: 4, detail: 9 } => Error::AlreadyExists,
      | _ => Error::Unknown,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn code_mapping() {
    assert_eq!(Error::from_code(Code::NOT_FOUND), Error::NotFound);
    assert_eq!(Error::from_code(Code::METHOD_NOT_ALLOWED), Error::NotAllowed);
    assert_eq!(Error::from_code(Code::CONFLICT), Error::AlreadyExists);
    assert_eq!(Error::from_code(Code::new(5, 0)), Error::Unknown);
  }
}
