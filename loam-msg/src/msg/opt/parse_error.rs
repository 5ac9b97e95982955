/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum OptParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// There are no more options in the stream
  /// (the payload marker or the end of the message was reached).
  ///
  /// Used internally to terminate the option loop; never yielded
  /// from parsing a whole message.
  OptionsExhausted,

  /// The 4-bit option delta was the reserved value 15
  OptionDeltaReservedValue(u8),

  /// The 4-bit value length was the reserved value 15
  ValueLengthReservedValue(u8),
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}
