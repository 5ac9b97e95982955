use tinyvec::ArrayVec;

/// # Message Token
///
/// Up to 8 bytes used to correlate requests with responses
/// independently of [`super::Id`]s; a response (or notification)
/// echoes the token of the request that caused it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Take an arbitrary-length sequence of bytes and turn it into an opaque message token
  ///
  /// Currently uses the BLAKE2 hashing algorithm, but this may change in the future.
  ///
  /// ```
  /// use loam_msg::Token;
  ///
  /// let my_token = Token::opaque(&[0, 1, 2]);
  /// ```
  pub fn opaque(data: &[u8]) -> Token {
    use blake2::digest::consts::U8;
    use blake2::{Blake2b, Digest};

    let mut digest = Blake2b::<U8>::new();
    digest.update(data);
    Token(Into::<[u8; 8]>::into(digest.finalize()).into())
  }

  /// A token over the given bytes, or None when `data` is longer
  /// than the 8 bytes a token may carry.
  pub fn from_slice(data: &[u8]) -> Option<Token> {
    ArrayVec::try_from(data).ok().map(Token)
  }
}
