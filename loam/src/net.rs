use no_std_net::SocketAddr;

/// Data that came from (or is destined for) a network socket
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addressed
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the socket and get the data in this Addressed
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data contained in this Addressed
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Borrow the contents of the addressed item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Copy the socket address for the data
  pub fn addr(&self) -> SocketAddr {
    self.1
  }
}

/// The datagram transport the host supplies.
///
/// The engine only ever pushes bytes out through this seam;
/// inbound datagrams are pushed _into_ the engine by the host's IO
/// path via [`crate::Interface::deliver`]. Both directions are
/// non-blocking: `send` is fire-and-forget, and `deliver` enqueues
/// and returns.
///
/// DTLS, connection management and socket lifetimes are entirely the
/// host's business; to the engine an implementor is a function from
/// `(address, bytes)` to "sent or not".
pub trait Transport {
  /// The error yielded when a send fails outright
  type Error: core::fmt::Debug;

  /// Send a datagram to a remote address.
  ///
  /// May yield [`nb::Error::WouldBlock`], in which case the engine
  /// treats the datagram as dropped and leaves recovery to the
  /// retransmission layer.
  fn send(&mut self, dgram: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
  use no_std_net::{Ipv4Addr, SocketAddrV4};

  use super::*;

  #[test]
  fn addrd_map_keeps_addr() {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5683));
    let addrd = Addrd(1u8, addr).map(|n| n + 1);
    assert_eq!(addrd, Addrd(2u8, addr));
  }
}
