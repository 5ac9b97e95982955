use embedded_time::rate::Fraction;

/// A [`crate::time::Clock`] backed by [`std::time::Instant`],
/// ticking in microseconds since its creation.
#[derive(Debug, Clone, Copy)]
pub struct Clock(std::time::Instant);

impl Clock {
  /// Create a new clock; its epoch is "now"
  pub fn new() -> Self {
    Self(std::time::Instant::now())
  }
}

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

impl embedded_time::Clock for Clock {
  type T = u64;

  // microseconds
  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

  fn try_now(&self) -> Result<embedded_time::Instant<Self>, embedded_time::clock::Error> {
    let now = std::time::Instant::now();
    let elapsed = now.duration_since(self.0);
    Ok(embedded_time::Instant::new(elapsed.as_micros() as u64))
  }
}

/// A [`crate::net::Transport`] over [`std::net::UdpSocket`].
///
/// Receiving stays with the host: read the socket however fits the
/// application's IO loop and push datagrams in through
/// [`crate::Interface::deliver`].
#[derive(Debug)]
pub struct UdpTransport(std::net::UdpSocket);

impl UdpTransport {
  /// Bind a non-blocking UDP socket to a local address.
  pub fn bind<A: std::net::ToSocketAddrs>(addr: A) -> std::io::Result<Self> {
    let sock = std::net::UdpSocket::bind(addr)?;
    sock.set_nonblocking(true)?;
    Ok(Self(sock))
  }

  /// The wrapped socket, for the host's receive path.
  pub fn socket(&self) -> &std::net::UdpSocket {
    &self.0
  }
}

fn no_std_to_std(addr: no_std_net::SocketAddr) -> std::net::SocketAddr {
  use no_std_net::SocketAddr::*;

  match addr {
    | V4(a) => {
      let [o1, o2, o3, o4] = a.ip().octets();
      std::net::SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::new(o1, o2, o3, o4),
                                                           a.port()))
    },
    | V6(a) => {
      std::net::SocketAddr::V6(std::net::SocketAddrV6::new(std::net::Ipv6Addr::from(a.ip()
                                                                                     .octets()),
                                                           a.port(),
                                                           0,
                                                           0))
    },
  }
}

impl crate::net::Transport for UdpTransport {
  type Error = std::io::ErrorKind;

  fn send(&mut self, dgram: crate::net::Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    match self.0.send_to(dgram.data(), no_std_to_std(dgram.addr())) {
      | Ok(_) => Ok(()),
      | Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
      | Err(e) => Err(nb::Error::Other(e.kind())),
    }
  }
}
