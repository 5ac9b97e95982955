#![allow(dead_code)]

use ::std::sync::atomic::{AtomicU64, Ordering};
use ::std::sync::{Arc, Mutex};

use embedded_time::rate::Fraction;
use embedded_time::Instant;
use loam_msg::{Message, TryFromBytes, TryIntoBytes};
use no_std_net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::net::{Addrd, Transport};

pub fn server_addr() -> SocketAddr {
  SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5683))
}

pub fn bootstrap_addr() -> SocketAddr {
  SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5693))
}

/// A clock whose "now" the test sets by hand, in milliseconds.
///
/// Clones share the same timeline, so a copy can stay behind in the
/// test while the original moves into the engine.
#[derive(Debug, Clone, Default)]
pub struct ClockMock(Arc<AtomicU64>);

impl ClockMock {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, millis: u64) {
    self.0.store(millis, Ordering::SeqCst);
  }

  pub fn advance(&self, millis: u64) {
    self.0.fetch_add(millis, Ordering::SeqCst);
  }
}

impl embedded_time::Clock for ClockMock {
  type T = u64;

  const SCALING_FACTOR: Fraction = Fraction::new(1, 1000);

  fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    Ok(Instant::new(self.0.load(Ordering::SeqCst)))
  }
}

/// A transport that keeps everything sent to it.
///
/// Clones share the same outbox, so a copy can stay behind in the
/// test while the original moves into the engine.
#[derive(Debug, Clone, Default)]
pub struct SockMock {
  /// Outbound bytes to remote sockets. Address represents the destination
  pub tx: Arc<Mutex<Vec<Addrd<Vec<u8>>>>>,
}

impl SockMock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Decode and drain everything sent so far.
  pub fn sent(&self) -> Vec<Addrd<Message>> {
    self.tx
        .lock()
        .unwrap()
        .drain(..)
        .map(|dgram| {
          let addr = dgram.addr();
          Addrd(Message::try_from_bytes(dgram.unwrap()).unwrap(), addr)
        })
        .collect()
  }

  /// Decode the sent messages without draining them.
  pub fn sent_count(&self) -> usize {
    self.tx.lock().unwrap().len()
  }
}

impl Transport for SockMock {
  type Error = ();

  fn send(&mut self, dgram: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.tx
        .lock()
        .unwrap()
        .push(Addrd(dgram.data().to_vec(), dgram.addr()));
    Ok(())
  }
}

/// Serialize a message into the shape [`crate::Interface::deliver`]
/// wants.
pub fn dgram(msg: Message, from: SocketAddr) -> Addrd<Vec<u8>> {
  Addrd(msg.try_into_bytes().unwrap(), from)
}
