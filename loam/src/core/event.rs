use std_alloc::vec::Vec;

use crate::error::Error;
use crate::net::Addrd;
use crate::security::Security;
use crate::timer::TimerKind;
use crate::tree::{Object, Path};

/// A state transition queued for the engine's event loop.
///
/// Everything that happens to the engine - application calls,
/// inbound datagrams, timer expiries, local value changes - becomes
/// one of these and is handled start-to-finish, one at a time, in
/// enqueue order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
  /// The application invoked an interface operation
  Api(ApiRequest),
  /// The host's IO path delivered a datagram
  RecvDgram(Addrd<Vec<u8>>),
  /// A timer fired
  TimerExpired(TimerKind),
  /// A value in the object tree was replaced through an
  /// engine-mediated setter
  ValueUpdated(Path),
}

/// The interface operations, as data.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ApiRequest {
  /// `bootstrap(security)`
  Bootstrap(Security),
  /// `register(security, object_list)`
  Register(Security, Vec<Object>),
  /// `update_registration(lifetime)`
  UpdateRegistration(Option<u32>),
  /// `unregister()`
  Unregister,
}

/// What the engine tells the application, drained by
/// [`crate::Interface::drive`] and delivered as observer callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
  /// Bootstrap finished; the carried Security instance points at
  /// the LWM2M server to `register` with
  BootstrapDone(Security),
  /// Registration succeeded
  Registered,
  /// A registration update (explicit or lifetime-driven) succeeded
  RegistrationUpdated,
  /// Deregistration succeeded; the engine is idle again
  Unregistered,
  /// A value changed (whether through a server write or an
  /// application setter)
  ValueUpdated(Path),
  /// A server executed a resource; the bytes are the request
  /// payload (execute arguments)
  Executed(Path, Vec<u8>),
  /// Something failed; see [`Error`]
  Error(Error),
}
