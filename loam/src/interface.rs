use std_alloc::vec::Vec;

use crate::config::Config;
use crate::core::event::ApiRequest;
use crate::core::{Core, Notice, State};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::net::{Addrd, Transport};
use crate::security::Security;
use crate::time::Clock;
use crate::tree::{Object, Path, Value};

/// How results reach the application.
///
/// Every interface operation is non-blocking; outcomes arrive
/// through these callbacks, invoked on whatever thread calls
/// [`Interface::drive`] - never from inside an operation and never
/// concurrently.
pub trait InterfaceObserver {
  /// Bootstrap finished; `security` is the LWM2M server the
  /// bootstrap server provisioned, ready to hand to
  /// [`Interface::register`]
  fn bootstrap_done(&mut self, security: Security);

  /// Registration succeeded
  fn object_registered(&mut self);

  /// Deregistration succeeded
  fn object_unregistered(&mut self);

  /// A registration update (explicit or lifetime-driven) succeeded
  fn registration_updated(&mut self);

  /// A value in the object tree changed, through a server write or
  /// an application setter
  fn value_updated(&mut self, path: &Path);

  /// A server executed a resource; `args` is the raw execute payload
  fn resource_executed(&mut self, path: &Path, args: &[u8]) {
    let _ = (path, args);
  }

  /// An operation failed; see [`Error`] for the kinds
  fn error(&mut self, error: Error);
}

/// The public face of the client: translate application calls into
/// engine events and engine notices into observer callbacks.
///
/// ```no_run
/// use loam::endpoint::Endpoint;
/// use loam::std::{Clock, UdpTransport};
/// use loam::{Interface, InterfaceObserver, Security};
///
/// # struct App;
/// # impl InterfaceObserver for App {
/// #   fn bootstrap_done(&mut self, _: Security) {}
/// #   fn object_registered(&mut self) {}
/// #   fn object_unregistered(&mut self) {}
/// #   fn registration_updated(&mut self) {}
/// #   fn value_updated(&mut self, _: &loam::tree::Path) {}
/// #   fn error(&mut self, _: loam::Error) {}
/// # }
/// let endpoint = Endpoint::new("lwm2m-endpoint", "test", 3600).unwrap();
/// let transport = UdpTransport::bind("0.0.0.0:0").unwrap();
/// let mut client = Interface::new(App, endpoint, Clock::new(), transport);
///
/// client.bootstrap(Security::bootstrap("coap://127.0.0.1:5693"));
/// loop {
///   // pump inbound datagrams via client.deliver(..), then:
///   client.drive();
/// }
/// ```
#[allow(missing_debug_implementations)]
pub struct Interface<C: Clock, T: Transport, O: InterfaceObserver> {
  core: Core<C, T>,
  observer: O,
}

impl<C: Clock, T: Transport, O: InterfaceObserver> Interface<C, T, O> {
  /// A client with the default [`Config`].
  pub fn new(observer: O, endpoint: Endpoint, clock: C, transport: T) -> Self {
    Self::with_config(observer, endpoint, clock, transport, Config::default())
  }

  /// A client with explicit runtime configuration.
  pub fn with_config(observer: O,
                     endpoint: Endpoint,
                     clock: C,
                     transport: T,
                     config: Config)
                     -> Self {
    Self { core: Core::new(clock, transport, config, endpoint),
           observer }
  }

  /// Start bootstrapping against the bootstrap server `security`
  /// describes. Requires the bootstrap flag and an idle engine;
  /// completion surfaces as
  /// [`bootstrap_done`](InterfaceObserver::bootstrap_done).
  pub fn bootstrap(&mut self, security: Security) {
    self.core.enqueue_api(ApiRequest::Bootstrap(security));
  }

  /// Register `objects` with the LWM2M server `security` describes
  /// (bootstrap flag must be clear). Completion surfaces as
  /// [`object_registered`](InterfaceObserver::object_registered).
  ///
  /// The engine takes ownership of the objects; mutate them from
  /// here on through [`Interface::set_value`].
  pub fn register(&mut self, security: Security, objects: Vec<Object>) {
    self.core.enqueue_api(ApiRequest::Register(security, objects));
  }

  /// Refresh the registration, optionally replacing the advertised
  /// lifetime (`Some(0)` keeps the current one). Valid only while
  /// registered.
  pub fn update_registration(&mut self, lifetime: Option<u32>) {
    self.core
        .enqueue_api(ApiRequest::UpdateRegistration(lifetime));
  }

  /// Deregister. Supersedes any update still in flight.
  pub fn unregister(&mut self) {
    self.core.enqueue_api(ApiRequest::Unregister);
  }

  /// Hand an inbound datagram to the engine. Non-blocking: call
  /// from the host's receive path, then [`Interface::drive`].
  pub fn deliver(&mut self, dgram: Addrd<Vec<u8>>) {
    self.core.deliver(dgram);
  }

  /// Process queued work and deliver pending observer callbacks.
  /// Call frequently; everything the engine does happens here.
  pub fn drive(&mut self) {
    self.core.drive();

    while let Some(notice) = self.core.poll_notice() {
      match notice {
        | Notice::BootstrapDone(security) => self.observer.bootstrap_done(security),
        | Notice::Registered => self.observer.object_registered(),
        | Notice::RegistrationUpdated => self.observer.registration_updated(),
        | Notice::Unregistered => self.observer.object_unregistered(),
        | Notice::ValueUpdated(path) => self.observer.value_updated(&path),
        | Notice::Executed(path, args) => self.observer.resource_executed(&path, &args),
        | Notice::Error(error) => self.observer.error(error),
      }
    }
  }

  /// Replace a resource value, triggering `value_updated` and
  /// notification evaluation on the next [`Interface::drive`].
  pub fn set_value(&mut self, path: Path, value: Value) -> Result<(), Error> {
    self.core.set_value(path, value)
  }

  /// Read a resource value.
  pub fn value(&self, path: &Path) -> Option<&Value> {
    self.core.value(path)
  }

  /// Remove a whole object and everything under it. The next
  /// register-update re-publishes the resource directory without it.
  pub fn remove_object(&mut self, id: crate::tree::ObjectId) -> Result<(), Error> {
    self.core.remove_object(id)
  }

  /// Remove one object instance (`path` must address an instance)
  /// and everything under it.
  pub fn remove_instance(&mut self, path: Path) -> Result<(), Error> {
    self.core.remove_instance(path)
  }

  /// Where the registration state machine stands.
  pub fn state(&self) -> State {
    self.core.state()
  }

  /// The application observer, for state the callbacks accumulated.
  pub fn observer(&self) -> &O {
    &self.observer
  }

  /// Mutable access to the application observer.
  pub fn observer_mut(&mut self) -> &mut O {
    &mut self.observer
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;
  use loam_msg::tlv::Tlv;
  use loam_msg::{Code, ContentFormat, Id, Message, Token, Type};

  use super::*;
  use crate::config::Con;
  use crate::retry::{Attempts, Strategy};
  use crate::test::{bootstrap_addr, dgram, server_addr, ClockMock, SockMock};
  use crate::tree::{InstanceId, ObjectId, Operations, Resource, ResourceId};

  #[derive(Default)]
  struct Recorder {
    bootstrap_done: Vec<Security>,
    registered: u32,
    unregistered: u32,
    updated: u32,
    value_updates: Vec<Path>,
    executed: Vec<(Path, Vec<u8>)>,
    errors: Vec<Error>,
  }

  impl InterfaceObserver for Recorder {
    fn bootstrap_done(&mut self, security: Security) {
      self.bootstrap_done.push(security);
    }

    fn object_registered(&mut self) {
      self.registered += 1;
    }

    fn object_unregistered(&mut self) {
      self.unregistered += 1;
    }

    fn registration_updated(&mut self) {
      self.updated += 1;
    }

    fn value_updated(&mut self, path: &Path) {
      self.value_updates.push(*path);
    }

    fn resource_executed(&mut self, path: &Path, args: &[u8]) {
      self.executed.push((*path, args.to_vec()));
    }

    fn error(&mut self, error: Error) {
      self.errors.push(error);
    }
  }

  type TestInterface = Interface<ClockMock, SockMock, Recorder>;

  fn harness(lifetime: u32) -> (TestInterface, ClockMock, SockMock) {
    let clock = ClockMock::new();
    let sock = SockMock::new();
    let endpoint = Endpoint::new("lwm2m-endpoint", "test", lifetime).unwrap();
    // no retransmission jitter; tests want exact timings
    let config = Config { con: Con { retry_strategy:
                                       Strategy::Exponential { init_min: Milliseconds(2_000),
                                                               init_max: Milliseconds(2_000) },
                                     max_retransmits: Attempts(4) },
                          ..Config::default() };
    let iface = Interface::with_config(Recorder::default(),
                                       endpoint,
                                       clock.clone(),
                                       sock.clone(),
                                       config);
    (iface, clock, sock)
  }

  fn app_object() -> Object {
    let mut object = Object::new(ObjectId(42), "app").unwrap();
    let inst = object.create_instance_with_id(InstanceId(0)).unwrap();
    inst.add_resource(Resource::single(ResourceId(1),
                                       Operations::READ | Operations::WRITE,
                                       Value::String("MyValue".into())).observable())
        .unwrap();
    inst.add_resource(Resource::single(ResourceId(2),
                                       Operations::EXECUTE,
                                       Value::String("".into())))
        .unwrap();
    object
  }

  fn register(iface: &mut TestInterface, sock: &SockMock) {
    iface.register(Security::server("coap://127.0.0.1:5683"),
                   std_alloc::vec![app_object()]);
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let req = sent[0].data();

    let mut resp = Message::new(Type::Ack, Code::CREATED, req.id, req.token);
    resp.set_location_path("rd/abc123");
    iface.deliver(dgram(resp, server_addr()));
    iface.drive();

    assert_eq!(iface.state(), State::Registered);
  }

  fn token(bytes: &[u8]) -> Token {
    Token::from_slice(bytes).unwrap()
  }

  #[test]
  fn bootstrap_then_register() {
    let (mut iface, _clock, sock) = harness(3600);

    iface.bootstrap(Security::bootstrap("coap://127.0.0.1:5693"));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].addr(), bootstrap_addr());
    let bs_req = sent[0].data();
    assert_eq!(bs_req.code, Code::POST);
    assert_eq!(bs_req.path().unwrap(), "bs");
    assert!(bs_req.queries().any(|q| q == "ep=lwm2m-endpoint"));
    assert_eq!(iface.state(), State::Bootstrapping);

    // server accepts
    let ack = Message::new(Type::Ack, Code::CHANGED, bs_req.id, bs_req.token);
    iface.deliver(dgram(ack, bootstrap_addr()));
    iface.drive();

    // server writes the registration credentials into /0/1
    let written = Security::server("coap://127.0.0.1:5683");
    let mut write = Message::new(Type::Con, Code::PUT, Id(100), token(&[1]));
    write.set_path("0/1");
    write.set_content_format(ContentFormat::Tlv);
    write.payload.0 = Tlv::encode(&written.to_tlv()).unwrap();
    iface.deliver(dgram(write, bootstrap_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data().code, Code::CHANGED);

    // bootstrap finish
    let mut finish = Message::new(Type::Con, Code::POST, Id(101), token(&[2]));
    finish.set_path("bs");
    iface.deliver(dgram(finish, bootstrap_addr()));
    iface.drive();

    assert_eq!(sock.sent()[0].data().code, Code::CHANGED);
    assert_eq!(iface.state(), State::Bootstrapped);
    assert_eq!(iface.observer().bootstrap_done.len(), 1);
    let provisioned = iface.observer().bootstrap_done[0].clone();
    assert_eq!(provisioned.server_uri(), "coap://127.0.0.1:5683");
    assert!(!provisioned.is_bootstrap());

    // register with what the bootstrap server gave us
    iface.register(provisioned, std_alloc::vec![app_object()]);
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].addr(), server_addr());
    let reg = sent[0].data();
    assert_eq!(reg.code, Code::POST);
    assert_eq!(reg.path().unwrap(), "rd");
    assert!(reg.queries().any(|q| q == "ep=lwm2m-endpoint"));
    assert!(reg.queries().any(|q| q == "lt=3600"));
    assert!(reg.queries().any(|q| q == "b=U"));
    assert!(reg.queries().any(|q| q == "et=test"));
    assert_eq!(reg.content_format(), Some(ContentFormat::LinkFormat));
    let payload = ::std::str::from_utf8(&reg.payload.0).unwrap().to_string();
    assert!(payload.contains("rt=\"oma.lwm2m\""), "{}", payload);
    assert!(payload.contains("</42/0>"), "{}", payload);
    assert!(payload.contains("</42/0/1>;obs"), "{}", payload);
    assert!(!payload.contains("</0/"), "{}", payload);

    let mut created = Message::new(Type::Ack, Code::CREATED, reg.id, reg.token);
    created.set_location_path("rd/abc123");
    iface.deliver(dgram(created, server_addr()));
    iface.drive();

    assert_eq!(iface.state(), State::Registered);
    assert_eq!(iface.observer().registered, 1);
  }

  #[test]
  fn lifetime_refresh_at_75_percent() {
    let (mut iface, clock, sock) = harness(20);
    register(&mut iface, &sock);

    clock.set(14_999);
    iface.drive();
    assert_eq!(sock.sent().len(), 0);

    clock.set(15_000);
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let update = sent[0].data();
    assert_eq!(update.code, Code::POST);
    assert_eq!(update.path().unwrap(), "rd/abc123");
    assert!(update.queries().any(|q| q == "lt=20"));

    let ack = Message::new(Type::Ack, Code::CHANGED, update.id, update.token);
    iface.deliver(dgram(ack, server_addr()));
    iface.drive();

    assert_eq!(iface.state(), State::Registered);
    assert_eq!(iface.observer().updated, 1);
  }

  #[test]
  fn explicit_update_supersedes_auto_refresh() {
    let (mut iface, clock, sock) = harness(20);
    register(&mut iface, &sock);

    clock.set(5_000);
    iface.update_registration(Some(20));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let update = sent[0].data();
    let ack = Message::new(Type::Ack, Code::CHANGED, update.id, update.token);
    iface.deliver(dgram(ack, server_addr()));
    iface.drive();

    // the refresh timer restarted at the explicit update; nothing
    // else goes out before 5s + 75% of 20s
    let mut t = 6_000;
    while t < 20_000 {
      clock.set(t);
      iface.drive();
      assert_eq!(sock.sent().len(), 0, "unexpected send at t={}", t);
      t += 1_000;
    }

    clock.set(20_000);
    iface.drive();
    assert_eq!(sock.sent().len(), 1);
  }

  #[test]
  fn observe_then_notify() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut get = Message::new(Type::Con, Code::GET, Id(200), token(&[0x9a]));
    get.set_path("42/0/1");
    get.set_observe(0);
    iface.deliver(dgram(get, server_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let initial = sent[0].data();
    assert_eq!(initial.code, Code::CONTENT);
    assert_eq!(initial.token, token(&[0x9a]));
    assert_eq!(initial.observe(), Some(0));
    assert_eq!(initial.payload.0, b"MyValue".to_vec());

    iface.set_value(Path::parse("/42/0/1").unwrap(),
                    Value::String("NewValue".into()))
         .unwrap();
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let notification = sent[0].data();
    assert_eq!(notification.ty, Type::Non);
    assert_eq!(notification.code, Code::CONTENT);
    assert_eq!(notification.token, token(&[0x9a]));
    assert_eq!(notification.observe(), Some(1));
    assert_eq!(notification.payload.0, b"NewValue".to_vec());

    assert_eq!(iface.observer().value_updates,
               std_alloc::vec![Path::parse("/42/0/1").unwrap()]);
  }

  #[test]
  fn observation_is_token_scoped() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut get = Message::new(Type::Con, Code::GET, Id(200), token(&[0x9a]));
    get.set_path("42/0/1");
    get.set_observe(0);
    iface.deliver(dgram(get, server_addr()));
    iface.drive();
    sock.sent();

    // a plain GET of the same path leaves the observation alone
    let mut plain = Message::new(Type::Con, Code::GET, Id(201), token(&[0x77]));
    plain.set_path("42/0/1");
    iface.deliver(dgram(plain, server_addr()));
    iface.drive();
    assert_eq!(sock.sent()[0].data().observe(), None);

    // cancel under the observing token
    let mut cancel = Message::new(Type::Con, Code::GET, Id(202), token(&[0x9a]));
    cancel.set_path("42/0/1");
    cancel.set_observe(1);
    iface.deliver(dgram(cancel, server_addr()));
    iface.drive();
    sock.sent();

    iface.set_value(Path::parse("/42/0/1").unwrap(), Value::String("x".into()))
         .unwrap();
    iface.drive();
    assert_eq!(sock.sent().len(), 0);
  }

  #[test]
  fn unregister_stops_timers() {
    let (mut iface, clock, sock) = harness(20);
    register(&mut iface, &sock);

    iface.unregister();
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    let del = sent[0].data();
    assert_eq!(del.code, Code::DELETE);
    assert_eq!(del.path().unwrap(), "rd/abc123");

    let ack = Message::new(Type::Ack, Code::DELETED, del.id, del.token);
    iface.deliver(dgram(ack, server_addr()));
    iface.drive();

    assert_eq!(iface.observer().unregistered, 1);
    assert_eq!(iface.state(), State::Idle);

    // lifetime timer would have fired at 15s; nothing does
    clock.set(100_000);
    iface.drive();
    assert_eq!(sock.sent().len(), 0);
  }

  #[test]
  fn get_absent_path_is_not_found() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut get = Message::new(Type::Con, Code::GET, Id(210), token(&[7]));
    get.set_path("99/0/0");
    iface.deliver(dgram(get, server_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent[0].data().code, Code::NOT_FOUND);
    assert_eq!(sent[0].data().id, Id(210));
  }

  #[test]
  fn confirmable_retransmission_is_bounded() {
    let (mut iface, clock, sock) = harness(3600);

    iface.register(Security::server("coap://127.0.0.1:5683"),
                   std_alloc::vec![app_object()]);
    iface.drive();

    let mut copies = sock.sent().len();
    assert_eq!(copies, 1);

    for t in [1_000u64, 2_000, 3_000, 4_000, 8_000, 16_000, 17_000, 30_000] {
      clock.set(t);
      iface.drive();
      copies += sock.sent().len();
    }

    // 1 original + 4 retransmits, then the exchange is poisoned
    assert_eq!(copies, 5);
    assert_eq!(iface.observer().errors, std_alloc::vec![Error::Timeout]);
    assert_eq!(iface.state(), State::Idle);
  }

  #[test]
  fn duplicate_request_replays_the_same_response() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut put = Message::new(Type::Con, Code::PUT, Id(300), token(&[3]));
    put.set_path("42/0/1");
    put.payload.0 = b"NewValue".to_vec();

    iface.deliver(dgram(put.clone(), server_addr()));
    iface.drive();
    iface.deliver(dgram(put, server_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    assert_eq!(sent[0].data().code, Code::CHANGED);

    // processed exactly once
    assert_eq!(iface.observer().value_updates.len(), 1);
    assert_eq!(iface.value(&Path::parse("/42/0/1").unwrap()),
               Some(&Value::String("NewValue".into())));
  }

  #[test]
  fn malformed_tlv_write_is_bad_request() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut put = Message::new(Type::Con, Code::PUT, Id(301), token(&[4]));
    put.set_path("42/0/1");
    put.set_content_format(ContentFormat::Tlv);
    // claims an 8-bit length byte follows, then ends
    put.payload.0 = std_alloc::vec![0b1100_1000];

    iface.deliver(dgram(put, server_addr()));
    iface.drive();

    assert_eq!(sock.sent()[0].data().code, Code::BAD_REQUEST);
    assert_eq!(iface.value(&Path::parse("/42/0/1").unwrap()),
               Some(&Value::String("MyValue".into())));
    assert_eq!(iface.observer().value_updates.len(), 0);
  }

  #[test]
  fn execute_surfaces_to_the_observer() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut post = Message::new(Type::Con, Code::POST, Id(302), token(&[5]));
    post.set_path("42/0/2");
    post.payload.0 = b"reboot please".to_vec();
    iface.deliver(dgram(post, server_addr()));
    iface.drive();

    assert_eq!(sock.sent()[0].data().code, Code::CHANGED);
    assert_eq!(iface.observer().executed,
               std_alloc::vec![(Path::parse("/42/0/2").unwrap(),
                                b"reboot please".to_vec())]);
  }

  #[test]
  fn create_then_delete_instance() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let entries = [Tlv::ObjectInstance { id: 1,
                                         resources: std_alloc::vec![
      Tlv::ResourceValue { id: 1,
                           value: b"Copied".to_vec() },
    ] }];
    let mut post = Message::new(Type::Con, Code::POST, Id(303), token(&[6]));
    post.set_path("42");
    post.set_content_format(ContentFormat::Tlv);
    post.payload.0 = Tlv::encode(&entries).unwrap();
    iface.deliver(dgram(post, server_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent[0].data().code, Code::CREATED);
    assert_eq!(sent[0].data().location_path().unwrap(), "42/1");
    assert_eq!(iface.value(&Path::parse("/42/1/1").unwrap()),
               Some(&Value::String("Copied".into())));

    // creating the same instance again collides
    let mut again = Message::new(Type::Con, Code::POST, Id(304), token(&[7]));
    again.set_path("42");
    again.set_content_format(ContentFormat::Tlv);
    again.payload.0 = Tlv::encode(&entries).unwrap();
    iface.deliver(dgram(again, server_addr()));
    iface.drive();
    assert_eq!(sock.sent()[0].data().code, Code::CONFLICT);

    let mut del = Message::new(Type::Con, Code::DELETE, Id(305), token(&[8]));
    del.set_path("42/1");
    iface.deliver(dgram(del, server_addr()));
    iface.drive();

    assert_eq!(sock.sent()[0].data().code, Code::DELETED);
    assert_eq!(iface.value(&Path::parse("/42/1/1").unwrap()), None);
  }

  #[test]
  fn well_known_core_lists_the_directory() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    let mut get = Message::new(Type::Con, Code::GET, Id(400), token(&[9]));
    get.set_path(".well-known/core");
    iface.deliver(dgram(get, server_addr()));
    iface.drive();

    let sent = sock.sent();
    assert_eq!(sent[0].data().code, Code::CONTENT);
    assert_eq!(sent[0].data().content_format(),
               Some(ContentFormat::LinkFormat));
    let doc = ::std::str::from_utf8(&sent[0].data().payload.0).unwrap();
    assert!(doc.contains("</42/0/1>;obs"), "{}", doc);
  }

  #[test]
  fn bootstrap_while_registered_is_rejected() {
    let (mut iface, _clock, sock) = harness(3600);
    register(&mut iface, &sock);

    iface.bootstrap(Security::bootstrap("coap://127.0.0.1:5693"));
    iface.drive();

    assert_eq!(iface.observer().errors, std_alloc::vec![Error::InvalidState]);
    // no wire activity, registration untouched
    assert_eq!(sock.sent().len(), 0);
    assert_eq!(iface.state(), State::Registered);
  }

  #[test]
  fn update_while_idle_is_rejected() {
    let (mut iface, _clock, sock) = harness(3600);

    iface.update_registration(Some(60));
    iface.drive();

    assert_eq!(iface.observer().errors, std_alloc::vec![Error::InvalidState]);
    assert_eq!(sock.sent().len(), 0);
  }
}
