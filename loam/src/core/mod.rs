//! The NSDL engine: one event loop owning the registration state
//! machine, the object tree, observations, timers, retransmission
//! and dedup bookkeeping.
//!
//! Everything that happens - interface calls, inbound datagrams,
//! timer expiries, value changes - is queued as an [`event::Event`]
//! and handled start-to-finish, one at a time. The engine never
//! blocks: outbound sends are fire-and-forget through the
//! [`Transport`] seam, results surface to the application as
//! [`Notice`]s drained after each drive.

use embedded_time::Instant;
use loam_msg::{Code, CodeKind, ContentFormat, Id, Message, Token, TryFromBytes, TryIntoBytes,
               Type};
use no_std_net::SocketAddr;
use std_alloc::collections::{BTreeMap, VecDeque};
use std_alloc::format;
use std_alloc::string::String;
use std_alloc::vec::Vec;

pub(crate) mod dedup;
pub(crate) mod directory;
mod dispatch;

/// Engine notices
pub mod event;

use dedup::{DedupCache, DedupOutcome};
pub use event::Notice;
use event::{ApiRequest, Event};

use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::net::{Addrd, Transport};
use crate::observe::{Decision, Observation};
use crate::retry::{Attempts, RetryTimer, YouShould};
use crate::security::Security;
use embedded_time::duration::Milliseconds;
use crate::time::{self, Clock, Millis};
use crate::timer::{TimerKind, TimerQueue};
use crate::tree::{Object, ObjectId, Path, Resource, Value};

/// The registration state machine.
///
/// ```text
/// IDLE -> BOOTSTRAPPING -> BOOTSTRAPPED -> REGISTERING
///                                              |
///                                              v
///          UNREGISTERING <- (UPDATING <-> REGISTERED)
///                |
///                v
///              IDLE
/// ```
///
/// Errors transition to `Idle` from anywhere, stopping every timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
  /// Nothing in flight, no registration held
  Idle,
  /// Bootstrap requested; waiting for the server to write
  /// credentials and finish
  Bootstrapping,
  /// Credentials in hand; ready to register
  Bootstrapped,
  /// Register request in flight
  Registering,
  /// Registered; lifetime timer armed
  Registered,
  /// Register-update in flight
  Updating,
  /// Deregistration in flight
  Unregistering,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ExchangeKind {
  Bootstrap,
  Register,
  Update,
  Unregister,
}

/// A confirmable request in flight, together with its
/// retransmission state.
#[derive(Debug, Clone)]
struct Exchange<C: Clock> {
  kind: ExchangeKind,
  msg: Message,
  addr: SocketAddr,
  retry: RetryTimer<C>,
  acked: bool,
}

/// The engine. Owns the object tree and all protocol state; driven
/// by [`Core::drive`], fed by the interface facade and the host's
/// receive path.
#[allow(missing_debug_implementations)]
pub struct Core<C: Clock, T: Transport> {
  clock: C,
  sock: T,
  config: Config,
  endpoint: Endpoint,
  state: State,
  server_addr: Option<SocketAddr>,
  reg_handle: Option<String>,
  bootstrapped_security: Option<Security>,
  objects: BTreeMap<ObjectId, Object>,
  events: VecDeque<Event>,
  notices: VecDeque<Notice>,
  timers: TimerQueue,
  observations: Vec<Observation>,
  exchange: Option<Exchange<C>>,
  dedup: DedupCache,
  next_id: Id,
  token_counter: u64,
  directory_dirty: bool,
  malformed: u32,
}

impl<C: Clock, T: Transport> Core<C, T> {
  /// A fresh engine in [`State::Idle`].
  pub fn new(clock: C, sock: T, config: Config, endpoint: Endpoint) -> Self {
    Self { clock,
           sock,
           config,
           endpoint,
           state: State::Idle,
           server_addr: None,
           reg_handle: None,
           bootstrapped_security: None,
           objects: BTreeMap::new(),
           events: VecDeque::new(),
           notices: VecDeque::new(),
           timers: TimerQueue::new(),
           observations: Vec::new(),
           exchange: None,
           dedup: DedupCache::default(),
           next_id: Id(1),
           token_counter: 0,
           directory_dirty: false,
           malformed: 0 }
  }

  /// Where the state machine currently stands
  pub fn state(&self) -> State {
    self.state
  }

  /// Count of inbound datagrams dropped as unparseable, for
  /// diagnostics
  pub fn malformed_count(&self) -> u32 {
    self.malformed
  }

  /// Queue an interface operation.
  pub(crate) fn enqueue_api(&mut self, req: ApiRequest) {
    self.events.push_back(Event::Api(req));
  }

  /// Queue an inbound datagram from the host's IO path.
  /// Non-blocking; processing happens on the next [`Core::drive`].
  pub fn deliver(&mut self, dgram: Addrd<Vec<u8>>) {
    self.events.push_back(Event::RecvDgram(dgram));
  }

  /// Poll timers and process every queued event, in order, to
  /// completion. The host should call this frequently (a few times
  /// per second is plenty; after every [`Core::deliver`] is better).
  pub fn drive(&mut self) {
    let now = self.now();
    for kind in self.timers.poll_expired(now) {
      self.events.push_back(Event::TimerExpired(kind));
    }

    while let Some(event) = self.events.pop_front() {
      self.handle_event(event);
    }
  }

  /// Take the next notice for the application, if any.
  pub fn poll_notice(&mut self) -> Option<Notice> {
    self.notices.pop_front()
  }

  /// Read a resource (or resource instance) value.
  pub fn value(&self, path: &Path) -> Option<&Value> {
    self.node_value(path)
  }

  /// The object with the given id, if registered.
  pub fn object(&self, id: ObjectId) -> Option<&Object> {
    self.objects.get(&id)
  }

  /// Replace a resource (or resource instance) value, queueing
  /// `value_updated` + notification evaluation.
  ///
  /// This is the only mutation path the application gets; reaching
  /// into the tree behind the engine's back would skip observation
  /// bookkeeping.
  pub fn set_value(&mut self, path: Path, value: Value) -> Result<(), Error> {
    let resource = match path.resource {
      | Some(_) => self.resource_mut(&path).ok_or(Error::NotFound)?,
      | None => return Err(Error::InvalidParameters),
    };

    match path.resource_instance {
      | Some(riid) => resource.set_instance_value(riid, value)?,
      | None => resource.set_value(value)?,
    }

    self.events.push_back(Event::ValueUpdated(path));
    Ok(())
  }

  /// Remove a whole object and everything under it. Any
  /// observations of it die; the next register-update re-publishes
  /// the directory.
  pub fn remove_object(&mut self, id: ObjectId) -> Result<(), Error> {
    self.objects.remove(&id).ok_or(Error::NotFound)?;
    self.remove_observations_under(Path::object(id));
    self.directory_dirty = true;
    Ok(())
  }

  /// Remove one object instance and everything under it.
  pub fn remove_instance(&mut self, path: Path) -> Result<(), Error> {
    let iid = match (path.instance, path.resource) {
      | (Some(iid), None) => iid,
      | _ => return Err(Error::InvalidParameters),
    };

    self.objects
        .get_mut(&path.object)
        .ok_or(Error::NotFound)?
        .remove_instance(iid)?;
    self.remove_observations_under(path);
    self.directory_dirty = true;
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      | Event::Api(req) => self.handle_api(req),
      | Event::RecvDgram(dgram) => self.handle_dgram(dgram),
      | Event::TimerExpired(kind) => self.handle_timer(kind),
      | Event::ValueUpdated(path) => {
        self.notices.push_back(Notice::ValueUpdated(path));
        self.evaluate_observations(path);
      },
    }
  }

  // Interface operations

  fn handle_api(&mut self, req: ApiRequest) {
    match req {
      | ApiRequest::Bootstrap(security) => self.do_bootstrap(security),
      | ApiRequest::Register(security, objects) => self.do_register(security, objects),
      | ApiRequest::UpdateRegistration(lifetime) => self.do_update(lifetime, false),
      | ApiRequest::Unregister => self.do_unregister(),
    }
  }

  fn do_bootstrap(&mut self, security: Security) {
    if self.state != State::Idle {
      return self.reject(Error::InvalidState);
    }

    if !security.is_bootstrap() {
      return self.reject(Error::InvalidParameters);
    }

    let addr = match security.server_addr(&self.config) {
      | Ok(addr) => addr,
      | Err(e) => return self.reject(e),
    };

    let token = self.alloc_token();
    let mut msg = Message::new(Type::Con, Code::POST, self.alloc_id(), token);
    msg.set_path("bs");
    msg.add_query(&format!("ep={}", self.endpoint.name()));

    self.server_addr = Some(addr);
    self.bootstrapped_security = None;
    self.set_state(State::Bootstrapping);
    self.arm_exec_timer();
    self.start_exchange(ExchangeKind::Bootstrap, msg, addr);
  }

  fn do_register(&mut self, security: Security, objects: Vec<Object>) {
    if self.state != State::Idle && self.state != State::Bootstrapped {
      return self.reject(Error::InvalidState);
    }

    if security.is_bootstrap() {
      return self.reject(Error::InvalidParameters);
    }

    let addr = match security.server_addr(&self.config) {
      | Ok(addr) => addr,
      | Err(e) => return self.reject(e),
    };

    for object in objects {
      self.objects.insert(object.id(), object);
    }

    let token = self.alloc_token();
    let mut msg = Message::new(Type::Con, Code::POST, self.alloc_id(), token);
    msg.set_path("rd");
    msg.add_query(&format!("ep={}", self.endpoint.name()));
    msg.add_query(&format!("lt={}", self.endpoint.lifetime()));
    msg.add_query(&format!("b={}", self.endpoint.binding().query_value()));
    msg.add_query(&format!("et={}", self.endpoint.ty()));
    if !self.endpoint.domain_name().is_empty() {
      msg.add_query(&format!("d={}", self.endpoint.domain_name()));
    }
    msg.set_content_format(ContentFormat::LinkFormat);
    msg.payload.0 = directory::registration_payload(&self.objects).into_bytes();

    self.server_addr = Some(addr);
    self.set_state(State::Registering);
    self.arm_exec_timer();
    self.start_exchange(ExchangeKind::Register, msg, addr);
  }

  fn do_update(&mut self, lifetime: Option<u32>, auto: bool) {
    if self.state != State::Registered {
      if !auto {
        self.reject(Error::InvalidState);
      }
      return;
    }

    if let Some(lifetime) = lifetime {
      // zero means "keep the current lifetime"
      self.endpoint.set_lifetime(lifetime);
    }

    let handle = match (&self.reg_handle, self.server_addr) {
      | (Some(handle), Some(_)) => handle.clone(),
      | _ => return self.reject(Error::InvalidState),
    };
    let addr = self.server_addr.expect("checked above");

    let token = self.alloc_token();
    let mut msg = Message::new(Type::Con, Code::POST, self.alloc_id(), token);
    msg.set_path(&handle);
    msg.add_query(&format!("lt={}", self.endpoint.lifetime()));
    if self.directory_dirty {
      msg.set_content_format(ContentFormat::LinkFormat);
      msg.payload.0 = directory::registration_payload(&self.objects).into_bytes();
    }

    self.set_state(State::Updating);
    self.start_exchange(ExchangeKind::Update, msg, addr);
  }

  fn do_unregister(&mut self) {
    if self.state != State::Registered && self.state != State::Updating {
      return self.reject(Error::InvalidState);
    }

    // an unregister supersedes any update still in flight
    self.exchange = None;

    let handle = match (&self.reg_handle, self.server_addr) {
      | (Some(handle), Some(_)) => handle.clone(),
      | _ => return self.reject(Error::InvalidState),
    };
    let addr = self.server_addr.expect("checked above");

    let token = self.alloc_token();
    let mut msg = Message::new(Type::Con, Code::DELETE, self.alloc_id(), token);
    msg.set_path(&handle);

    self.set_state(State::Unregistering);
    self.start_exchange(ExchangeKind::Unregister, msg, addr);
  }

  // Inbound

  fn handle_dgram(&mut self, dgram: Addrd<Vec<u8>>) {
    let addr = dgram.addr();
    let msg = match Message::try_from_bytes(dgram.data()) {
      | Ok(msg) => msg,
      | Err(e) => {
        self.malformed += 1;
        log::warn!("dropping unparseable datagram from {}: {:?}", addr, e);
        return;
      },
    };

    log::trace!("<- {} {:?} {} ({} byte payload)",
                addr,
                msg.ty,
                msg.code,
                msg.payload.0.len());

    match msg.code.kind() {
      | CodeKind::Empty => self.handle_empty(msg, addr),
      | CodeKind::Request => {
        let now = self.now();
        match self.dedup.check(addr, msg.id, now) {
          | DedupOutcome::Duplicate(Some(response)) => {
            log::debug!("duplicate {:?} from {}, replaying response", msg.id, addr);
            self.transmit(response, addr);
          },
          | DedupOutcome::Duplicate(None) => {
            log::debug!("duplicate {:?} from {}, ignoring", msg.id, addr);
          },
          | DedupOutcome::New => {
            let response = self.dispatch_request(&msg, addr);
            self.dedup.store_response(addr, msg.id, response.clone());
            self.transmit(response, addr);
          },
        }
      },
      | CodeKind::Response => self.handle_response(msg, addr),
    }
  }

  fn handle_empty(&mut self, msg: Message, addr: SocketAddr) {
    match msg.ty {
      // CoAP ping
      | Type::Con => {
        let pong = Message::new(Type::Reset, Code::EMPTY, msg.id, Token(Default::default()));
        self.transmit(pong, addr);
      },
      | Type::Ack => {
        if let Some(exchange) = self.exchange.as_mut() {
          if exchange.msg.id == msg.id {
            exchange.acked = true;
          }
        }
      },
      | Type::Reset => {
        let ours = self.exchange
                       .as_ref()
                       .map(|e| e.msg.id == msg.id)
                       .unwrap_or(false);
        if ours {
          self.exchange = None;
          self.fail(Error::NetworkError);
        }
      },
      | Type::Non => (),
    }
  }

  fn handle_response(&mut self, msg: Message, addr: SocketAddr) {
    let matches = self.exchange
                      .as_ref()
                      .map(|e| e.msg.token == msg.token)
                      .unwrap_or(false);

    if !matches {
      log::debug!("response from {} matches no exchange, ignoring", addr);
      return;
    }

    if msg.ty == Type::Con {
      let ack = msg.ack();
      self.transmit(ack, addr);
    }

    let exchange = self.exchange.take().expect("matched above");
    self.complete_exchange(exchange.kind, msg);
  }

  fn complete_exchange(&mut self, kind: ExchangeKind, msg: Message) {
    let code = msg.code;

    if code.is_error() {
      return self.fail(Error::from_code(code));
    }

    match (kind, code) {
      | (ExchangeKind::Bootstrap, Code::CHANGED) => {
        // now the server writes credentials and finishes
        log::debug!("bootstrap request accepted");
      },
      | (ExchangeKind::Register, Code::CREATED) => {
        let handle = msg.location_path().filter(|p| !p.is_empty());
        match handle {
          | Some(handle) => {
            log::info!("registered at /{}", handle);
            self.reg_handle = Some(handle);
            self.directory_dirty = false;
            self.set_state(State::Registered);
            self.arm_registration_timer();
            self.notices.push_back(Notice::Registered);
          },
          | None => self.fail(Error::Unknown),
        }
      },
      | (ExchangeKind::Update, Code::CHANGED) => {
        self.directory_dirty = false;
        self.set_state(State::Registered);
        self.arm_registration_timer();
        self.notices.push_back(Notice::RegistrationUpdated);
      },
      | (ExchangeKind::Unregister, Code::DELETED) => {
        self.enter_idle();
        self.notices.push_back(Notice::Unregistered);
      },
      | (kind, code) => {
        log::warn!("unexpected {} completing {:?}", code, kind);
        self.fail(Error::Unknown);
      },
    }
  }

  // Timers

  fn handle_timer(&mut self, kind: TimerKind) {
    match kind {
      | TimerKind::NsdlExecution => {
        let now = self.now();
        let lifetime = Milliseconds(self.config.exchange_lifetime_millis());
        self.dedup.prune(now, lifetime);
        self.drive_retransmission();
      },
      | TimerKind::Registration => self.do_update(None, true),
      | TimerKind::MinPeriod(path, token) => {
        if let Some(ix) = self.find_observation(&path, &token) {
          if self.observations[ix].pending {
            self.send_notification(ix);
          }
        }
      },
      | TimerKind::MaxPeriod(path, token) => {
        if let Some(ix) = self.find_observation(&path, &token) {
          self.send_notification(ix);
        }
      },
    }
  }

  fn drive_retransmission(&mut self) {
    let now = self.instant();

    let decision = match self.exchange.as_mut() {
      | Some(exchange) if !exchange.acked => exchange.retry.what_should_i_do(now),
      | _ => return,
    };

    match decision {
      | Ok(YouShould::Retry) => {
        let (msg, addr) = {
          let exchange = self.exchange.as_ref().expect("checked above");
          (exchange.msg.clone(), exchange.addr)
        };
        log::debug!("retransmitting {:?} to {}", msg.id, addr);
        self.transmit(msg, addr);
      },
      | Ok(YouShould::Cry) => {
        log::warn!("retransmissions exhausted");
        self.exchange = None;
        self.fail(Error::Timeout);
      },
      | Err(nb::Error::WouldBlock) => (),
      | Err(nb::Error::Other(infallible)) => match infallible {},
    }
  }

  // Observations

  fn evaluate_observations(&mut self, changed: Path) {
    let now = self.now();
    let candidates = (0..self.observations.len()).filter(|ix| {
                                                   self.observations[*ix].path.contains(&changed)
                                                 })
                                                 .collect::<Vec<_>>();

    for ix in candidates {
      let path = self.observations[ix].path;
      let value = self.node_value(&path).cloned();

      match self.observations[ix].on_change(now, value.as_ref()) {
        | Decision::SendNow => self.send_notification(ix),
        | Decision::Defer(when) => {
          let token = self.observations[ix].token;
          self.observations[ix].pending = true;
          self.timers
              .schedule(TimerKind::MinPeriod(path, token), Milliseconds(when.0 - now.0), now);
        },
        | Decision::Skip => (),
      }
    }
  }

  fn find_observation(&self, path: &Path, token: &Token) -> Option<usize> {
    self.observations
        .iter()
        .position(|o| o.path == *path && o.token == *token)
  }

  fn send_notification(&mut self, ix: usize) {
    let addr = match self.server_addr {
      | Some(addr) => addr,
      | None => return,
    };
    let path = self.observations[ix].path;

    let (format, payload) = match self.node_payload(&path, None) {
      | Ok(ok) => ok,
      | Err(_) => {
        // the observed node is gone; drop the observation
        self.remove_observation(ix);
        return;
      },
    };

    let now = self.now();
    let value = self.node_value(&path).cloned();
    let id = self.alloc_id();

    let (token, seq, pmax) = {
      let obs = &mut self.observations[ix];
      let seq = obs.seq.next();
      obs.sent(now, value);
      (obs.token, seq, obs.attrs.pmax)
    };

    let mut msg = Message::new(Type::Non, Code::CONTENT, id, token);
    msg.set_observe(seq);
    msg.set_content_format(format);
    msg.payload.0 = payload;

    log::trace!("-> notify {} seq {} for {}", addr, seq, path);
    self.transmit(msg, addr);

    if let Some(pmax) = pmax {
      self.timers.schedule(TimerKind::MaxPeriod(path, token),
                           Milliseconds(pmax as u64 * 1000),
                           now);
    }
  }

  fn remove_observation(&mut self, ix: usize) {
    let obs = self.observations.remove(ix);
    self.timers
        .cancel(&TimerKind::MinPeriod(obs.path, obs.token));
    self.timers
        .cancel(&TimerKind::MaxPeriod(obs.path, obs.token));
  }

  /// Drop every observation of `path` or its descendants (the node
  /// was deleted).
  fn remove_observations_under(&mut self, path: Path) {
    while let Some(ix) = self.observations
                             .iter()
                             .position(|o| path.contains(&o.path))
    {
      self.remove_observation(ix);
    }
  }

  // Tree access

  fn resource(&self, path: &Path) -> Option<&Resource> {
    let (iid, rid) = (path.instance?, path.resource?);
    self.objects
        .get(&path.object)?
        .instance(iid)?
        .resource(rid)
  }

  fn resource_mut(&mut self, path: &Path) -> Option<&mut Resource> {
    let (iid, rid) = (path.instance?, path.resource?);
    self.objects
        .get_mut(&path.object)?
        .instance_mut(iid)?
        .resource_mut(rid)
  }

  fn node_value(&self, path: &Path) -> Option<&Value> {
    let resource = self.resource(path)?;
    match path.resource_instance {
      | Some(riid) => resource.instance_value(riid),
      | None => resource.value(),
    }
  }

  // Plumbing

  fn alloc_id(&mut self) -> Id {
    let id = self.next_id;
    self.next_id = id.next();
    id
  }

  fn alloc_token(&mut self) -> Token {
    self.token_counter += 1;
    Token::opaque(&self.token_counter.to_be_bytes())
  }

  fn now(&self) -> Millis {
    self.clock
        .try_now()
        .map(time::since_epoch)
        .unwrap_or(Milliseconds(0))
  }

  fn instant(&self) -> Instant<C> {
    self.clock.try_now().unwrap_or_else(|_| Instant::new(0))
  }

  fn set_state(&mut self, state: State) {
    log::debug!("{:?} -> {:?}", self.state, state);
    self.state = state;
  }

  fn arm_exec_timer(&mut self) {
    let now = self.now();
    self.timers
        .schedule_periodic(TimerKind::NsdlExecution, self.config.exec_interval, now);
  }

  fn arm_registration_timer(&mut self) {
    let now = self.now();
    // refresh at 75% of the lifetime
    let after = Milliseconds(self.endpoint.lifetime() as u64 * 750);
    self.timers.schedule(TimerKind::Registration, after, now);
  }

  fn start_exchange(&mut self, kind: ExchangeKind, msg: Message, addr: SocketAddr) {
    let retry = RetryTimer::new(self.instant(),
                                self.config.con.retry_strategy,
                                Attempts(1 + self.config.con.max_retransmits.0));
    self.exchange = Some(Exchange { kind,
                                    msg: msg.clone(),
                                    addr,
                                    retry,
                                    acked: false });
    self.transmit(msg, addr);
  }

  fn transmit(&mut self, msg: Message, addr: SocketAddr) {
    log::trace!("-> {} {:?} {} ({} byte payload)",
                addr,
                msg.ty,
                msg.code,
                msg.payload.0.len());

    let bytes = match msg.try_into_bytes() {
      | Ok(bytes) => bytes,
      | Err(e) => {
        log::error!("could not serialize message: {:?}", e);
        return;
      },
    };

    match self.sock.send(Addrd(bytes.as_slice(), addr)) {
      | Ok(()) => (),
      | Err(nb::Error::WouldBlock) => {
        log::debug!("transport busy, dropping datagram (retransmission will cover)")
      },
      | Err(nb::Error::Other(e)) => log::warn!("transport send failed: {:?}", e),
    }
  }

  /// A validation failure: tell the application, change nothing.
  fn reject(&mut self, error: Error) {
    log::debug!("rejecting operation in {:?}: {:?}", self.state, error);
    self.notices.push_back(Notice::Error(error));
  }

  /// A wire-level failure: tell the application and fall back
  /// to idle.
  fn fail(&mut self, error: Error) {
    log::warn!("failing from {:?}: {:?}", self.state, error);
    self.enter_idle();
    self.notices.push_back(Notice::Error(error));
  }

  fn enter_idle(&mut self) {
    self.set_state(State::Idle);
    self.timers.cancel_all();
    self.exchange = None;
    self.reg_handle = None;
    self.observations.clear();
  }

  /// Bootstrap finish arrived; hand the written credentials to the
  /// application and move on.
  fn finish_bootstrap(&mut self) -> Option<Security> {
    let security = self.bootstrapped_security.take()?;
    self.set_state(State::Bootstrapped);
    self.notices.push_back(Notice::BootstrapDone(security.clone()));
    Some(security)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test::{server_addr, ClockMock, SockMock};

  fn core() -> (Core<ClockMock, SockMock>, SockMock) {
    let sock = SockMock::new();
    let endpoint = Endpoint::new("ep", "t", 60).unwrap();
    let core = Core::new(ClockMock::new(), sock.clone(), Config::default(), endpoint);
    (core, sock)
  }

  #[test]
  fn malformed_datagram_is_counted_and_ignored() {
    let (mut core, sock) = core();

    core.deliver(Addrd(std_alloc::vec![0xff], server_addr()));
    core.drive();

    assert_eq!(core.malformed_count(), 1);
    assert_eq!(sock.sent_count(), 0);
  }

  #[test]
  fn response_without_exchange_is_ignored() {
    let (mut core, sock) = core();

    let resp = Message::new(Type::Ack, Code::CONTENT, Id(9), Token(Default::default()));
    core.deliver(Addrd(resp.try_into_bytes().unwrap(), server_addr()));
    core.drive();

    assert_eq!(core.state(), State::Idle);
    assert_eq!(sock.sent_count(), 0);
  }

  #[test]
  fn empty_con_is_answered_with_reset() {
    let (mut core, sock) = core();

    let ping = Message::new(Type::Con, Code::EMPTY, Id(77), Token(Default::default()));
    core.deliver(Addrd(ping.try_into_bytes().unwrap(), server_addr()));
    core.drive();

    let sent = sock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data().ty, Type::Reset);
    assert_eq!(sent[0].data().id, Id(77));
  }

  #[test]
  fn set_value_rejects_non_resource_paths() {
    let (mut core, _sock) = core();

    assert_eq!(core.set_value(Path::object(ObjectId(42)), Value::Int(1)),
               Err(Error::InvalidParameters));
  }
}
