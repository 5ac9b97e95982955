//! Inbound request dispatch: resolve the Uri-Path to a node in the
//! object tree, gate on the operation mask, and shape the response.

use loam_msg::tlv::Tlv;
use loam_msg::{Code, ContentFormat, Message, Type};
use no_std_net::SocketAddr;
use std_alloc::string::ToString;
use std_alloc::vec::Vec;

use super::event::Event;
use super::{directory, Core, Notice, State};
use crate::net::Transport;
use crate::observe::{Attributes, Observation};
use crate::security::Security;
use embedded_time::duration::Milliseconds;
use crate::time::Clock;
use crate::timer::TimerKind;
use crate::tree::{InstanceId, ObjectId, ObjectInstance, Operations, Path, Value, ValueType};

impl<C: Clock, T: Transport> Core<C, T> {
  /// Resolve and answer one inbound request. Always yields a
  /// response; "ignore" is reserved for unparseable datagrams.
  pub(super) fn dispatch_request(&mut self, req: &Message, addr: SocketAddr) -> Message {
    let path_str = match req.path() {
      | Some(path) => path,
      | None => return self.respond(req, Code::BAD_REQUEST),
    };

    log::debug!("dispatching {} /{} from {}", req.code, path_str, addr);

    if path_str == "bs" && req.code == Code::POST {
      return self.bootstrap_finish_request(req);
    }

    if path_str == ".well-known/core" && req.code == Code::GET {
      let mut response = self.respond(req, Code::CONTENT);
      response.set_content_format(ContentFormat::LinkFormat);
      response.payload.0 = directory::registration_payload(&self.objects).into_bytes();
      return response;
    }

    let path = match Path::parse(&path_str) {
      | Some(path) => path,
      | None => return self.respond(req, Code::NOT_FOUND),
    };

    match req.code {
      | Code::GET => self.handle_get(req, path),
      | Code::PUT => self.handle_put(req, path),
      | Code::POST => self.handle_post(req, path),
      | Code::DELETE => self.handle_delete(req, path),
      | _ => self.respond(req, Code::METHOD_NOT_ALLOWED),
    }
  }

  /// The server finished provisioning: empty POST to `/bs`.
  fn bootstrap_finish_request(&mut self, req: &Message) -> Message {
    if self.state != State::Bootstrapping {
      return self.respond(req, Code::BAD_REQUEST);
    }

    match self.finish_bootstrap() {
      | Some(_) => self.respond(req, Code::CHANGED),
      // finish without a credential write first
      | None => self.respond(req, Code::BAD_REQUEST),
    }
  }

  fn handle_get(&mut self, req: &Message, path: Path) -> Message {
    if path.object == ObjectId::SECURITY {
      return self.respond(req, Code::NOT_FOUND);
    }

    // Observe is token-scoped: a GET without the option never
    // touches existing observations for the path
    if req.observe() == Some(1) {
      if let Some(ix) = self.find_observation(&path, &req.token) {
        self.remove_observation(ix);
      }
    }

    let (format, payload) = match self.node_payload(&path, req.accept()) {
      | Ok(ok) => ok,
      | Err(code) => return self.respond(req, code),
    };

    let mut response = self.respond(req, Code::CONTENT);

    if req.observe() == Some(0) {
      let observable = match path.resource {
        | Some(_) => self.resource(&path)
                         .map(|r| r.is_observable())
                         .unwrap_or(false),
        | None => true,
      };

      if !observable {
        return self.respond(req, Code::METHOD_NOT_ALLOWED);
      }

      if let Some(ix) = self.find_observation(&path, &req.token) {
        self.remove_observation(ix);
      }

      let attrs = Attributes::from_queries(req.queries());
      let now = self.now();
      let mut obs = Observation::new(path, req.token, attrs);
      obs.sent(now, self.value(&path).cloned());

      response.set_observe(obs.seq.current());

      if let Some(pmax) = attrs.pmax {
        self.timers.schedule(TimerKind::MaxPeriod(path, req.token),
                             Milliseconds(pmax as u64 * 1000),
                             now);
      }

      log::debug!("observation started for {}", path);
      self.observations.push(obs);
    }

    response.set_content_format(format);
    response.payload.0 = payload;
    response
  }

  fn handle_put(&mut self, req: &Message, path: Path) -> Message {
    // during bootstrap the server writes our credentials into
    // Security instance 1; the Security object is invisible
    // otherwise
    if path.object == ObjectId::SECURITY {
      if self.state == State::Bootstrapping && path.instance.is_some() && path.resource.is_none() {
        return self.bootstrap_write(req);
      }
      return self.respond(req, Code::NOT_FOUND);
    }

    if path.resource.is_none() {
      return self.respond(req, Code::METHOD_NOT_ALLOWED);
    }

    let outcome = self.apply_write(req, &path);

    match outcome {
      | Ok(()) => {
        self.events.push_back(Event::ValueUpdated(path));
        self.respond(req, Code::CHANGED)
      },
      | Err(code) => self.respond(req, code),
    }
  }

  /// Decode and apply a PUT. Any failure leaves the tree untouched.
  fn apply_write(&mut self, req: &Message, path: &Path) -> Result<(), Code> {
    let content_format = req.content_format();
    let resource = self.resource_mut(path).ok_or(Code::NOT_FOUND)?;

    if !resource.ops().contains(Operations::WRITE) {
      return Err(Code::METHOD_NOT_ALLOWED);
    }

    match content_format {
      | Some(ContentFormat::Tlv) => {
        let entries = Tlv::decode(&req.payload.0).map_err(|_| Code::BAD_REQUEST)?;
        let entry = entries.first().ok_or(Code::BAD_REQUEST)?;
        resource.write_tlv(entry).map_err(|_| Code::BAD_REQUEST)
      },
      | _ => {
        let value = Value::from_text(resource.value_type(),
                                     &req.payload.0).map_err(|_| Code::BAD_REQUEST)?;
        match path.resource_instance {
          | Some(riid) => resource.set_instance_value(riid, value)
                                  .map_err(|_| Code::BAD_REQUEST),
          | None => resource.set_value(value).map_err(|_| Code::BAD_REQUEST),
        }
      },
    }
  }

  fn bootstrap_write(&mut self, req: &Message) -> Message {
    let security = Tlv::decode(&req.payload.0).ok()
                                              .and_then(|entries| Security::from_tlv(&entries).ok());

    match security {
      | Some(security) => {
        log::debug!("bootstrap server wrote credentials for {}", security.server_uri());
        self.bootstrapped_security = Some(security);
        self.respond(req, Code::CHANGED)
      },
      | None => self.respond(req, Code::BAD_REQUEST),
    }
  }

  fn handle_post(&mut self, req: &Message, path: Path) -> Message {
    if path.object == ObjectId::SECURITY {
      return self.respond(req, Code::NOT_FOUND);
    }

    match (path.instance, path.resource, path.resource_instance) {
      | (None, _, _) => self.create_instance(req, path),
      | (Some(_), Some(_), None) => self.execute(req, path),
      | _ => self.respond(req, Code::METHOD_NOT_ALLOWED),
    }
  }

  fn execute(&mut self, req: &Message, path: Path) -> Message {
    let resource = match self.resource(&path) {
      | Some(resource) => resource,
      | None => return self.respond(req, Code::NOT_FOUND),
    };

    if !resource.ops().contains(Operations::EXECUTE) {
      return self.respond(req, Code::METHOD_NOT_ALLOWED);
    }

    log::debug!("executing {}", path);
    self.notices
        .push_back(Notice::Executed(path, req.payload.0.clone()));
    self.respond(req, Code::CHANGED)
  }

  fn create_instance(&mut self, req: &Message, path: Path) -> Message {
    let entries = match Tlv::decode(&req.payload.0) {
      | Ok(entries) => entries,
      | Err(_) => return self.respond(req, Code::BAD_REQUEST),
    };

    let outcome = self.apply_create(&path, &entries);

    match outcome {
      | Ok(created) => {
        self.directory_dirty = true;
        let mut response = self.respond(req, Code::CREATED);
        response.set_location_path(&created.to_string());
        response
      },
      | Err(code) => self.respond(req, code),
    }
  }

  /// Build the new instance completely before adopting it, so a
  /// decode failure creates nothing.
  fn apply_create(&mut self, path: &Path, entries: &[Tlv]) -> Result<Path, Code> {
    let object = self.objects.get_mut(&path.object).ok_or(Code::NOT_FOUND)?;

    let (requested_id, resources) = match entries {
      | [Tlv::ObjectInstance { id, resources }] => (Some(InstanceId(*id)), resources.as_slice()),
      | entries => (None, entries),
    };

    let id = match requested_id {
      | Some(id) if object.instance(id).is_some() => return Err(Code::CONFLICT),
      | Some(id) => id,
      | None => object.next_free_id(),
    };

    // new instances take their shape from an existing sibling;
    // without one there is nothing to type payload values against
    let template = object.instances().next();
    let mut instance = match template {
      | Some(template) => template.duplicate(id),
      | None => ObjectInstance::new(id),
    };

    if !resources.is_empty() && template.is_some() {
      instance.write_tlv(resources).map_err(|_| Code::BAD_REQUEST)?;
    }

    object.insert_instance(instance).map_err(|_| Code::CONFLICT)?;
    Ok(Path::instance(path.object, id))
  }

  fn handle_delete(&mut self, req: &Message, path: Path) -> Message {
    if path.object == ObjectId::SECURITY {
      return self.respond(req, Code::NOT_FOUND);
    }

    match (path.instance, path.resource) {
      | (Some(iid), None) => {
        let object = match self.objects.get_mut(&path.object) {
          | Some(object) => object,
          | None => return self.respond(req, Code::NOT_FOUND),
        };

        match object.remove_instance(iid) {
          | Ok(()) => {
            self.remove_observations_under(path);
            self.directory_dirty = true;
            log::debug!("deleted {}", path);
            self.respond(req, Code::DELETED)
          },
          | Err(_) => self.respond(req, Code::NOT_FOUND),
        }
      },
      | _ => self.respond(req, Code::METHOD_NOT_ALLOWED),
    }
  }

  /// Serialize the node at `path` for a GET response or a
  /// notification: TLV above resource level, text or raw bytes for a
  /// single value, honoring the Accept option.
  pub(super) fn node_payload(&self,
                             path: &Path,
                             accept: Option<ContentFormat>)
                             -> Result<(ContentFormat, Vec<u8>), Code> {
    const INTERNAL: Code = Code::new(5, 0);

    let object = self.objects.get(&path.object).ok_or(Code::NOT_FOUND)?;

    let instance = match path.instance {
      | None => {
        let bytes = Tlv::encode(&object.to_tlv()).map_err(|_| INTERNAL)?;
        return Ok((ContentFormat::Tlv, bytes));
      },
      | Some(iid) => object.instance(iid).ok_or(Code::NOT_FOUND)?,
    };

    let resource = match path.resource {
      | None => {
        let bytes = Tlv::encode(&instance.resources_tlv()).map_err(|_| INTERNAL)?;
        return Ok((ContentFormat::Tlv, bytes));
      },
      | Some(rid) => instance.resource(rid).ok_or(Code::NOT_FOUND)?,
    };

    if !resource.ops().contains(Operations::READ) {
      return Err(Code::METHOD_NOT_ALLOWED);
    }

    let value = match path.resource_instance {
      | Some(riid) => Some(resource.instance_value(riid).ok_or(Code::NOT_FOUND)?),
      | None => resource.value(),
    };

    match value {
      | None => {
        // multi-instance resource addressed as a whole
        let bytes = Tlv::encode(&[resource.to_tlv()]).map_err(|_| INTERNAL)?;
        Ok((ContentFormat::Tlv, bytes))
      },
      | Some(value) => match accept {
        | Some(ContentFormat::Tlv) => {
          let bytes = Tlv::encode(&[resource.to_tlv()]).map_err(|_| INTERNAL)?;
          Ok((ContentFormat::Tlv, bytes))
        },
        | Some(ContentFormat::OctetStream) => {
          Ok((ContentFormat::OctetStream, value.to_tlv_bytes()))
        },
        | _ if value.value_type() == ValueType::Opaque => {
          Ok((ContentFormat::OctetStream, value.to_tlv_bytes()))
        },
        | _ => Ok((ContentFormat::Text, value.to_text())),
      },
    }
  }

  /// The response shell for a request: piggybacked in the ACK for a
  /// CON, a fresh NON otherwise. Always echoes the token.
  pub(super) fn respond(&mut self, req: &Message, code: Code) -> Message {
    match req.ty {
      | Type::Con => Message::new(Type::Ack, code, req.id, req.token),
      | _ => {
        let id = self.alloc_id();
        Message::new(Type::Non, code, id, req.token)
      },
    }
  }
}
