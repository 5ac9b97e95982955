//! A minimal LWM2M client against a server at `coap://127.0.0.1:5683`.
//!
//! Registers a Device object and one observable "pressure" resource,
//! then sits in a receive/drive loop answering server operations.
//!
//! ```sh
//! cargo run --example client
//! ```

use std::time::Duration;

use loam::endpoint::Endpoint;
use loam::net::Addrd;
use loam::std::{Clock, UdpTransport};
use loam::tree::{Object, ObjectId, Operations, Path, Resource, ResourceId, Value};
use loam::{Device, Error, Interface, InterfaceObserver, Security};

#[derive(Default)]
struct App;

impl InterfaceObserver for App {
  fn bootstrap_done(&mut self, security: Security) {
    println!("bootstrapped; server is {}", security.server_uri());
  }

  fn object_registered(&mut self) {
    println!("registered");
  }

  fn object_unregistered(&mut self) {
    println!("unregistered");
  }

  fn registration_updated(&mut self) {
    println!("registration updated");
  }

  fn value_updated(&mut self, path: &Path) {
    println!("value updated at {}", path);
  }

  fn error(&mut self, error: Error) {
    eprintln!("error: {:?}", error);
  }
}

fn to_no_std(addr: std::net::SocketAddr) -> no_std_net::SocketAddr {
  use no_std_net::{SocketAddrV4, SocketAddrV6};

  match addr {
    | std::net::SocketAddr::V4(a) => {
      let [o1, o2, o3, o4] = a.ip().octets();
      SocketAddrV4::new(no_std_net::Ipv4Addr::new(o1, o2, o3, o4), a.port()).into()
    },
    | std::net::SocketAddr::V6(a) => {
      SocketAddrV6::new(no_std_net::Ipv6Addr::from(a.ip().octets()), a.port(), 0, 0).into()
    },
  }
}

fn pressure_object() -> Object {
  let mut object = Object::new(ObjectId(42), "pressure").expect("42 is not reserved");
  let instance = object.create_instance();
  instance.add_resource(Resource::single(ResourceId(1),
                                         Operations::READ | Operations::WRITE,
                                         Value::Float(101.3)).observable())
          .expect("fresh instance");
  object
}

fn main() {
  simple_logger::init_with_level(log::Level::Info).unwrap();

  let endpoint = Endpoint::new("lwm2m-endpoint", "test", 3600).unwrap();
  let transport = UdpTransport::bind("0.0.0.0:0").unwrap();
  let socket = transport.socket().try_clone().unwrap();

  let mut client = Interface::new(App::default(), endpoint, Clock::new(), transport);

  let device = Device::new().manufacturer("arm")
                            .device_type("pressure")
                            .model_number("2015")
                            .serial_number("12345")
                            .into_object();

  client.register(Security::server("coap://127.0.0.1:5683"),
                  vec![device, pressure_object()]);

  let mut buf = [0u8; 1152];
  loop {
    match socket.recv_from(&mut buf) {
      | Ok((n, from)) => client.deliver(Addrd(buf[..n].to_vec(), to_no_std(from))),
      | Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
        std::thread::sleep(Duration::from_millis(50))
      },
      | Err(e) => {
        eprintln!("recv failed: {}", e);
        break;
      },
    }

    client.drive();
  }
}
