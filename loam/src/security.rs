use loam_msg::tlv::Tlv;
use no_std_net::{IpAddr, SocketAddr};
use std_alloc::string::String;
use std_alloc::vec::Vec;

use crate::config::Config;
use crate::error::Error;
use crate::tree::{Value, ValueType};

/// The security mode advertised in a Security object instance.
///
/// Only the mode is carried here; DTLS itself is the host's business.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityMode {
  /// Pre-shared keys
  Psk = 0,
  /// Raw public keys
  Rpk = 1,
  /// Certificates
  Certificate = 2,
  /// No security
  NoSec = 3,
}

impl TryFrom<i64> for SecurityMode {
  type Error = Error;

  fn try_from(n: i64) -> Result<Self, Error> {
    match n {
      | 0 => Ok(SecurityMode::Psk),
      | 1 => Ok(SecurityMode::Rpk),
      | 2 => Ok(SecurityMode::Certificate),
      | 3 => Ok(SecurityMode::NoSec),
      | _ => Err(Error::InvalidParameters),
    }
  }
}

/// One instance of the Security object (object id 0): where a server
/// lives and how to talk to it.
///
/// The instance handed to [`bootstrap`](crate::Interface::bootstrap)
/// must carry `bootstrap = true`; the instance handed to
/// [`register`](crate::Interface::register) (usually the one a
/// bootstrap server wrote back) must not.
///
/// ```
/// use loam::{Security, SecurityMode};
///
/// let bs = Security::bootstrap("coap://127.0.0.1:5693");
/// assert!(bs.is_bootstrap());
/// assert_eq!(bs.mode(), SecurityMode::NoSec);
///
/// let server = Security::server("coap://127.0.0.1:5683");
/// assert!(!server.is_bootstrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Security {
  server_uri: String,
  bootstrap: bool,
  mode: SecurityMode,
  public_key: Vec<u8>,
  server_public_key: Vec<u8>,
  secret_key: Vec<u8>,
  short_server_id: u16,
}

/// Resource ids of the Security object
mod res {
  pub(super) const SERVER_URI: u16 = 0;
  pub(super) const BOOTSTRAP: u16 = 1;
  pub(super) const MODE: u16 = 2;
  pub(super) const PUBLIC_KEY: u16 = 3;
  pub(super) const SERVER_PUBLIC_KEY: u16 = 4;
  pub(super) const SECRET_KEY: u16 = 5;
  pub(super) const SHORT_SERVER_ID: u16 = 10;
}

impl Security {
  /// A Security instance describing a bootstrap server.
  pub fn bootstrap(server_uri: impl Into<String>) -> Self {
    Self { server_uri: server_uri.into(),
           bootstrap: true,
           mode: SecurityMode::NoSec,
           public_key: Vec::new(),
           server_public_key: Vec::new(),
           secret_key: Vec::new(),
           short_server_id: 0 }
  }

  /// A Security instance describing an LWM2M server.
  pub fn server(server_uri: impl Into<String>) -> Self {
    Self { bootstrap: false,
           ..Self::bootstrap(server_uri) }
  }

  /// Set the security mode
  pub fn mode_is(mut self, mode: SecurityMode) -> Self {
    self.mode = mode;
    self
  }

  /// Set the client public key (or identity, under PSK)
  pub fn public_key_is(mut self, key: impl Into<Vec<u8>>) -> Self {
    self.public_key = key.into();
    self
  }

  /// Set the server public key
  pub fn server_public_key_is(mut self, key: impl Into<Vec<u8>>) -> Self {
    self.server_public_key = key.into();
    self
  }

  /// Set the secret key
  pub fn secret_key_is(mut self, key: impl Into<Vec<u8>>) -> Self {
    self.secret_key = key.into();
    self
  }

  /// Set the short server id
  pub fn short_server_id_is(mut self, id: u16) -> Self {
    self.short_server_id = id;
    self
  }

  /// The server URI
  pub fn server_uri(&self) -> &str {
    &self.server_uri
  }

  /// Whether this instance describes a bootstrap server
  pub fn is_bootstrap(&self) -> bool {
    self.bootstrap
  }

  /// The security mode
  pub fn mode(&self) -> SecurityMode {
    self.mode
  }

  /// The short server id
  pub fn short_server_id(&self) -> u16 {
    self.short_server_id
  }

  /// Resolve the server URI to a socket address.
  ///
  /// The URI must be `coap://` or `coaps://` with an IP-literal host
  /// (IPv4 dotted quad or bracketed IPv6) and an optional port;
  /// without a port the scheme's default from `config` applies.
  /// Anything else is [`Error::InvalidParameters`].
  ///
  /// ```
  /// use loam::config::Config;
  /// use loam::Security;
  ///
  /// let sec = Security::server("coap://127.0.0.1");
  /// let addr = sec.server_addr(&Config::default()).unwrap();
  /// assert_eq!(addr.port(), 5683);
  ///
  /// assert!(Security::server("http://127.0.0.1").server_addr(&Config::default()).is_err());
  /// ```
  pub fn server_addr(&self, config: &Config) -> Result<SocketAddr, Error> {
    let (rest, default_port) = if let Some(rest) = self.server_uri.strip_prefix("coap://") {
      (rest, config.default_port)
    } else if let Some(rest) = self.server_uri.strip_prefix("coaps://") {
      (rest, config.default_secure_port)
    } else {
      return Err(Error::InvalidParameters);
    };

    let authority = rest.split('/').next().unwrap_or("");

    let (host, port) = if let Some(v6_rest) = authority.strip_prefix('[') {
      let (host, after) = v6_rest.split_once(']').ok_or(Error::InvalidParameters)?;
      match after.strip_prefix(':') {
        | Some(port) => (host, Some(port)),
        | None if after.is_empty() => (host, None),
        | None => return Err(Error::InvalidParameters),
      }
    } else {
      match authority.rsplit_once(':') {
        | Some((host, port)) => (host, Some(port)),
        | None => (authority, None),
      }
    };

    let ip: IpAddr = host.parse().map_err(|_| Error::InvalidParameters)?;
    let port = match port {
      | Some(p) => p.parse().map_err(|_| Error::InvalidParameters)?,
      | None => default_port,
    };

    Ok(SocketAddr::new(ip, port))
  }

  /// This instance as the resource TLV sequence a bootstrap server
  /// would write.
  pub fn to_tlv(&self) -> Vec<Tlv> {
    std_alloc::vec![Tlv::ResourceValue { id: res::SERVER_URI,
                                         value: self.server_uri.as_bytes().to_vec() },
                    Tlv::ResourceValue { id: res::BOOTSTRAP,
                                         value: Value::Bool(self.bootstrap).to_tlv_bytes() },
                    Tlv::ResourceValue { id: res::MODE,
                                         value: Value::Int(self.mode as i64).to_tlv_bytes() },
                    Tlv::ResourceValue { id: res::PUBLIC_KEY,
                                         value: self.public_key.clone() },
                    Tlv::ResourceValue { id: res::SERVER_PUBLIC_KEY,
                                         value: self.server_public_key.clone() },
                    Tlv::ResourceValue { id: res::SECRET_KEY,
                                         value: self.secret_key.clone() },
                    Tlv::ResourceValue { id: res::SHORT_SERVER_ID,
                                         value: Value::Int(self.short_server_id as i64).to_tlv_bytes() },]
  }

  /// Rebuild a Security instance from the resource TLV sequence of a
  /// bootstrap WRITE.
  ///
  /// The server URI resource is mandatory; everything else defaults.
  pub fn from_tlv(entries: &[Tlv]) -> Result<Self, Error> {
    let mut out: Option<Security> = None;
    let mut bootstrap = false;
    let mut mode = SecurityMode::NoSec;
    let mut public_key = Vec::new();
    let mut server_public_key = Vec::new();
    let mut secret_key = Vec::new();
    let mut short_server_id = 0u16;

    let int = |bytes: &[u8]| {
      Value::from_tlv_bytes(ValueType::Int, bytes).map_err(|_| Error::InvalidParameters)
                                                  .map(|v| match v {
                                                    | Value::Int(n) => n,
                                                    | _ => 0,
                                                  })
    };

    for entry in entries {
      let value = match entry {
        | Tlv::ResourceValue { value, .. } => value,
        | _ => continue,
      };

      match entry.id() {
        | res::SERVER_URI => {
          let uri =
            core::str::from_utf8(value).map_err(|_| Error::InvalidParameters)?;
          out = Some(Security::server(uri));
        },
        | res::BOOTSTRAP => {
          bootstrap = matches!(value.as_slice(), [1]);
        },
        | res::MODE => {
          mode = SecurityMode::try_from(int(value)?)?;
        },
        | res::PUBLIC_KEY => public_key = value.clone(),
        | res::SERVER_PUBLIC_KEY => server_public_key = value.clone(),
        | res::SECRET_KEY => secret_key = value.clone(),
        | res::SHORT_SERVER_ID => {
          short_server_id = u16::try_from(int(value)?).map_err(|_| Error::InvalidParameters)?;
        },
        | _ => (),
      }
    }

    let mut out = out.ok_or(Error::InvalidParameters)?;
    out.bootstrap = bootstrap;
    out.mode = mode;
    out.public_key = public_key;
    out.server_public_key = server_public_key;
    out.secret_key = secret_key;
    out.short_server_id = short_server_id;
    Ok(out)
  }
}
