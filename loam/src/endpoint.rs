use std_alloc::string::String;

use crate::error::Error;

/// How the client reaches (and is reached by) the server.
///
/// Only UDP transmission is implemented; the other modes are
/// accepted, advertised in the registration query, and otherwise
/// behave as UDP.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BindingMode {
  /// Plain UDP
  #[default]
  Udp,
  /// UDP with queued delivery for sleeping devices
  UdpQueue,
  /// SMS
  Sms,
  /// SMS with queued delivery
  SmsQueue,
  /// TCP
  Tcp,
}

impl BindingMode {
  /// The value advertised in the `b=` registration query parameter
  pub fn query_value(&self) -> &'static str {
    match self {
      | BindingMode::Udp => "U",
      | BindingMode::UdpQueue => "UQ",
      | BindingMode::Sms => "S",
      | BindingMode::SmsQueue => "SQ",
      | BindingMode::Tcp => "T",
    }
  }
}

/// The parameters the client advertises about itself at
/// registration time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
  name: String,
  ty: String,
  lifetime: u32,
  domain: String,
  binding: BindingMode,
  context: String,
}

impl Endpoint {
  /// Create an endpoint.
  ///
  /// The name must be non-empty and the lifetime at least 1 second;
  /// anything else is [`Error::InvalidParameters`].
  ///
  /// ```
  /// use loam::endpoint::{BindingMode, Endpoint};
  ///
  /// let ep = Endpoint::new("lwm2m-endpoint", "test", 3600).unwrap();
  /// assert_eq!(ep.name(), "lwm2m-endpoint");
  /// assert_eq!(ep.binding(), BindingMode::Udp);
  ///
  /// assert!(Endpoint::new("", "test", 3600).is_err());
  /// assert!(Endpoint::new("lwm2m-endpoint", "test", 0).is_err());
  /// ```
  pub fn new(name: impl Into<String>,
             ty: impl Into<String>,
             lifetime: u32)
             -> Result<Self, Error> {
    let name = name.into();

    if name.is_empty() || lifetime == 0 {
      return Err(Error::InvalidParameters);
    }

    Ok(Self { name,
              ty: ty.into(),
              lifetime,
              domain: String::new(),
              binding: BindingMode::Udp,
              context: String::new() })
  }

  /// Set the endpoint's domain
  pub fn domain(mut self, domain: impl Into<String>) -> Self {
    self.domain = domain.into();
    self
  }

  /// Set the endpoint's binding mode
  pub fn binding_mode(mut self, binding: BindingMode) -> Self {
    self.binding = binding;
    self
  }

  /// Set the endpoint's context address
  pub fn context_address(mut self, context: impl Into<String>) -> Self {
    self.context = context.into();
    self
  }

  /// The endpoint name (`ep=` at registration)
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The endpoint type (`et=` at registration)
  pub fn ty(&self) -> &str {
    &self.ty
  }

  /// Registration lifetime, in seconds (`lt=` at registration)
  pub fn lifetime(&self) -> u32 {
    self.lifetime
  }

  /// Replace the advertised lifetime.
  ///
  /// Zero means "keep the current lifetime" and is ignored.
  pub fn set_lifetime(&mut self, lifetime: u32) {
    if lifetime > 0 {
      self.lifetime = lifetime;
    }
  }

  /// The endpoint's domain (`d=` at registration), possibly empty
  pub fn domain_name(&self) -> &str {
    &self.domain
  }

  /// The endpoint's binding mode (`b=` at registration)
  pub fn binding(&self) -> BindingMode {
    self.binding
  }
}
