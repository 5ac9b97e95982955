//! RFC 6690 link-format documents.
//!
//! An LWM2M client publishes its resource directory in this format:
//! once in the payload of the registration request, and again when a
//! server asks for `/.well-known/core`:
//!
//! ```text
//! </1/0>,</3/0>;rt="oma.lwm2m",</42/0/1>;obs
//! ```

use core::fmt::Write;

use std_alloc::string::String;
use std_alloc::vec::Vec;

/// One attribute attached to a link: a bare flag (`obs`), a quoted
/// string value (`rt="oma.lwm2m"`) or a bare integer value (`ct=40`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attr {
  /// `;key`
  Flag(String),
  /// `;key="value"`
  Quoted(String, String),
  /// `;key=value`
  Uint(String, u32),
}

/// One `<path>;attr;attr` entry in a link-format document.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Link {
  /// The target path, with leading `/`
  pub path: String,
  /// Attributes, serialized in order
  pub attrs: Vec<Attr>,
}

impl Link {
  /// A link with no attributes
  pub fn new(path: impl Into<String>) -> Self {
    Self { path: path.into(),
           attrs: Vec::new() }
  }

  /// Append a bare flag attribute (`;obs`)
  pub fn flag(mut self, key: impl Into<String>) -> Self {
    self.attrs.push(Attr::Flag(key.into()));
    self
  }

  /// Append a quoted string attribute (`;rt="oma.lwm2m"`)
  pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attrs.push(Attr::Quoted(key.into(), value.into()));
    self
  }

  /// Append a bare integer attribute (`;ct=40`)
  pub fn attr_uint(mut self, key: impl Into<String>, value: u32) -> Self {
    self.attrs.push(Attr::Uint(key.into(), value));
    self
  }
}

/// Serialize a sequence of links to a link-format document.
pub fn encode(links: &[Link]) -> String {
  let mut out = String::new();

  for (ix, link) in links.iter().enumerate() {
    if ix > 0 {
      out.push(',');
    }

    out.push('<');
    out.push_str(&link.path);
    out.push('>');

    for attr in &link.attrs {
      out.push(';');
      match attr {
        | Attr::Flag(key) => out.push_str(key),
        | Attr::Quoted(key, value) => {
          // infallible: fmt::Write for String cannot fail
          write!(out, "{}=\"{}\"", key, value).ok();
        },
        | Attr::Uint(key, value) => {
          write!(out, "{}={}", key, value).ok();
        },
      }
    }
  }

  out
}
