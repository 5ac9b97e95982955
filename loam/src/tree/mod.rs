//! The in-memory hierarchy of management objects the client exposes:
//! Object -> ObjectInstance -> Resource -> resource instances.
//!
//! Nodes are addressed by [`Path`]s (`/<object>/<instance>/<resource>`)
//! rather than by references between tree levels; the engine owns the
//! whole tree and children never point back at their parents.

use core::fmt;

/// Object identifiers
pub mod object;

/// Object instances
pub mod instance;

/// Resources and their values
pub mod resource;

/// Resource values
pub mod value;

pub use instance::ObjectInstance;
pub use object::Object;
pub use resource::{Operations, Resource, ResourceKind};
pub use value::{Value, ValueParseError, ValueType};

/// Identifies an [`Object`]; `3` in `/3/0/13`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId(pub u16);

/// Identifies an [`ObjectInstance`] within its object; `0` in `/3/0/13`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InstanceId(pub u16);

/// Identifies a [`Resource`] within its instance; `13` in `/3/0/13`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceId(pub u16);

/// Identifies one instance of a multi-instance resource
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceInstanceId(pub u16);

impl ObjectId {
  /// The Security object
  pub const SECURITY: ObjectId = ObjectId(0);
  /// The Server object
  pub const SERVER: ObjectId = ObjectId(1);
  /// The Device object
  pub const DEVICE: ObjectId = ObjectId(3);

  /// Whether this id belongs to the range reserved for the
  /// standard OMA objects; application objects must stay out of it.
  pub fn is_reserved(&self) -> bool {
    self.0 <= 7
  }
}

/// The address of a node in the object tree, at any depth.
///
/// ```
/// use loam::tree::Path;
///
/// let path = Path::parse("/42/0/1").unwrap();
/// assert_eq!(path.to_string(), "/42/0/1");
/// assert!(Path::parse("/42").unwrap().contains(&path));
/// assert!(Path::parse("/42/x").is_none());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
  /// First segment
  pub object: ObjectId,
  /// Second segment, when the path is deeper than an object
  pub instance: Option<InstanceId>,
  /// Third segment, when the path is deeper than an instance
  pub resource: Option<ResourceId>,
  /// Fourth segment, addressing one instance of a
  /// multi-instance resource
  pub resource_instance: Option<ResourceInstanceId>,
}

impl Path {
  /// A path addressing a whole object
  pub fn object(object: ObjectId) -> Self {
    Self { object,
           instance: None,
           resource: None,
           resource_instance: None }
  }

  /// A path addressing an object instance
  pub fn instance(object: ObjectId, instance: InstanceId) -> Self {
    Self { instance: Some(instance),
           ..Self::object(object) }
  }

  /// A path addressing a resource
  pub fn resource(object: ObjectId, instance: InstanceId, resource: ResourceId) -> Self {
    Self { resource: Some(resource),
           ..Self::instance(object, instance) }
  }

  /// A path addressing one instance of a multi-instance resource
  pub fn resource_instance(object: ObjectId,
                           instance: InstanceId,
                           resource: ResourceId,
                           resource_instance: ResourceInstanceId)
                           -> Self {
    Self { resource_instance: Some(resource_instance),
           ..Self::resource(object, instance, resource) }
  }

  /// Parse a `/`-separated path of 1 to 4 numeric segments.
  ///
  /// Anything else (empty, too deep, non-numeric segments, gaps)
  /// yields None.
  pub fn parse(s: &str) -> Option<Self> {
    let mut segments = s.split('/').filter(|seg| !seg.is_empty());

    let object = ObjectId(segments.next()?.parse().ok()?);
    let instance = match segments.next() {
      | Some(seg) => Some(InstanceId(seg.parse().ok()?)),
      | None => None,
    };
    let resource = match segments.next() {
      | Some(seg) => Some(ResourceId(seg.parse().ok()?)),
      | None => None,
    };
    let resource_instance = match segments.next() {
      | Some(seg) => Some(ResourceInstanceId(seg.parse().ok()?)),
      | None => None,
    };

    if segments.next().is_some()
       || (instance.is_none() && resource.is_some())
       || (resource.is_none() && resource_instance.is_some())
    {
      return None;
    }

    Some(Self { object,
                instance,
                resource,
                resource_instance })
  }

  /// Whether `other` addresses this node or one of its descendants.
  ///
  /// Observation dispatch uses this: an observation of `/42`
  /// fires when `/42/0/1` changes.
  pub fn contains(&self, other: &Path) -> bool {
    fn level_ok<T: PartialEq>(mine: Option<T>, theirs: Option<T>) -> bool {
      match (mine, theirs) {
        | (None, _) => true,
        | (Some(a), Some(b)) => a == b,
        | (Some(_), None) => false,
      }
    }

    self.object == other.object
    && level_ok(self.instance, other.instance)
    && level_ok(self.resource, other.resource)
    && level_ok(self.resource_instance, other.resource_instance)
  }

}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "/{}", self.object.0)?;
    if let Some(InstanceId(iid)) = self.instance {
      write!(f, "/{}", iid)?;
    }
    if let Some(ResourceId(rid)) = self.resource {
      write!(f, "/{}", rid)?;
    }
    if let Some(ResourceInstanceId(riid)) = self.resource_instance {
      write!(f, "/{}", riid)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_all_depths() {
    assert_eq!(Path::parse("3"), Some(Path::object(ObjectId(3))));
    assert_eq!(Path::parse("/3/0"),
               Some(Path::instance(ObjectId(3), InstanceId(0))));
    assert_eq!(Path::parse("/3/0/13"),
               Some(Path::resource(ObjectId(3), InstanceId(0), ResourceId(13))));
    assert_eq!(Path::parse("/3/0/13/1"),
               Some(Path::resource_instance(ObjectId(3),
                                            InstanceId(0),
                                            ResourceId(13),
                                            ResourceInstanceId(1))));
  }

  #[test]
  fn parse_rejects_junk() {
    assert_eq!(Path::parse(""), None);
    assert_eq!(Path::parse("bs"), None);
    assert_eq!(Path::parse("/3/x"), None);
    assert_eq!(Path::parse("/3/0/1/2/3"), None);
    assert_eq!(Path::parse("/99999999"), None);
  }

  #[test]
  fn contains_is_prefix_at_every_level() {
    let deep = Path::parse("/42/0/1").unwrap();
    assert!(Path::parse("/42").unwrap().contains(&deep));
    assert!(Path::parse("/42/0").unwrap().contains(&deep));
    assert!(deep.contains(&deep));
    assert!(!deep.contains(&Path::parse("/42/0").unwrap()));
    assert!(!Path::parse("/43").unwrap().contains(&deep));
  }

  #[test]
  fn reserved_ids() {
    assert!(ObjectId(0).is_reserved());
    assert!(ObjectId(7).is_reserved());
    assert!(!ObjectId(8).is_reserved());
    assert!(!ObjectId(42).is_reserved());
  }
}
