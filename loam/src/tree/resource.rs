use bitflags::bitflags;
use loam_msg::tlv::Tlv;
use std_alloc::collections::BTreeMap;

use super::{ResourceId, ResourceInstanceId, Value, ValueType};
use crate::error::Error;

bitflags! {
  /// The operations a server may perform on a resource.
  ///
  /// Dispatch checks the mask before touching the tree: a GET of a
  /// resource without [`Operations::READ`] is `4.05 Method Not
  /// Allowed` no matter what the resource holds.
  #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
  pub struct Operations: u8 {
    /// The resource answers GET
    const READ = 0b001;
    /// The resource accepts PUT
    const WRITE = 0b010;
    /// The resource accepts POST as an execute trigger
    const EXECUTE = 0b100;
  }
}

/// Whether a resource holds one value or many.
///
/// A single-instance resource has exactly one value slot; a
/// multi-instance resource has zero or more values keyed by
/// [`ResourceInstanceId`] and no top-level value. The two are
/// different variants so the tree cannot hold both at once.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceKind {
  /// One value slot
  Single(Value),
  /// Zero or more values keyed by instance id
  Multiple(BTreeMap<ResourceInstanceId, Value>),
}

/// A leaf of the object tree: a typed value (or set of values) with
/// an operation mask and an observability flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
  id: ResourceId,
  ty: ValueType,
  ops: Operations,
  observable: bool,
  kind: ResourceKind,
}

impl Resource {
  /// A single-instance resource holding `value`.
  pub fn single(id: ResourceId, ops: Operations, value: Value) -> Self {
    Self { id,
           ty: value.value_type(),
           ops,
           observable: false,
           kind: ResourceKind::Single(value) }
  }

  /// A multi-instance resource of type `ty` with no instances yet.
  pub fn multiple(id: ResourceId, ops: Operations, ty: ValueType) -> Self {
    Self { id,
           ty,
           ops,
           observable: false,
           kind: ResourceKind::Multiple(BTreeMap::new()) }
  }

  /// Mark the resource observable; observable resources are
  /// advertised with `;obs` in the resource directory.
  pub fn observable(mut self) -> Self {
    self.observable = true;
    self
  }

  /// This resource's id
  pub fn id(&self) -> ResourceId {
    self.id
  }

  /// The declared type of this resource's value(s)
  pub fn value_type(&self) -> ValueType {
    self.ty
  }

  /// The operation mask
  pub fn ops(&self) -> Operations {
    self.ops
  }

  /// Whether observation of this resource is allowed
  pub fn is_observable(&self) -> bool {
    self.observable
  }

  /// Whether this is a multi-instance resource
  pub fn is_multiple(&self) -> bool {
    matches!(self.kind, ResourceKind::Multiple(_))
  }

  /// See [`ResourceKind`]
  pub fn kind(&self) -> &ResourceKind {
    &self.kind
  }

  /// The single value, or None for a multi-instance resource
  pub fn value(&self) -> Option<&Value> {
    match &self.kind {
      | ResourceKind::Single(v) => Some(v),
      | ResourceKind::Multiple(_) => None,
    }
  }

  /// The value of one instance of a multi-instance resource
  pub fn instance_value(&self, id: ResourceInstanceId) -> Option<&Value> {
    match &self.kind {
      | ResourceKind::Single(_) => None,
      | ResourceKind::Multiple(vs) => vs.get(&id),
    }
  }

  /// The instances of a multi-instance resource, in id order
  pub fn instances(&self) -> impl Iterator<Item = (ResourceInstanceId, &Value)> {
    let map = match &self.kind {
      | ResourceKind::Single(_) => None,
      | ResourceKind::Multiple(vs) => Some(vs),
    };
    map.into_iter().flatten().map(|(id, v)| (*id, v))
  }

  /// Replace the single value.
  ///
  /// [`Error::NotAllowed`] for a multi-instance resource,
  /// [`Error::InvalidParameters`] when the value's type does not
  /// match the resource's declared type.
  pub fn set_value(&mut self, value: Value) -> Result<(), Error> {
    if value.value_type() != self.ty {
      return Err(Error::InvalidParameters);
    }

    match &mut self.kind {
      | ResourceKind::Single(v) => {
        *v = value;
        Ok(())
      },
      | ResourceKind::Multiple(_) => Err(Error::NotAllowed),
    }
  }

  /// Insert or replace the value of one instance of a
  /// multi-instance resource.
  pub fn set_instance_value(&mut self, id: ResourceInstanceId, value: Value) -> Result<(), Error> {
    if value.value_type() != self.ty {
      return Err(Error::InvalidParameters);
    }

    match &mut self.kind {
      | ResourceKind::Single(_) => Err(Error::NotAllowed),
      | ResourceKind::Multiple(vs) => {
        vs.insert(id, value);
        Ok(())
      },
    }
  }

  /// Remove one instance of a multi-instance resource.
  pub fn remove_instance(&mut self, id: ResourceInstanceId) -> Result<(), Error> {
    match &mut self.kind {
      | ResourceKind::Single(_) => Err(Error::NotAllowed),
      | ResourceKind::Multiple(vs) => vs.remove(&id).map(|_| ()).ok_or(Error::NotFound),
    }
  }

  /// This resource as a TLV entry: a resource-with-value for a
  /// single-instance resource, a multiple-resource entry wrapping
  /// the instances otherwise.
  pub fn to_tlv(&self) -> Tlv {
    match &self.kind {
      | ResourceKind::Single(v) => Tlv::ResourceValue { id: self.id.0,
                                                        value: v.to_tlv_bytes() },
      | ResourceKind::Multiple(vs) => {
        let instances = vs.iter()
                          .map(|(id, v)| Tlv::ResourceInstance { id: id.0,
                                                                 value: v.to_tlv_bytes() })
                          .collect();
        Tlv::MultipleResource { id: self.id.0,
                                instances }
      },
    }
  }

  /// Apply an inbound TLV write to this resource.
  ///
  /// The entry's id must match; value bytes are decoded against the
  /// declared type. The write is all-or-nothing: any decode failure
  /// leaves the resource untouched.
  pub fn write_tlv(&mut self, tlv: &Tlv) -> Result<(), Error> {
    if tlv.id() != self.id.0 {
      return Err(Error::InvalidParameters);
    }

    match (tlv, &mut self.kind) {
      | (Tlv::ResourceValue { value, .. }, ResourceKind::Single(slot)) => {
        *slot = Value::from_tlv_bytes(self.ty, value).map_err(|_| Error::InvalidParameters)?;
        Ok(())
      },
      | (Tlv::MultipleResource { instances, .. }, ResourceKind::Multiple(slots)) => {
        let mut decoded = BTreeMap::new();
        for inst in instances {
          match inst {
            | Tlv::ResourceInstance { id, value } => {
              let value =
                Value::from_tlv_bytes(self.ty, value).map_err(|_| Error::InvalidParameters)?;
              decoded.insert(ResourceInstanceId(*id), value);
            },
            | _ => return Err(Error::InvalidParameters),
          }
        }
        *slots = decoded;
        Ok(())
      },
      | _ => Err(Error::InvalidParameters),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn single() -> Resource {
    Resource::single(ResourceId(1),
                     Operations::READ | Operations::WRITE,
                     Value::String("MyValue".into()))
  }

  #[test]
  fn single_value_slot() {
    let mut res = single();
    assert_eq!(res.value(), Some(&Value::String("MyValue".into())));
    assert!(!res.is_multiple());

    res.set_value(Value::String("NewValue".into())).unwrap();
    assert_eq!(res.value(), Some(&Value::String("NewValue".into())));

    assert_eq!(res.set_value(Value::Int(1)), Err(Error::InvalidParameters));
    assert_eq!(res.set_instance_value(ResourceInstanceId(0), Value::String("x".into())),
               Err(Error::NotAllowed));
  }

  #[test]
  fn multiple_instances() {
    let mut res = Resource::multiple(ResourceId(6), Operations::READ, ValueType::Int);
    res.set_instance_value(ResourceInstanceId(0), Value::Int(1))
       .unwrap();
    res.set_instance_value(ResourceInstanceId(1), Value::Int(5))
       .unwrap();

    assert_eq!(res.value(), None);
    assert_eq!(res.instance_value(ResourceInstanceId(1)), Some(&Value::Int(5)));
    assert_eq!(res.instances().count(), 2);

    res.remove_instance(ResourceInstanceId(0)).unwrap();
    assert_eq!(res.remove_instance(ResourceInstanceId(0)),
               Err(Error::NotFound));
  }

  #[test]
  fn tlv_write_round_trip() {
    let mut res = single();
    let tlv = Tlv::ResourceValue { id: 1,
                                   value: b"NewValue".to_vec() };
    res.write_tlv(&tlv).unwrap();
    assert_eq!(res.value(), Some(&Value::String("NewValue".into())));
    assert_eq!(res.to_tlv(),
               Tlv::ResourceValue { id: 1,
                                    value: b"NewValue".to_vec() });
  }

  #[test]
  fn tlv_write_is_all_or_nothing() {
    let mut res = Resource::multiple(ResourceId(6), Operations::WRITE, ValueType::Bool);
    res.set_instance_value(ResourceInstanceId(0), Value::Bool(false))
       .unwrap();

    let bad = Tlv::MultipleResource { id: 6,
                                      instances: std_alloc::vec![
      Tlv::ResourceInstance { id: 0,
                              value: std_alloc::vec![1] },
      Tlv::ResourceInstance { id: 1,
                              value: std_alloc::vec![9] },
    ] };

    assert_eq!(res.write_tlv(&bad), Err(Error::InvalidParameters));
    assert_eq!(res.instance_value(ResourceInstanceId(0)),
               Some(&Value::Bool(false)));
  }
}
