use loam_msg::tlv::Tlv;
use std_alloc::collections::BTreeMap;
use std_alloc::vec::Vec;

use super::{InstanceId, Operations, Resource, ResourceId};
use crate::error::Error;

/// One instance of an [`Object`](super::Object); owns the resources
/// living under `/<object>/<this instance>/`.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectInstance {
  id: InstanceId,
  resources: BTreeMap<ResourceId, Resource>,
}

impl ObjectInstance {
  /// An empty instance
  pub fn new(id: InstanceId) -> Self {
    Self { id,
           resources: BTreeMap::new() }
  }

  /// This instance's id
  pub fn id(&self) -> InstanceId {
    self.id
  }

  /// A copy of this instance under a different id; how the engine
  /// uses an existing instance as the template for a
  /// server-created one.
  pub(crate) fn duplicate(&self, id: InstanceId) -> Self {
    Self { id,
           resources: self.resources.clone() }
  }

  /// Add a resource.
  ///
  /// [`Error::AlreadyExists`] when a sibling already carries the
  /// same id.
  pub fn add_resource(&mut self, resource: Resource) -> Result<(), Error> {
    match self.resources.contains_key(&resource.id()) {
      | true => Err(Error::AlreadyExists),
      | false => {
        self.resources.insert(resource.id(), resource);
        Ok(())
      },
    }
  }

  /// The resource with the given id
  pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
    self.resources.get(&id)
  }

  /// Mutable access to the resource with the given id
  pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
    self.resources.get_mut(&id)
  }

  /// Remove a resource and everything under it
  pub fn remove_resource(&mut self, id: ResourceId) -> Result<(), Error> {
    self.resources.remove(&id).map(|_| ()).ok_or(Error::NotFound)
  }

  /// The instance's resources, in id order
  pub fn resources(&self) -> impl Iterator<Item = &Resource> {
    self.resources.values()
  }

  /// This instance as a TLV object-instance entry wrapping its
  /// readable resources.
  pub fn to_tlv(&self) -> Tlv {
    Tlv::ObjectInstance { id: self.id.0,
                          resources: self.readable_resources_tlv() }
  }

  /// The readable resources of this instance as a flat TLV sequence,
  /// the payload shape of a GET on the instance path.
  pub fn resources_tlv(&self) -> Vec<Tlv> {
    self.readable_resources_tlv()
  }

  fn readable_resources_tlv(&self) -> Vec<Tlv> {
    self.resources
        .values()
        .filter(|res| res.ops().contains(Operations::READ))
        .map(|res| res.to_tlv())
        .collect()
  }

  /// Apply an inbound TLV write: each entry addresses one of this
  /// instance's resources by id.
  ///
  /// Fails without touching anything when any entry addresses an
  /// absent resource; per-resource decode failures follow
  /// [`Resource::write_tlv`].
  pub fn write_tlv(&mut self, entries: &[Tlv]) -> Result<(), Error> {
    if entries.iter()
              .any(|e| !self.resources.contains_key(&ResourceId(e.id())))
    {
      return Err(Error::NotFound);
    }

    for entry in entries {
      // presence checked above
      if let Some(res) = self.resources.get_mut(&ResourceId(entry.id())) {
        res.write_tlv(entry)?;
      }
    }

    Ok(())
  }
}
