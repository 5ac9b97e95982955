use loam_msg::tlv::Tlv;
use std_alloc::collections::BTreeMap;
use std_alloc::string::String;
use std_alloc::vec::Vec;

use super::{InstanceId, ObjectId, ObjectInstance};
use crate::error::Error;

/// A management object: a numeric id, a name, and the instances
/// living under `/<this object>/`.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
  id: ObjectId,
  name: String,
  instances: BTreeMap<InstanceId, ObjectInstance>,
}

impl Object {
  /// Create an application object.
  ///
  /// Ids `0..=7` are reserved for the standard OMA objects and are
  /// refused with [`Error::InvalidParameters`]; the Security and
  /// Device objects are built through [`crate::Security`] and
  /// [`crate::Device`] instead.
  ///
  /// ```
  /// use loam::tree::{Object, ObjectId};
  ///
  /// assert!(Object::new(ObjectId(42), "pressure").is_ok());
  /// assert!(Object::new(ObjectId(3), "sneaky-device").is_err());
  /// ```
  pub fn new(id: ObjectId, name: impl Into<String>) -> Result<Self, Error> {
    if id.is_reserved() {
      return Err(Error::InvalidParameters);
    }

    Ok(Self::reserved(id, name))
  }

  /// Create an object without the reserved-id check; how the engine
  /// builds Security and Device.
  pub(crate) fn reserved(id: ObjectId, name: impl Into<String>) -> Self {
    Self { id,
           name: name.into(),
           instances: BTreeMap::new() }
  }

  /// This object's id
  pub fn id(&self) -> ObjectId {
    self.id
  }

  /// This object's name
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The lowest instance id no instance currently uses
  pub(crate) fn next_free_id(&self) -> InstanceId {
    (0..=u16::MAX).map(InstanceId)
                  .find(|id| !self.instances.contains_key(id))
                  .unwrap_or(InstanceId(0))
  }

  /// Adopt a fully-built instance.
  pub(crate) fn insert_instance(&mut self, instance: ObjectInstance) -> Result<(), Error> {
    match self.instances.contains_key(&instance.id()) {
      | true => Err(Error::AlreadyExists),
      | false => {
        self.instances.insert(instance.id(), instance);
        Ok(())
      },
    }
  }

  /// Create an instance under the lowest free instance id and
  /// return it for resource population.
  pub fn create_instance(&mut self) -> &mut ObjectInstance {
    let id = self.next_free_id();
    self.instances.insert(id, ObjectInstance::new(id));
    // just inserted
    self.instances.get_mut(&id).expect("instance just inserted")
  }

  /// Create an instance under a specific id.
  ///
  /// [`Error::AlreadyExists`] when the id is taken.
  pub fn create_instance_with_id(&mut self, id: InstanceId) -> Result<&mut ObjectInstance, Error> {
    match self.instances.contains_key(&id) {
      | true => Err(Error::AlreadyExists),
      | false => {
        self.instances.insert(id, ObjectInstance::new(id));
        Ok(self.instances.get_mut(&id).expect("instance just inserted"))
      },
    }
  }

  /// The instance with the given id
  pub fn instance(&self, id: InstanceId) -> Option<&ObjectInstance> {
    self.instances.get(&id)
  }

  /// Mutable access to the instance with the given id
  pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut ObjectInstance> {
    self.instances.get_mut(&id)
  }

  /// Remove an instance and everything under it
  pub fn remove_instance(&mut self, id: InstanceId) -> Result<(), Error> {
    self.instances.remove(&id).map(|_| ()).ok_or(Error::NotFound)
  }

  /// The object's instances, in id order
  pub fn instances(&self) -> impl Iterator<Item = &ObjectInstance> {
    self.instances.values()
  }

  /// The whole object as a TLV sequence of object-instance entries,
  /// the payload shape of a GET on the object path.
  pub fn to_tlv(&self) -> Vec<Tlv> {
    self.instances.values().map(|inst| inst.to_tlv()).collect()
  }
}
