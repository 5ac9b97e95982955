use std_alloc::string::String;

use crate::tree::{InstanceId, Object, ObjectId, Operations, Resource, ResourceId, Value};

/// Resource ids of the Device object
mod res {
  pub(super) const MANUFACTURER: u16 = 0;
  pub(super) const MODEL_NUMBER: u16 = 1;
  pub(super) const SERIAL_NUMBER: u16 = 2;
  pub(super) const FIRMWARE_VERSION: u16 = 3;
  pub(super) const DEVICE_TYPE: u16 = 17;
}

/// Builder for the Device object (object id 3): static, readable
/// facts about the hardware this client runs on.
///
/// Only the populated facts become resources.
///
/// ```
/// use loam::Device;
/// use loam::tree::ObjectId;
///
/// let device = Device::new().manufacturer("arm")
///                           .device_type("pressure")
///                           .model_number("2015")
///                           .serial_number("12345");
///
/// let object = device.into_object();
/// assert_eq!(object.id(), ObjectId::DEVICE);
/// assert_eq!(object.instances().count(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
  manufacturer: Option<String>,
  model_number: Option<String>,
  serial_number: Option<String>,
  firmware_version: Option<String>,
  device_type: Option<String>,
}

impl Device {
  /// An empty Device
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the manufacturer (`/3/0/0`)
  pub fn manufacturer(mut self, v: impl Into<String>) -> Self {
    self.manufacturer = Some(v.into());
    self
  }

  /// Set the model number (`/3/0/1`)
  pub fn model_number(mut self, v: impl Into<String>) -> Self {
    self.model_number = Some(v.into());
    self
  }

  /// Set the serial number (`/3/0/2`)
  pub fn serial_number(mut self, v: impl Into<String>) -> Self {
    self.serial_number = Some(v.into());
    self
  }

  /// Set the firmware version (`/3/0/3`)
  pub fn firmware_version(mut self, v: impl Into<String>) -> Self {
    self.firmware_version = Some(v.into());
    self
  }

  /// Set the device type (`/3/0/17`)
  pub fn device_type(mut self, v: impl Into<String>) -> Self {
    self.device_type = Some(v.into());
    self
  }

  /// Build the Device object with one instance holding the
  /// populated facts as read-only string resources.
  pub fn into_object(self) -> Object {
    let mut object = Object::reserved(ObjectId::DEVICE, "device");
    let inst = object.create_instance_with_id(InstanceId(0))
                     .expect("fresh object has no instances");

    let facts = [(res::MANUFACTURER, self.manufacturer),
                 (res::MODEL_NUMBER, self.model_number),
                 (res::SERIAL_NUMBER, self.serial_number),
                 (res::FIRMWARE_VERSION, self.firmware_version),
                 (res::DEVICE_TYPE, self.device_type)];

    for (id, fact) in facts {
      if let Some(fact) = fact {
        inst.add_resource(Resource::single(ResourceId(id),
                                           Operations::READ,
                                           Value::String(fact)))
            .expect("fact resource ids are distinct");
      }
    }

    object
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unpopulated_facts_make_no_resources() {
    let object = Device::new().manufacturer("arm").into_object();
    let inst = object.instance(InstanceId(0)).unwrap();

    assert!(inst.resource(ResourceId(res::MANUFACTURER)).is_some());
    assert!(inst.resource(ResourceId(res::MODEL_NUMBER)).is_none());
  }

  #[test]
  fn facts_are_read_only() {
    let object = Device::new().serial_number("12345").into_object();
    let res = object.instance(InstanceId(0))
                    .unwrap()
                    .resource(ResourceId(res::SERIAL_NUMBER))
                    .unwrap();

    assert_eq!(res.ops(), Operations::READ);
    assert_eq!(res.value(), Some(&Value::String("12345".into())));
  }
}
