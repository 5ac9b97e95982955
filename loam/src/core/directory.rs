use loam_msg::link_format::{self, Link};
use std_alloc::collections::BTreeMap;
use std_alloc::string::{String, ToString};

use crate::tree::{Object, ObjectId, Path};

/// The root type advertised for the client itself.
const OMA_ROOT_RT: &str = "oma.lwm2m";

/// Build the link-format document published at registration (and on
/// register-update when the object set changed).
///
/// One link per object instance, plus one per observable resource
/// carrying `obs`. The Security object (id 0) never appears; a
/// server has no business reading its own credentials back.
pub(crate) fn registration_payload(objects: &BTreeMap<ObjectId, Object>) -> String {
  let mut links = std_alloc::vec![Link::new("/").attr("rt", OMA_ROOT_RT)];

  for object in objects.values() {
    if object.id() == ObjectId::SECURITY {
      continue;
    }

    for instance in object.instances() {
      links.push(Link::new(Path::instance(object.id(), instance.id()).to_string()));

      for resource in instance.resources() {
        if resource.is_observable() {
          let path = Path::resource(object.id(), instance.id(), resource.id());
          links.push(Link::new(path.to_string()).flag("obs"));
        }
      }
    }
  }

  link_format::encode(&links)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::{InstanceId, Operations, Resource, ResourceId, Value};

  fn objects() -> BTreeMap<ObjectId, Object> {
    let mut objects = BTreeMap::new();

    let mut server = Object::reserved(ObjectId::SERVER, "server");
    server.create_instance_with_id(InstanceId(0)).unwrap();
    objects.insert(server.id(), server);

    let mut app = Object::new(ObjectId(42), "app").unwrap();
    let inst = app.create_instance_with_id(InstanceId(0)).unwrap();
    inst.add_resource(Resource::single(ResourceId(1),
                                       Operations::READ,
                                       Value::String("MyValue".into())).observable())
        .unwrap();
    objects.insert(app.id(), app);

    objects
  }

  #[test]
  fn publishes_instances_and_observable_resources() {
    assert_eq!(registration_payload(&objects()),
               "</>;rt=\"oma.lwm2m\",</1/0>,</42/0>,</42/0/1>;obs");
  }

  #[test]
  fn security_object_is_never_published() {
    let mut objects = objects();
    let mut security = Object::reserved(ObjectId::SECURITY, "security");
    security.create_instance_with_id(InstanceId(1)).unwrap();
    objects.insert(ObjectId::SECURITY, security);

    assert!(!registration_payload(&objects).contains("</0/"));
  }
}
