use crate::proto;
use serde::{Deserialize, Serialize};

/// Key/value label attached to a sensor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

impl Annotation {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A registered sensor.
///
/// An empty string in any field means "not set". The same type doubles as a
/// query template (selector) and as an update template, where only the set
/// fields take part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Unique identifier, assigned by the store when left empty on create
    pub id: String,
    /// Grouping label
    pub collection: String,
    pub name: String,
    /// Measurement unit label
    pub unit: String,
    /// Data ingestion route label
    pub ingress: String,
    pub annotations: Vec<Annotation>,
}

impl Sensor {
    /// Returns true if every set field of `template` matches this sensor.
    ///
    /// Scalar fields compare for equality. Annotations in the template must
    /// each be present on the sensor. An all-empty template matches anything.
    pub fn matches(&self, template: &Sensor) -> bool {
        let scalar = |wanted: &str, actual: &str| wanted.is_empty() || wanted == actual;

        scalar(&template.id, &self.id)
            && scalar(&template.collection, &self.collection)
            && scalar(&template.name, &self.name)
            && scalar(&template.unit, &self.unit)
            && scalar(&template.ingress, &self.ingress)
            && template
                .annotations
                .iter()
                .all(|a| self.annotations.contains(a))
    }

    /// Overwrites every field that is set in `update`.
    ///
    /// Annotations are replaced wholesale, never merged. The id is left alone.
    pub fn apply_update(&mut self, update: &Sensor) {
        fn overwrite(target: &mut String, value: &str) {
            if !value.is_empty() {
                *target = value.to_string();
            }
        }

        overwrite(&mut self.collection, &update.collection);
        overwrite(&mut self.name, &update.name);
        overwrite(&mut self.unit, &update.unit);
        overwrite(&mut self.ingress, &update.ingress);

        if !update.annotations.is_empty() {
            self.annotations = update.annotations.clone();
        }
    }

    /// True when no field is set, i.e. the template matches every sensor
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.collection.is_empty()
            && self.name.is_empty()
            && self.unit.is_empty()
            && self.ingress.is_empty()
            && self.annotations.is_empty()
    }
}

/// Bulk update request: apply `update` to every sensor matching `selector`.
///
/// Both halves are optional on the wire; the service rejects the request
/// when either is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorUpdate {
    pub selector: Option<Sensor>,
    pub update: Option<Sensor>,
}

/// Result envelope for read and update calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorList {
    pub count: usize,
    pub sensors: Vec<Sensor>,
}

impl From<Vec<Sensor>> for SensorList {
    fn from(sensors: Vec<Sensor>) -> Self {
        Self {
            count: sensors.len(),
            sensors,
        }
    }
}

impl From<proto::Annotation> for Annotation {
    fn from(a: proto::Annotation) -> Self {
        Self {
            key: a.key,
            value: a.value,
        }
    }
}

impl From<Annotation> for proto::Annotation {
    fn from(a: Annotation) -> Self {
        Self {
            key: a.key,
            value: a.value,
        }
    }
}

impl From<proto::Sensor> for Sensor {
    fn from(s: proto::Sensor) -> Self {
        Self {
            id: s.uuid,
            collection: s.collection,
            name: s.name,
            unit: s.unit,
            ingress: s.ingress,
            annotations: s.annotations.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Sensor> for proto::Sensor {
    fn from(s: Sensor) -> Self {
        Self {
            uuid: s.id,
            collection: s.collection,
            name: s.name,
            unit: s.unit,
            ingress: s.ingress,
            annotations: s.annotations.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<proto::SensorUpdate> for SensorUpdate {
    fn from(u: proto::SensorUpdate) -> Self {
        Self {
            selector: u.selector.map(Into::into),
            update: u.update.map(Into::into),
        }
    }
}

impl From<SensorList> for proto::Sensors {
    fn from(list: SensorList) -> Self {
        Self {
            count: i32::try_from(list.count).unwrap_or(i32::MAX),
            sensors: list.sensors.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: &str, collection: &str) -> Sensor {
        Sensor {
            id: id.to_string(),
            collection: collection.to_string(),
            name: format!("name-{}", id),
            unit: "celsius".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_template_matches_everything() {
        let template = Sensor::default();
        assert!(template.is_empty());
        assert!(sensor("a", "lab").matches(&template));
        assert!(Sensor::default().matches(&template));
    }

    #[test]
    fn test_scalar_fields_must_be_equal() {
        let s = sensor("a", "lab");
        let template = Sensor {
            collection: "lab".to_string(),
            unit: "celsius".to_string(),
            ..Default::default()
        };
        assert!(s.matches(&template));

        let template = Sensor {
            collection: "lab".to_string(),
            unit: "kelvin".to_string(),
            ..Default::default()
        };
        assert!(!s.matches(&template));
    }

    #[test]
    fn test_template_annotations_must_be_present() {
        let mut s = sensor("a", "lab");
        s.annotations = vec![Annotation::new("floor", "2"), Annotation::new("room", "b")];

        let template = Sensor {
            annotations: vec![Annotation::new("room", "b")],
            ..Default::default()
        };
        assert!(s.matches(&template));

        let template = Sensor {
            annotations: vec![Annotation::new("room", "c")],
            ..Default::default()
        };
        assert!(!s.matches(&template));
    }

    #[test]
    fn test_apply_update_overwrites_only_set_fields() {
        let mut s = sensor("a", "lab");
        s.ingress = "mqtt".to_string();
        s.annotations = vec![Annotation::new("floor", "2")];

        s.apply_update(&Sensor {
            name: "renamed".to_string(),
            ..Default::default()
        });

        assert_eq!(s.id, "a");
        assert_eq!(s.collection, "lab");
        assert_eq!(s.name, "renamed");
        assert_eq!(s.unit, "celsius");
        assert_eq!(s.ingress, "mqtt");
        assert_eq!(s.annotations, vec![Annotation::new("floor", "2")]);
    }

    #[test]
    fn test_apply_update_replaces_annotations() {
        let mut s = sensor("a", "lab");
        s.annotations = vec![Annotation::new("floor", "2"), Annotation::new("room", "b")];

        s.apply_update(&Sensor {
            annotations: vec![Annotation::new("foo", "1 2 3")],
            ..Default::default()
        });

        assert_eq!(s.annotations, vec![Annotation::new("foo", "1 2 3")]);
    }

    #[test]
    fn test_apply_update_never_touches_id() {
        let mut s = sensor("a", "lab");
        s.apply_update(&Sensor {
            id: "b".to_string(),
            ..Default::default()
        });
        assert_eq!(s.id, "a");
    }

    #[test]
    fn test_proto_conversion_maps_uuid_to_id() {
        let wire = proto::Sensor {
            uuid: "fake1".to_string(),
            collection: "fake-collection1".to_string(),
            annotations: vec![proto::Annotation {
                key: "foo".to_string(),
                value: "bar".to_string(),
            }],
            ..Default::default()
        };

        let s: Sensor = wire.clone().into();
        assert_eq!(s.id, "fake1");
        assert_eq!(s.annotations, vec![Annotation::new("foo", "bar")]);

        let back: proto::Sensor = s.into();
        assert_eq!(back, wire);
    }

    #[test]
    fn test_sensor_list_count_follows_sensors() {
        let list = SensorList::from(vec![sensor("a", "lab"), sensor("b", "lab")]);
        assert_eq!(list.count, 2);

        let wire: proto::Sensors = list.into();
        assert_eq!(wire.count, 2);
        assert_eq!(wire.sensors[1].uuid, "b");
    }
}
