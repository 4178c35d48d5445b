//! Canonical text rendering of sensors and order-independent comparison.

use crate::model::{Annotation, Sensor};

/// Render a sensor as a fixed-format string covering every field.
///
/// Values are embedded without escaping, so the rendering is ambiguous when
/// a value itself contains a ` <field>=` fragment: `name="a unit=b", unit="c"`
/// and `name="a", unit="b unit=c"` produce the same string.
pub fn canonical_string(sensor: &Sensor) -> String {
    format!(
        "< Sensor uuid={} collection={} name={} unit={} ingress={} annotations={} >",
        sensor.id,
        sensor.collection,
        sensor.name,
        sensor.unit,
        sensor.ingress,
        annotations_string(&sensor.annotations),
    )
}

fn annotation_string(annotation: &Annotation) -> String {
    format!(
        "< Annotation key={} value={} >",
        annotation.key, annotation.value
    )
}

/// Annotations are rendered in stored order; two sensors carrying the same
/// annotations in a different order render differently.
fn annotations_string(annotations: &[Annotation]) -> String {
    let rendered: Vec<String> = annotations.iter().map(annotation_string).collect();
    format!("<AnnoList {} >", rendered.join(", "))
}

/// Compare two sensor sequences irrespective of order.
///
/// Both sides are sorted by id, ties broken by canonical string, and
/// compared pairwise on their canonical strings.
pub fn sensor_lists_equal(left: &[Sensor], right: &[Sensor]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    sorted_canonical(left) == sorted_canonical(right)
}

fn sorted_canonical(sensors: &[Sensor]) -> Vec<(&str, String)> {
    let mut keyed: Vec<(&str, String)> = sensors
        .iter()
        .map(|s| (s.id.as_str(), canonical_string(s)))
        .collect();
    keyed.sort();
    keyed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: &str) -> Sensor {
        Sensor {
            id: id.to_string(),
            collection: format!("collection-{}", id),
            name: format!("name-{}", id),
            unit: "fake-unit".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_canonical_string_format() {
        let mut s = sensor("fake1");
        s.annotations = vec![Annotation::new("foo", "1 2 3")];

        assert_eq!(
            canonical_string(&s),
            "< Sensor uuid=fake1 collection=collection-fake1 name=name-fake1 unit=fake-unit \
             ingress= annotations=<AnnoList < Annotation key=foo value=1 2 3 > > >"
        );
    }

    #[test]
    fn test_equal_regardless_of_order() {
        let a = vec![sensor("1"), sensor("2"), sensor("3")];
        let b = vec![sensor("3"), sensor("1"), sensor("2")];
        assert!(sensor_lists_equal(&a, &b));
        assert!(sensor_lists_equal(&b, &a));
    }

    #[test]
    fn test_length_mismatch_is_unequal() {
        let a = vec![sensor("1"), sensor("2")];
        let b = vec![sensor("1")];
        assert!(!sensor_lists_equal(&a, &b));
    }

    #[test]
    fn test_field_difference_is_unequal() {
        let a = vec![sensor("1"), sensor("2")];
        let mut b = a.clone();
        b[1].ingress = "mqtt".to_string();
        assert!(!sensor_lists_equal(&a, &b));
    }

    #[test]
    fn test_annotation_order_is_significant() {
        let mut a = sensor("1");
        a.annotations = vec![Annotation::new("x", "1"), Annotation::new("y", "2")];
        let mut b = a.clone();
        b.annotations.reverse();
        assert!(!sensor_lists_equal(&[a], &[b]));
    }

    #[test]
    fn test_duplicate_ids_in_any_order_are_equal() {
        let mut a = sensor("1");
        a.name = "x".to_string();
        let mut b = sensor("1");
        b.name = "y".to_string();

        assert!(sensor_lists_equal(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(!sensor_lists_equal(&[a.clone(), a.clone()], &[a, b]));
    }

    #[test]
    fn test_empty_lists_are_equal() {
        assert!(sensor_lists_equal(&[], &[]));
    }
}
