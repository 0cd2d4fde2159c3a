use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::rows::{NodeRow, ShapedElement, TagRow, WayRow};
use crate::errors::{Error, Result};

static PROBLEM_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).unwrap());
static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap());

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    fn within(mut self, row_set: &str) -> Self {
        self.field = format!("{row_set}.{}", self.field);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::field(
            field,
            format!("{value} is outside [{min}, {max}]"),
        ));
    }
}

fn check_not_empty(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::field(field, "must not be empty"));
    }
}

fn check_timestamp(errors: &mut Vec<ValidationError>, value: &str) {
    if !TIMESTAMP.is_match(value) {
        errors.push(ValidationError::field(
            "timestamp",
            format!("{value:?} is not a YYYY-MM-DDTHH:MM:SSZ timestamp"),
        ));
    }
}

fn check_identifier(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    check_not_empty(errors, field, value);
    if let Some(found) = PROBLEM_CHARS.find(value) {
        errors.push(ValidationError::field(
            field,
            format!("{value:?} contains problem character {:?}", found.as_str()),
        ));
    }
}

impl Validate for NodeRow {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_range(&mut errors, "lat", self.lat, -90.0, 90.0);
        check_range(&mut errors, "lon", self.lon, -180.0, 180.0);
        check_not_empty(&mut errors, "version", &self.version);
        check_timestamp(&mut errors, &self.timestamp);
        into_result(errors)
    }
}

impl Validate for WayRow {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_not_empty(&mut errors, "version", &self.version);
        check_timestamp(&mut errors, &self.timestamp);
        into_result(errors)
    }
}

impl Validate for TagRow {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        check_identifier(&mut errors, "key", &self.key);
        check_identifier(&mut errors, "type", &self.tag_type);
        into_result(errors)
    }
}

fn collect_row<R: Validate>(errors: &mut Vec<ValidationError>, row_set: &str, row: &R) {
    if let Err(row_errors) = row.validate() {
        errors.extend(row_errors.into_iter().map(|err| err.within(row_set)));
    }
}

fn collect_tags(errors: &mut Vec<ValidationError>, row_set: &str, owner: u64, tags: &[TagRow]) {
    for (index, tag) in tags.iter().enumerate() {
        let qualified = format!("{row_set}[{index}]");
        collect_row(errors, &qualified, tag);
        if tag.id != owner {
            errors.push(ValidationError::field(
                format!("{qualified}.id"),
                format!("{} does not match owner {owner}", tag.id),
            ));
        }
    }
}

impl Validate for ShapedElement {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        match self {
            ShapedElement::Node { node, tags } => {
                collect_row(&mut errors, "node", node);
                collect_tags(&mut errors, "node_tags", node.id, tags);
            }
            ShapedElement::Way { way, nodes, tags } => {
                collect_row(&mut errors, "way", way);
                for (index, way_node) in nodes.iter().enumerate() {
                    let qualified = format!("way_nodes[{index}]");
                    if way_node.id != way.id {
                        errors.push(ValidationError::field(
                            format!("{qualified}.id"),
                            format!("{} does not match owner {}", way_node.id, way.id),
                        ));
                    }
                    if way_node.position != index {
                        errors.push(ValidationError::field(
                            format!("{qualified}.position"),
                            format!("expected {index}, found {}", way_node.position),
                        ));
                    }
                }
                collect_tags(&mut errors, "way_tags", way.id, tags);
            }
        }
        into_result(errors)
    }
}

pub fn validate_element(element: &ShapedElement) -> Result<()> {
    match element.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(Error::SchemaValidation {
            kind: element.kind().to_string(),
            id: element.id(),
            field: errors[0].field.clone(),
            errors,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::rows::WayNodeRow;

    fn node_row() -> NodeRow {
        NodeRow {
            id: 1,
            lat: 12.97,
            lon: 77.59,
            user: "mapper".to_string(),
            uid: 42,
            version: "3".to_string(),
            changeset: 99,
            timestamp: "2016-05-01T10:00:00Z".to_string(),
        }
    }

    fn tag_row(key: &str, tag_type: &str) -> TagRow {
        TagRow {
            id: 1,
            key: key.to_string(),
            value: "anything, really".to_string(),
            tag_type: tag_type.to_string(),
        }
    }

    #[test]
    fn clean_node_passes() {
        let element = ShapedElement::Node {
            node: node_row(),
            tags: vec![tag_row("street", "addr"), tag_row("name:kn", "regular")],
        };
        assert!(validate_element(&element).is_ok());
    }

    #[test]
    fn reports_every_error_with_first_field() {
        let mut node = node_row();
        node.lat = 91.5;
        node.timestamp = "yesterday".to_string();
        let element = ShapedElement::Node {
            node,
            tags: vec![tag_row("street", "addr"), tag_row("opening hours", "regular")],
        };

        let err = validate_element(&element).unwrap_err();
        let Error::SchemaValidation { kind, id, field, errors } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(kind, "node");
        assert_eq!(*id, 1);
        assert_eq!(field, "node.lat");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["node.lat", "node.timestamp", "node_tags[1].key"]);

        let message = err.to_string();
        assert!(message.contains("Element of type 'node'"));
        assert!(message.contains("node_tags[1].key"));
    }

    #[test]
    fn way_node_positions_must_be_contiguous() {
        let way = WayRow {
            id: 7,
            user: "mapper".to_string(),
            uid: 42,
            version: "1".to_string(),
            changeset: 5,
            timestamp: "2016-05-01T10:00:00Z".to_string(),
        };
        let nodes = vec![
            WayNodeRow { id: 7, node_id: 1, position: 0 },
            WayNodeRow { id: 7, node_id: 2, position: 2 },
        ];
        let element = ShapedElement::Way { way, nodes, tags: vec![] };

        let errors = element.validate().unwrap_err();
        assert_eq!(errors, vec![ValidationError::field("way_nodes[1].position", "expected 1, found 2")]);
    }

    #[test]
    fn nan_coordinates_are_rejected() {
        let mut node = node_row();
        node.lon = f64::NAN;
        assert_eq!(node.validate().unwrap_err()[0].field, "lon");
    }
}
