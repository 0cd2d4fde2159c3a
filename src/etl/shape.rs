use std::fmt::Display;
use std::str::FromStr;

use crate::data::osm::{ChildKind, Element, ElementKind};
use crate::data::rows::{NodeRow, ShapedElement, TagRow, WayNodeRow, WayRow};
use crate::errors::{Error, Result};
use crate::etl::keys::decompose_key;
use crate::etl::normalize::normalize_value;
use crate::etl::validate::validate_element;

const CREATED_BY: &str = "created_by";

#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeOptions {
    /// Rewrite `_` to a space in every tag value except `created_by`.
    pub underscores_to_spaces: bool,
}

pub fn shape_element(element: &Element, options: &ShapeOptions) -> Result<Option<ShapedElement>> {
    match element.kind {
        ElementKind::Node => shape_node(element, options).map(Some),
        ElementKind::Way => shape_way(element, options).map(Some),
        ElementKind::Relation => Ok(None),
    }
}

fn shape_node(element: &Element, options: &ShapeOptions) -> Result<ShapedElement> {
    let id = element_id(element)?;
    let node = NodeRow {
        id,
        lat: parse_attribute(element, id, "lat")?,
        lon: parse_attribute(element, id, "lon")?,
        user: text_attribute(element, id, "user")?,
        uid: parse_attribute(element, id, "uid")?,
        version: text_attribute(element, id, "version")?,
        changeset: parse_attribute(element, id, "changeset")?,
        timestamp: text_attribute(element, id, "timestamp")?,
    };
    let tags = shape_tags(element, id, options)?;
    Ok(ShapedElement::Node { node, tags })
}

fn shape_way(element: &Element, options: &ShapeOptions) -> Result<ShapedElement> {
    let id = element_id(element)?;
    let way = WayRow {
        id,
        user: text_attribute(element, id, "user")?,
        uid: parse_attribute(element, id, "uid")?,
        version: text_attribute(element, id, "version")?,
        changeset: parse_attribute(element, id, "changeset")?,
        timestamp: text_attribute(element, id, "timestamp")?,
    };

    let nodes = element
        .children_of(ChildKind::Nd)
        .enumerate()
        .map(|(position, nd)| {
            let raw = nd.attributes.get("ref").ok_or_else(|| Error::MissingAttribute {
                kind: "nd of way".to_string(),
                id: Some(id),
                attribute: "ref".to_string(),
            })?;
            let node_id = raw.trim().parse::<u64>().map_err(|err| Error::InvalidAttribute {
                kind: "nd of way".to_string(),
                id: Some(id),
                attribute: "ref".to_string(),
                value: raw.to_string(),
                reason: err.to_string(),
            })?;
            Ok(WayNodeRow { id, node_id, position })
        })
        .collect::<Result<Vec<_>>>()?;

    let tags = shape_tags(element, id, options)?;
    Ok(ShapedElement::Way { way, nodes, tags })
}

fn shape_tags(element: &Element, id: u64, options: &ShapeOptions) -> Result<Vec<TagRow>> {
    let missing = |attribute: &str| Error::MissingAttribute {
        kind: format!("tag of {}", element.kind),
        id: Some(id),
        attribute: attribute.to_string(),
    };

    element
        .children_of(ChildKind::Tag)
        .map(|tag| {
            let raw_key = tag.attributes.get("k").ok_or_else(|| missing("k"))?.trim();
            let raw_value = tag.attributes.get("v").ok_or_else(|| missing("v"))?.trim();

            let (tag_type, key) = decompose_key(raw_key);
            let value = if options.underscores_to_spaces && raw_key != CREATED_BY {
                normalize_value(&raw_value.replace('_', " "))
            } else {
                normalize_value(raw_value)
            };

            Ok(TagRow {
                id,
                key: key.to_string(),
                value,
                tag_type: tag_type.to_string(),
            })
        })
        .collect()
}

fn element_id(element: &Element) -> Result<u64> {
    let raw = element.attributes.get("id").ok_or_else(|| Error::MissingAttribute {
        kind: element.kind.to_string(),
        id: None,
        attribute: "id".to_string(),
    })?;
    raw.trim().parse().map_err(|err: std::num::ParseIntError| Error::InvalidAttribute {
        kind: element.kind.to_string(),
        id: None,
        attribute: "id".to_string(),
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn text_attribute(element: &Element, id: u64, name: &str) -> Result<String> {
    element
        .attributes
        .get(name)
        .map(|value| value.trim().to_string())
        .ok_or_else(|| Error::MissingAttribute {
            kind: element.kind.to_string(),
            id: Some(id),
            attribute: name.to_string(),
        })
}

fn parse_attribute<T>(element: &Element, id: u64, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = text_attribute(element, id, name)?;
    raw.parse().map_err(|err: T::Err| Error::InvalidAttribute {
        kind: element.kind.to_string(),
        id: Some(id),
        attribute: name.to_string(),
        value: raw.clone(),
        reason: err.to_string(),
    })
}

pub struct ShapedElements<I> {
    elements: I,
    options: ShapeOptions,
    validate: bool,
}

impl<I> ShapedElements<I> {
    pub fn new(elements: I, options: ShapeOptions, validate: bool) -> ShapedElements<I> {
        ShapedElements {
            elements,
            options,
            validate,
        }
    }

    fn shape(&self, element: Element) -> Result<Option<ShapedElement>> {
        let shaped = shape_element(&element, &self.options)?;
        if self.validate {
            if let Some(bundle) = &shaped {
                validate_element(bundle)?;
            }
        }
        Ok(shaped)
    }
}

impl<I: Iterator<Item = Result<Element>>> Iterator for ShapedElements<I> {
    type Item = Result<ShapedElement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let shaped = self.elements.next()?.and_then(|element| self.shape(element));
            match shaped {
                Ok(Some(shaped)) => return Some(Ok(shaped)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
