use std::io::BufRead;
use std::iter::FusedIterator;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::osm::{Attributes, Child, ChildKind, Element, ElementKind};
use crate::errors::{Error, Result};

struct Capture {
    element: Element,
    depth: usize,
}

/// Pull iterator over the top-level elements of an .osm stream whose kind is in the
/// filter, each with its direct `tag`/`nd` children. The first parse error ends it.
pub struct OsmElements<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kinds: Vec<ElementKind>,
    depth: usize,
    capture: Option<Capture>,
    finished: bool,
}

impl<R: BufRead> OsmElements<R> {
    pub fn new(source: R, kinds: &[ElementKind]) -> OsmElements<R> {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        OsmElements {
            reader,
            buf: Vec::new(),
            kinds: kinds.to_vec(),
            depth: 0,
            capture: None,
            finished: false,
        }
    }

    fn parse_error(position: usize, message: impl Into<String>) -> Error {
        Error::StructuralParse {
            position,
            message: message.into(),
        }
    }

    fn next_element(&mut self) -> Result<Option<Element>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => {
                    return Err(Self::parse_error(self.reader.buffer_position(), err.to_string()))
                }
            };

            match event {
                Event::Start(start) => {
                    self.depth += 1;
                    match &mut self.capture {
                        Some(capture) => {
                            if self.depth == capture.depth + 1 {
                                push_child(&mut capture.element, &start)
                                    .map_err(|msg| Self::parse_error(self.reader.buffer_position(), msg))?;
                            }
                        }
                        None => {
                            if let Some(element) = open_element(&self.kinds, &start)
                                .map_err(|msg| Self::parse_error(self.reader.buffer_position(), msg))?
                            {
                                self.capture = Some(Capture {
                                    element,
                                    depth: self.depth,
                                });
                            }
                        }
                    }
                }
                Event::Empty(empty) => match &mut self.capture {
                    Some(capture) => {
                        if self.depth == capture.depth {
                            push_child(&mut capture.element, &empty)
                                .map_err(|msg| Self::parse_error(self.reader.buffer_position(), msg))?;
                        }
                    }
                    None => {
                        if let Some(element) = open_element(&self.kinds, &empty)
                            .map_err(|msg| Self::parse_error(self.reader.buffer_position(), msg))?
                        {
                            return Ok(Some(element));
                        }
                    }
                },
                Event::End(_) => {
                    let closes_capture = matches!(&self.capture, Some(capture) if capture.depth == self.depth);
                    self.depth = self.depth.saturating_sub(1);
                    if closes_capture {
                        return Ok(self.capture.take().map(|capture| capture.element));
                    }
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(Self::parse_error(
                            self.reader.buffer_position(),
                            format!("unexpected end of input with {} unclosed element(s)", self.depth),
                        ));
                    }
                    return Ok(None);
                }
                // Declarations, text, comments and the like carry nothing we keep.
                _ => (),
            }
        }
    }

    #[cfg(test)]
    fn scratch_capacity(&self) -> usize {
        self.buf.capacity()
    }
}

fn read_attributes(el: &BytesStart) -> std::result::Result<Attributes, String> {
    let mut attributes = Attributes::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res.map_err(|err| err.to_string())?;
        let key = str::from_utf8(attribute.key.as_ref()).map_err(|err| err.to_string())?;
        let value = attribute.unescape_value().map_err(|err| err.to_string())?;
        attributes.push(key.to_string(), value.into_owned());
    }
    Ok(attributes)
}

fn open_element(kinds: &[ElementKind], el: &BytesStart) -> std::result::Result<Option<Element>, String> {
    match ElementKind::from_name(el.name().as_ref()) {
        Some(kind) if kinds.contains(&kind) => Ok(Some(Element::new(kind, read_attributes(el)?))),
        _ => Ok(None),
    }
}

fn push_child(element: &mut Element, el: &BytesStart) -> std::result::Result<(), String> {
    if let Some(kind) = ChildKind::from_name(el.name().as_ref()) {
        element.children.push(Child {
            kind,
            attributes: read_attributes(el)?,
        });
    }
    Ok(())
}

impl<R: BufRead> Iterator for OsmElements<R> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for OsmElements<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES_AND_WAYS: [ElementKind; 2] = [ElementKind::Node, ElementKind::Way];

    fn walk(xml: &str) -> Vec<Element> {
        OsmElements::new(xml.as_bytes(), &NODES_AND_WAYS)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn yields_filtered_elements_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="12.8" minlon="77.4" maxlat="13.1" maxlon="77.8"/>
  <node id="1" lat="12.9" lon="77.5"/>
  <relation id="9"><member type="way" ref="5" role="outer"/><tag k="type" v="multipolygon"/></relation>
  <way id="5"><nd ref="1"/><nd ref="2"/></way>
  <node id="2" lat="12.8" lon="77.6"><tag k="amenity" v="cafe"/></node>
</osm>"#;
        let elements = walk(xml);

        let seen: Vec<(ElementKind, &str)> = elements
            .iter()
            .map(|el| (el.kind, el.attributes.get("id").unwrap()))
            .collect();
        assert_eq!(
            seen,
            vec![(ElementKind::Node, "1"), (ElementKind::Way, "5"), (ElementKind::Node, "2")]
        );
        assert!(elements[0].children.is_empty());
        assert_eq!(elements[1].children_of(ChildKind::Nd).count(), 2);
        assert_eq!(elements[2].children[0].attributes.get("v"), Some("cafe"));
    }

    #[test]
    fn keeps_child_order() {
        let xml = r#"<osm><way id="7"><nd ref="30"/><tag k="highway" v="residential"/><nd ref="10"/><nd ref="20"/></way></osm>"#;
        let way = &walk(xml)[0];
        let refs: Vec<&str> = way
            .children_of(ChildKind::Nd)
            .map(|child| child.attributes.get("ref").unwrap())
            .collect();
        assert_eq!(refs, vec!["30", "10", "20"]);
    }

    #[test]
    fn unescapes_attribute_values() {
        let xml = r#"<osm><node id="1" lat="0" lon="0"><tag k="name" v="Tom &amp; Jerry&apos;s"/></node></osm>"#;
        let node = &walk(xml)[0];
        assert_eq!(node.children[0].attributes.get("v"), Some("Tom & Jerry's"));
    }

    #[test]
    fn ignores_grandchildren() {
        let xml = r#"<osm><way id="1"><nd ref="2"><tag k="nested" v="x"/></nd></way></osm>"#;
        let way = &walk(xml)[0];
        assert_eq!(way.children.len(), 1);
        assert_eq!(way.children[0].kind, ChildKind::Nd);
    }

    #[test]
    fn skipping_relations_does_not_accumulate() {
        let relation = r#"<relation id="3"><member type="node" ref="1" role=""/><tag k="route" v="bus"/></relation>"#;
        let mut xml = String::from(r#"<osm><node id="1" lat="0" lon="0"/>"#);
        for _ in 0..5_000 {
            xml.push_str(relation);
        }
        xml.push_str(r#"<way id="2"><nd ref="1"/></way></osm>"#);

        let mut walker = OsmElements::new(xml.as_bytes(), &NODES_AND_WAYS);
        assert_eq!(walker.next().unwrap().unwrap().kind, ElementKind::Node);
        assert_eq!(walker.next().unwrap().unwrap().kind, ElementKind::Way);
        assert!(walker.next().is_none());
        assert!(walker.scratch_capacity() < 256);
    }

    #[test]
    fn mismatched_end_tag_is_fatal() {
        let xml = r#"<osm><node id="1" lat="0" lon="0"></way></osm>"#;
        let mut walker = OsmElements::new(xml.as_bytes(), &NODES_AND_WAYS);
        assert!(matches!(walker.next(), Some(Err(Error::StructuralParse { .. }))));
        assert!(walker.next().is_none());
    }

    #[test]
    fn truncated_input_is_fatal() {
        let xml = r#"<osm><node id="1" lat="0" lon="0"/><way id="2"><nd ref="1"/>"#;
        let results: Vec<_> = OsmElements::new(xml.as_bytes(), &NODES_AND_WAYS).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::StructuralParse { .. })));
    }
}
