// src/utils/xml.rs

//! XML to [`RawNode`] tree parser.
//!
//! Produces the attribute-container layout the normalizer expects:
//!
//! ```text
//! <courses term="FA14">               {"courses": {
//!   <course subject="CS">                "$": {"term": "FA14"},
//!     <course_title>Intro</course_title> "course": [{
//!     <topics/>                            "$": {"subject": "CS"},
//!   </course>                              "course_title": ["Intro"],
//! </courses>                               "topics": [""]
//!                                        }]
//!                                      }}
//! ```
//!
//! Child elements are always collected into lists keyed by element name, so
//! the "one child or many" ambiguity is left for the normalizer to resolve.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AppError, Result};
use crate::models::{Fields, RawNode};

/// Key for text content of elements that also carry attributes or children.
pub const TEXT_KEY: &str = "_";

/// Deepest element nesting accepted. Roster pages nest about eight levels.
pub const MAX_DEPTH: usize = 128;

/// Parser for roster XML bodies.
#[derive(Debug, Clone)]
pub struct XmlTreeParser {
    attribute_key: String,
    text_key: String,
}

impl Default for XmlTreeParser {
    fn default() -> Self {
        Self::new("$")
    }
}

/// An element whose end tag has not been read yet.
struct Frame {
    name: String,
    attributes: Fields,
    children: IndexMap<String, Vec<RawNode>>,
    text: String,
}

impl XmlTreeParser {
    pub fn new(attribute_key: impl Into<String>) -> Self {
        Self {
            attribute_key: attribute_key.into(),
            text_key: TEXT_KEY.to_string(),
        }
    }

    /// Parse a full document. The result is a map holding the root element
    /// under its own name.
    pub fn parse(&self, xml: &str) -> Result<RawNode> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, RawNode)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    check_depth(stack.len() + 1)?;
                    stack.push(Self::open(&start)?);
                }
                Event::Empty(start) => {
                    check_depth(stack.len() + 1)?;
                    let frame = Self::open(&start)?;
                    self.close(frame, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| AppError::parse("unexpected closing tag"))?;
                    self.close(frame, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(AppError::parse(format!(
                "document ended inside <{}>",
                open.name
            )));
        }

        let (name, element) =
            root.ok_or_else(|| AppError::parse("document has no root element"))?;
        let mut document = Fields::new();
        document.insert(name, element);
        Ok(RawNode::Map(document))
    }

    fn open(start: &BytesStart<'_>) -> Result<Frame> {
        let mut attributes = Fields::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(AppError::parse)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.insert(key, RawNode::Scalar(value));
        }

        Ok(Frame {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: IndexMap::new(),
            text: String::new(),
        })
    }

    fn close(
        &self,
        frame: Frame,
        stack: &mut [Frame],
        root: &mut Option<(String, RawNode)>,
    ) -> Result<()> {
        let name = frame.name.clone();
        let element = self.finish(frame);

        match stack.last_mut() {
            Some(parent) => parent.children.entry(name).or_default().push(element),
            None if root.is_none() => *root = Some((name, element)),
            None => return Err(AppError::parse("multiple root elements")),
        }
        Ok(())
    }

    fn finish(&self, frame: Frame) -> RawNode {
        let text = frame.text.trim();

        if frame.attributes.is_empty() && frame.children.is_empty() {
            return RawNode::Scalar(text.to_string());
        }

        let mut fields = Fields::new();
        if !frame.attributes.is_empty() {
            fields.insert(self.attribute_key.clone(), RawNode::Map(frame.attributes));
        }
        if !text.is_empty() {
            fields.insert(self.text_key.clone(), RawNode::Scalar(text.to_string()));
        }
        for (name, elements) in frame.children {
            fields.insert(name, RawNode::List(elements));
        }
        RawNode::Map(fields)
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(AppError::parse(format!(
            "nesting too deep (more than {MAX_DEPTH} levels)"
        )));
    }
    Ok(())
}
