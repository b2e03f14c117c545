//! XML to `RawTree` conversion
//!
//! Produces the dictionary shape the ISS feeds are usually consumed in:
//!
//! - the document is `{root_tag: value}`
//! - attributes become `@name` keys, text next to children becomes `#text`
//! - a text-only element is a string, an empty element is null
//! - repeated sibling tags collapse into a list in document order

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::markup::{RawTree, RecordParser};

const TEXT_KEY: &str = "#text";

/// quick-xml backed `RecordParser`
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlTreeParser;

impl XmlTreeParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for XmlTreeParser {
    fn parse(&self, raw: &[u8]) -> Result<RawTree, ParseError> {
        let mut reader = Reader::from_reader(raw);
        reader.config_mut().trim_text(true);

        // Bottom frame collects the root element.
        let mut stack = vec![Frame::new(String::new())];
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ParseError::Markup(format!("at byte {}: {}", reader.buffer_position(), e))
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(Frame::open(&start)?);
                }
                Event::Empty(start) => {
                    let frame = Frame::open(&start)?;
                    attach(&mut stack, frame)?;
                }
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| ParseError::Markup("unbalanced end tag".to_string()))?;
                    attach(&mut stack, frame)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| ParseError::Markup(e.to_string()))?;
                    push_text(&mut stack, &text);
                }
                Event::CData(cdata) => {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    push_text(&mut stack, &text);
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes
                _ => {}
            }
            buf.clear();
        }

        if stack.len() != 1 {
            let open = stack.last().map(|f| f.name.clone()).unwrap_or_default();
            return Err(ParseError::Markup(format!(
                "unexpected end of document inside <{}>",
                open
            )));
        }

        let document = stack.pop().map(|f| f.children).unwrap_or_default();
        if document.is_empty() {
            return Err(ParseError::Markup("document has no root element".to_string()));
        }
        Ok(Value::Object(document))
    }
}

/// An element being assembled.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = decode_name(start.name().as_ref())?;
        let mut frame = Frame::new(name);

        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Markup(e.to_string()))?;
            let key = format!("@{}", decode_name(attr.key.as_ref())?);
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Markup(e.to_string()))?;
            frame.children.insert(key, Value::String(value.into_owned()));
        }

        Ok(frame)
    }

    fn into_value(self) -> Value {
        let Frame {
            mut children, text, ..
        } = self;

        if children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            if !text.is_empty() {
                children.insert(TEXT_KEY.to_string(), Value::String(text));
            }
            Value::Object(children)
        }
    }
}

fn decode_name(raw: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| ParseError::Markup(format!("invalid UTF-8 in name: {}", e)))
}

fn push_text(stack: &mut [Frame], text: &str) {
    if let Some(frame) = stack.last_mut() {
        frame.text.push_str(text);
    }
}

/// Close `frame` and insert it into its parent, collapsing repeated tags.
fn attach(stack: &mut [Frame], frame: Frame) -> Result<(), ParseError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| ParseError::Markup("unbalanced end tag".to_string()))?;
    let key = frame.name.clone();
    let value = frame.into_value();

    match parent.children.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(key, value);
        }
    }
    Ok(())
}
