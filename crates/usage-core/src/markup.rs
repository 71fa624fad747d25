//! Tab-indented nested markup writer and the matching reader
//!
//! Leaves render on one line as `<tag>text</tag>`; elements with children
//! put each child on its own line, one tab deeper than the parent. Text is
//! escaped for `&`, `<` and `>`.

use crate::error::{Error, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A markup element: either a text leaf or a list of children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element without text or children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Create a text leaf
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Append a child, returning self for chaining
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this element renders on a single line
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Render an element tree as tab-indented markup
pub fn serialize(root: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    let indent = "\t".repeat(depth);
    if element.is_leaf() {
        out.push_str(&format!(
            "{indent}<{tag}>{text}</{tag}>\n",
            tag = element.tag,
            text = partial_escape(&element.text)
        ));
        return;
    }

    out.push_str(&format!("{}<{}>\n", indent, element.tag));
    for child in &element.children {
        write_element(out, child, depth + 1);
    }
    out.push_str(&format!("{}</{}>\n", indent, element.tag));
}

/// Read markup produced by [`serialize`] back into an element tree
///
/// Whitespace between elements is insignificant and leaf text is trimmed.
pub fn parse_markup(content: &str) -> Result<Element> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() {
                    return Err(malformed(offset, "unexpected content after root element"));
                }
                open.push(Element::new(tag_name(e)));
            }
            Ok(Event::Empty(ref e)) => {
                attach(&mut open, &mut root, Element::new(tag_name(e)), offset)?;
            }
            Ok(Event::End(_)) => {
                let element = open
                    .pop()
                    .ok_or_else(|| malformed(offset, "closing tag without an open element"))?;
                attach(&mut open, &mut root, element, offset)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| malformed(offset, err.to_string()))?;
                match open.last_mut() {
                    Some(parent) => parent.text.push_str(&text),
                    None => return Err(malformed(offset, "text outside the root element")),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(malformed(reader.buffer_position() as usize, err.to_string()))
            }
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(malformed(
            content.len(),
            format!("unclosed element <{}>", unclosed.tag),
        ));
    }
    root.ok_or_else(|| malformed(0, "no root element"))
}

fn tag_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn malformed(offset: usize, message: impl Into<String>) -> Error {
    Error::MalformedMarkup {
        offset,
        message: message.into(),
    }
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    offset: usize,
) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed(offset, "unexpected content after root element")),
    }
    Ok(())
}
