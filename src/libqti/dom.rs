use crate::libqti::error::{Error, Result};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

/// An owned XML element. Names are matched verbatim, so documents should go
/// through the namespace stripper first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn parse_file(path: &Path) -> Result<Element> {
        let xml = fs::read_to_string(path)?;
        Self::parse_str(&xml)
    }

    pub fn parse_str(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Self::open(&e)?),
                Event::Empty(e) => {
                    let element = Self::open(&e)?;
                    if let Some(root) = Self::close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Malformed("closing tag without an opening one".into()))?;
                    if let Some(root) = Self::close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::Text(t) => {
                    let raw = String::from_utf8_lossy(&t);
                    Self::push_text(&mut stack, &unescape(&raw)?);
                }
                Event::GeneralRef(r) => {
                    let reference = format!("&{};", String::from_utf8_lossy(&r));
                    Self::push_text(&mut stack, &unescape(&reference)?);
                }
                Event::CData(c) => Self::push_text(&mut stack, &String::from_utf8_lossy(&c)),
                Event::Eof => break,
                _ => {}
            }
        }

        match stack.len() {
            0 => Err(Error::Malformed("no root element".into())),
            n => Err(Error::Malformed(format!("{n} element(s) left unclosed"))),
        }
    }

    fn open(e: &BytesStart) -> Result<Element> {
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = unescape(&String::from_utf8_lossy(&attr.value))?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }

    /// Attaches a finished element to its parent, handing it back if it was the root.
    fn close(stack: &mut [Element], element: Element) -> Option<Element> {
        match stack.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                None
            }
            None => Some(element),
        }
    }

    fn push_text(stack: &mut [Element], text: &str) {
        if let Some(current) = stack.last_mut() {
            if current.children.is_empty() {
                current.text.get_or_insert_with(String::new).push_str(text);
            }
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant called `name`, in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |e| e.name == name)
    }

    /// Every element below this one, pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// This element followed by its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(self).chain(self.descendants())
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<root id="r">
  <a n="1"><b>first b</b></a>
  <b>second b</b>
  <c><![CDATA[<p>raw</p>]]></c>
  <d>&lt;p&gt;Tom &amp; Jerry&lt;/p&gt;</d>
  <e/>
</root>"#;

    #[test]
    fn builds_tree() {
        let root = Element::parse_str(DOC).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.attr("id"), Some("r"));
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let root = Element::parse_str(DOC).unwrap();
        let names: Vec<_> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "b", "c", "d", "e"]);
        assert_eq!(root.iter().count(), 7);
    }

    #[test]
    fn find_and_child_differ() {
        let root = Element::parse_str(DOC).unwrap();
        assert_eq!(root.find("b").and_then(|b| b.text()), Some("first b"));
        assert_eq!(root.child("b").and_then(|b| b.text()), Some("second b"));
        assert_eq!(root.find_all("b").count(), 2);
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn text_is_unescaped() {
        let root = Element::parse_str(DOC).unwrap();
        assert_eq!(root.child("c").and_then(|c| c.text()), Some("<p>raw</p>"));
        assert_eq!(root.child("d").and_then(|d| d.text()), Some("<p>Tom & Jerry</p>"));
        assert_eq!(root.child("e").and_then(|e| e.text()), None);
    }

    #[test]
    fn text_stops_at_first_child() {
        let root = Element::parse_str("<x>lead<y>inner</y>tail</x>").unwrap();
        assert_eq!(root.text(), Some("lead"));
    }

    #[test]
    fn rejects_unclosed_document() {
        assert!(matches!(Element::parse_str("<x><y></y>"), Err(Error::Malformed(_)) | Err(Error::Xml(_))));
        assert!(Element::parse_str("").is_err());
    }
}
