use crate::libqti::error::{Error, Result};
use log::debug;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::{Path, PathBuf};

/// Rewrites `input` into `output` with every tag and attribute name reduced to its
/// local part, so later lookups can match on bare names like `item` or `href`.
pub fn strip_namespaces(input: &Path, output: &Path) -> Result<PathBuf> {
    let xml = fs::read_to_string(input)?;
    let stripped = strip_namespaces_str(&xml)?;
    fs::write(output, stripped)?;
    debug!("[Stripper] {:?} -> {:?}", input, output);
    Ok(output.to_path_buf())
}

pub fn strip_namespaces_str(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                seen_root = true;
                writer.write_event(Event::Start(local_start(&e)?))?;
            }
            Event::Empty(e) => {
                seen_root = true;
                writer.write_event(Event::Empty(local_start(&e)?))?;
            }
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::Malformed("closing tag without an opening one".into()))?;
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                writer.write_event(Event::End(BytesEnd::new(local)))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if depth != 0 {
        return Err(Error::Malformed(format!("{depth} element(s) left unclosed")));
    }
    if !seen_root {
        return Err(Error::Malformed("no root element".into()));
    }
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn local_start(e: &BytesStart) -> Result<BytesStart<'static>> {
    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut stripped = BytesStart::new(local);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if is_namespace_declaration(attr.key.as_ref()) {
            continue;
        }
        let key = attr.key.local_name().as_ref().to_vec();
        stripped.push_attribute(Attribute {
            key: QName(&key),
            value: attr.value,
        });
    }
    Ok(stripped)
}

fn is_namespace_declaration(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="m1" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1" xmlns:lom="http://ltsc.ieee.org/xsd/imsccv1p1/LOM/resource" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://example.org/a.xsd">
  <lom:metadata lom:kind="quiz">Title &amp; more</lom:metadata>
  <resources>
    <resource identifier="r1" type="imsqti_xmlv1p2">
      <file href="r1/r1.xml"/>
    </resource>
  </resources>
</manifest>"#;

    #[test]
    fn drops_prefixes_and_declarations() {
        let stripped = strip_namespaces_str(MANIFEST).unwrap();
        assert!(!stripped.contains("xmlns"));
        assert!(!stripped.contains("lom:"));
        assert!(!stripped.contains("xsi:"));
        assert!(stripped.contains(r#"<metadata kind="quiz">Title &amp; more</metadata>"#));
        assert!(stripped.contains(r#"schemaLocation="http://example.org/a.xsd""#));
        assert!(stripped.contains(r#"<file href="r1/r1.xml"/>"#));
    }

    #[test]
    fn keeps_order_and_text() {
        let stripped = strip_namespaces_str("<a:root xmlns:a=\"urn:x\"><a:one>1</a:one>\n<two>2</two></a:root>").unwrap();
        assert_eq!(stripped, "<root><one>1</one>\n<two>2</two></root>");
    }

    #[test]
    fn stripping_is_idempotent() {
        let once = strip_namespaces_str(MANIFEST).unwrap();
        let twice = strip_namespaces_str(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(strip_namespaces_str("<root><open></root>").is_err());
        assert!(strip_namespaces_str("<root><open>").is_err());
        assert!(strip_namespaces_str("just text").is_err());
    }

    #[test]
    fn strips_file_to_file() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.xml");
        let output = tmp.path().join("out.xml");
        fs::write(&input, MANIFEST).unwrap();

        let written = strip_namespaces(&input, &output).unwrap();
        assert_eq!(written, output);
        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("<resource identifier=\"r1\""));
    }
}
