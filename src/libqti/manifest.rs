use crate::libqti::dom::Element;
use crate::libqti::error::{Error, Result};
use crate::libqti::stripper::strip_namespaces;
use log::debug;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

pub const MANIFEST_FILE: &str = "imsmanifest.xml";

/// Relative paths of the two QTI files a quiz export is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHrefs {
    pub header: String,
    pub questions: String,
}

/// Reads `imsmanifest.xml` and returns the `href` of the first two resources.
///
/// The first resource is taken as the quiz header and the second as the
/// question bank. Nothing checks their content, so a manifest that lists them
/// the other way round is read the other way round.
pub fn resolve_resources(manifest: &Path) -> Result<ResourceHrefs> {
    let scratch = NamedTempFile::new()?;
    strip_namespaces(manifest, scratch.path())?;
    debug!("[Manifest] Stripped manifest:\n{}", fs::read_to_string(scratch.path())?);
    let root = Element::parse_file(scratch.path())?;

    let resources: Vec<&Element> = root.find_all("resource").collect();
    if resources.len() < 2 {
        return Err(Error::ManifestShape(format!(
            "expected at least two resources, found {}",
            resources.len()
        )));
    }

    let hrefs = ResourceHrefs {
        header: file_href(resources[0])?,
        questions: file_href(resources[1])?,
    };
    debug!("[Manifest] Resources: {:?}", hrefs);
    Ok(hrefs)
}

fn file_href(resource: &Element) -> Result<String> {
    let ident = resource.attr("identifier").unwrap_or("?");
    let file = resource
        .child("file")
        .ok_or_else(|| Error::ManifestShape(format!("resource {ident} has no <file>")))?;
    file.attr("href")
        .map(str::to_string)
        .ok_or_else(|| Error::ManifestShape(format!("<file> of resource {ident} has no href")))
}
