use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("the input {0:?} does not exist")]
    InputNotFound(PathBuf),
    #[error("cannot unpack archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("unexpected manifest layout: {0}")]
    ManifestShape(String),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("bad escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("the quiz needs a title")]
    MissingTitle,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("QTI conversion failed: {0}")]
    Converter(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
