pub mod cleaner;
pub mod convert;
pub mod csv_dump;
pub mod dom;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod question;
pub mod stripper;
pub mod writer;
