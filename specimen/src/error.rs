//! Errors produced while building a specimen.

use std::path::PathBuf;

use read_fonts::{
    types::{GlyphId, Tag},
    ReadError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading font data: {0}")]
    Read(#[from] ReadError),

    #[error("Font has no '{0}' table")]
    MissingTable(Tag),

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Tool {
        program: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Malformed shaper output: {0}")]
    MalformedShaperOutput(String),

    #[error("Malformed glyph token '{0}'")]
    MalformedToken(String),

    #[error("Vertical layout is not supported (glyph '{0}')")]
    VerticalLayout(String),

    #[error("Invalid SVG: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Unexpected SVG structure: {0}")]
    UnexpectedStructure(String),

    #[error("Invalid transform '{0}'")]
    InvalidTransform(String),

    #[error("Invalid path data '{d}': {reason}")]
    InvalidPath { d: String, reason: String },

    #[error("Invalid number '{value}' for attribute '{attribute}'")]
    InvalidNumber { attribute: String, value: String },

    #[error("Glyph {0} already has a transform")]
    TransformAlreadySet(GlyphId),

    #[error("Reference to '{0}' does not resolve")]
    UnresolvedReference(String),

    #[error("References nested more than {0} deep")]
    NestingTooDeep(usize),

    #[error("More than {0} elements visited while measuring")]
    TooManyElements(usize),

    #[error("SVG document {0} is compressed")]
    CompressedDocument(usize),

    #[error("SVG document {0} is not valid UTF-8")]
    NotUtf8(usize),

    #[error("No glyph could be placed")]
    NothingPlaced,

    #[error("Invalid aspect ratio '{0}'")]
    InvalidAspectRatio(String),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
