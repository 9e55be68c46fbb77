//! Sample images built from the glyph artwork of OpenType fonts.
//!
//! The main entry point is [`assemble_text`]: shape a string with an external
//! shaper, copy the [SVG table](https://learn.microsoft.com/en-us/typography/opentype/spec/svg)
//! document of every resulting glyph into one composite image, and size the
//! canvas to fit.
//!
//! ```no_run
//! use specimen::{assemble_text, HbShape, OutputFormat};
//!
//! let shaper = HbShape::new("hb-shape", OutputFormat::Text);
//! let specimen = assemble_text(&shaper, "ArefRuqaaInk-Regular.ttf".as_ref(), "abc", None)?;
//! std::fs::write("aref.svg", specimen.to_svg_string()).unwrap();
//! # Ok::<_, specimen::Error>(())
//! ```
//!
//! For monochrome fonts, [`colorize_text`] recolors a HarfBuzz `hb-view`
//! rendering instead.

pub mod assemble;
pub mod bbox;
pub mod colorize;
pub mod doc_index;
mod error;
pub mod manifest;
pub mod shape;
pub mod svg;
pub mod transform;

pub use assemble::{assemble, assemble_text, Assembler, AspectRatio, Specimen};
pub use colorize::{colorize, colorize_text, HbView, Renderer};
pub use doc_index::{DocumentMatch, DocumentRange, SvgDocumentIndex};
pub use error::Error;
pub use manifest::{build_entry, Entry, Manifest};
pub use shape::{GlyphPlacement, HbShape, OutputFormat, ShapedRun, Shaper};
