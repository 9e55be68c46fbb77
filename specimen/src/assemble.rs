//! Assembling a composite image from per-glyph SVG documents.
//!
//! Every placed glyph is copied out of its source document into a fresh
//! output tree:
//!
//! ```text
//! <svg viewBox="0 0 W H">
//!   <defs>  definitions of every source document used, copied once each
//!   <g transform="translate(-x0, -y0)">  moves the content to the origin
//!     <g transform="translate(x, y)">  one per glyph
//! ```
//!
//! Ids from source document `N` are prefixed with `svg[N].` so documents
//! never collide.

use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    path::Path,
    str::FromStr,
};

use kurbo::{Rect, Vec2};
use read_fonts::FontRef;

use crate::{
    bbox::{self, bounding_box},
    doc_index::{DocumentMatch, SvgDocumentIndex},
    shape::{GlyphPlacement, ShapedRun, Shaper},
    svg::Element,
    transform::{format_number, format_translate},
    Error,
};

const EPSILON: f64 = 1e-9;

/// A target width:height ratio for the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(ratio: f64) -> Result<Self, Error> {
        if ratio.is_finite() && ratio > 0.0 {
            Ok(AspectRatio(ratio))
        } else {
            Err(Error::InvalidAspectRatio(ratio.to_string()))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    /// Accepts `W:H` (as in `16:9`) or a plain ratio (`1.5`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAspectRatio(s.to_owned());
        let ratio = match s.split_once(':') {
            Some((w, h)) => {
                let w: f64 = w.trim().parse().map_err(|_| invalid())?;
                let h: f64 = h.trim().parse().map_err(|_| invalid())?;
                w / h
            }
            None => s.trim().parse().map_err(|_| invalid())?,
        };
        AspectRatio::new(ratio).map_err(|_| invalid())
    }
}

/// The prefix applied to ids copied from document `index`.
pub fn id_prefix(index: usize) -> String {
    format!("svg[{index}].")
}

/// Builds the output document one glyph at a time.
pub struct Assembler<'a> {
    index: SvgDocumentIndex<'a>,
    /// Parsed source documents by document index; never modified.
    sources: HashMap<usize, Element>,
    /// Document indices whose definitions have been copied.
    copied_defs: HashSet<usize>,
    defs: Element,
    glyphs: Element,
    placed: usize,
    skipped: usize,
}

impl<'a> Assembler<'a> {
    pub fn new(font: &FontRef<'a>) -> Result<Self, Error> {
        Ok(Self {
            index: SvgDocumentIndex::new(font)?,
            sources: HashMap::new(),
            copied_defs: HashSet::new(),
            defs: Element::new("defs"),
            glyphs: Element::new("g"),
            placed: 0,
            skipped: 0,
        })
    }

    pub fn units_per_em(&self) -> u16 {
        self.index.units_per_em()
    }

    /// Place every glyph of a run.
    pub fn place_run(&mut self, run: &ShapedRun) -> Result<(), Error> {
        for placement in &run.placements {
            self.place(placement)?;
        }
        Ok(())
    }

    /// Copy one glyph into the output at its position.
    ///
    /// Returns `false` if the glyph was skipped because it is not covered
    /// by exactly one SVG document.
    pub fn place(&mut self, placement: &GlyphPlacement) -> Result<bool, Error> {
        let gid = placement.glyph_id;
        let range = match self.index.lookup(gid) {
            DocumentMatch::One(range) => range,
            DocumentMatch::None => {
                log::warn!("unable to find exactly one svg doc for {gid}, got 0");
                self.skipped += 1;
                return Ok(false);
            }
            DocumentMatch::Many(count) => {
                log::warn!("unable to find exactly one svg doc for {gid}, got {count}");
                self.skipped += 1;
                return Ok(false);
            }
        };
        let prefix = id_prefix(range.index);
        let source: &Element = match self.sources.entry(range.index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Element::parse(range.text()?)?),
        };

        let new_defs = if self.copied_defs.insert(range.index) {
            let mut defs = source_defs(source)?;
            for def in &mut defs {
                def.prefix_ids(&prefix);
            }
            defs
        } else {
            Vec::new()
        };

        let glyph_label = format!("glyph{}", gid.to_u32());
        let mut glyph = source.detach(source.find_one(&format!("g#{glyph_label}"), |el| {
            el.name == "g" && el.id() == Some(glyph_label.as_str())
        })?);
        glyph.remove_attr("id");
        if glyph.attr("transform").is_some() {
            return Err(Error::TransformAlreadySet(gid));
        }
        glyph.set_attr(
            "transform",
            format_translate(Vec2::new(placement.x as f64, placement.y as f64)),
        );
        glyph.prefix_ids(&prefix);

        log::debug!(
            "{gid} from document {} at ({}, {})",
            range.index,
            placement.x,
            placement.y
        );
        for def in new_defs {
            self.defs.push(def);
        }
        self.glyphs.push(glyph);
        self.placed += 1;
        Ok(true)
    }

    /// Size the canvas and produce the finished document.
    pub fn finish(self, aspect_ratio: Option<AspectRatio>) -> Result<Specimen, Error> {
        if self.placed == 0 {
            return Err(Error::NothingPlaced);
        }
        let units_per_em = self.units_per_em();
        let mut root = Element::svg_root()
            .with_child(self.defs)
            .with_child(self.glyphs);

        let ids = root.id_map();
        let references = root.references();
        if let Some(id) = bbox::unresolved(references.iter().map(String::as_str), &ids) {
            return Err(Error::UnresolvedReference(id.to_owned()));
        }

        let ink = bounding_box(&root)?.ok_or(Error::NothingPlaced)?;
        let canvas = match aspect_ratio {
            Some(ratio) => pad_to_aspect_ratio(ink, ratio),
            None => ink,
        };
        log::debug!("ink bounds {ink:?}, canvas {canvas:?}");
        if !(canvas.is_finite() && ink.is_finite()) {
            return Err(Error::UnexpectedStructure(format!(
                "canvas {canvas:?} is not finite"
            )));
        }

        // move the canvas origin to (0, 0)
        let offset = -canvas.origin().to_vec2();
        let positioning = root
            .elements_mut()
            .nth(1)
            .ok_or_else(|| Error::UnexpectedStructure("no positioning group".into()))?;
        positioning.set_attr("transform", format_translate(offset));
        root.set_attr(
            "viewBox",
            format!(
                "0 0 {} {}",
                format_number(canvas.width()),
                format_number(canvas.height())
            ),
        );

        let moved = bounding_box(&root)?.ok_or(Error::NothingPlaced)?;
        let expected = ink.origin() + offset;
        if (moved.x0 - expected.x).abs() > EPSILON || (moved.y0 - expected.y).abs() > EPSILON {
            return Err(Error::UnexpectedStructure(format!(
                "content starts at {:?} after normalizing, expected {expected:?}",
                moved.origin()
            )));
        }

        Ok(Specimen {
            document: root,
            canvas: Rect::from_origin_size((0.0, 0.0), canvas.size()),
            units_per_em,
            placed: self.placed,
            skipped: self.skipped,
        })
    }
}

/// The `<defs>` children of a source document.
///
/// A document without a definitions section has nothing to share; more
/// than one is not the shape we expect.
fn source_defs(source: &Element) -> Result<Vec<Element>, Error> {
    let mut defs = source.descendants().filter(|el| el.name == "defs");
    match (defs.next(), defs.next()) {
        (None, _) => Ok(Vec::new()),
        (Some(defs), None) => Ok(defs.elements().map(|def| source.detach(def)).collect()),
        (Some(_), Some(_)) => Err(Error::UnexpectedStructure(
            "more than one defs".to_owned(),
        )),
    }
}

/// Widen `bounds` symmetrically so that width / height reaches `ratio`.
///
/// Bounds that are already at least as wide, or have no height, are
/// returned unchanged.
pub fn pad_to_aspect_ratio(bounds: Rect, ratio: AspectRatio) -> Rect {
    let (width, height) = (bounds.width(), bounds.height());
    if height <= 0.0 {
        return bounds;
    }
    if width / height >= ratio.get() {
        return bounds;
    }
    // w * R / (w / h), without dividing by a zero width
    let padded_width = height * ratio.get();
    let pad = (padded_width - width) / 2.0;
    Rect::new(bounds.x0 - pad, bounds.y0, bounds.x1 + pad, bounds.y1)
}

/// A finished composite image.
#[derive(Clone, Debug)]
pub struct Specimen {
    document: Element,
    canvas: Rect,
    units_per_em: u16,
    placed: usize,
    skipped: usize,
}

impl Specimen {
    pub fn document(&self) -> &Element {
        &self.document
    }

    /// The canvas, always starting at the origin.
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Number of glyphs placed.
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Number of glyphs skipped for lack of a unique document.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn to_svg_string(&self) -> String {
        self.document.to_pretty_string()
    }
}

/// Assemble the glyphs of an already shaped run.
pub fn assemble(
    font_data: &[u8],
    run: &ShapedRun,
    aspect_ratio: Option<AspectRatio>,
) -> Result<Specimen, Error> {
    let font = FontRef::new(font_data)?;
    let mut assembler = Assembler::new(&font)?;
    assembler.place_run(run)?;
    assembler.finish(aspect_ratio)
}

/// Shape `text` with `font_path` and assemble the result.
pub fn assemble_text(
    shaper: &impl Shaper,
    font_path: &Path,
    text: &str,
    aspect_ratio: Option<AspectRatio>,
) -> Result<Specimen, Error> {
    let font_data = std::fs::read(font_path).map_err(|e| Error::io(font_path, e))?;
    let run = shaper.shape(font_path, text)?;
    log::info!(
        "{} glyphs, advance {} for {text:?}",
        run.len(),
        run.total_advance
    );
    assemble(&font_data, &run, aspect_ratio)
}
