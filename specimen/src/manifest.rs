//! Batches of specimens described in a JSON file.
//!
//! ```json
//! [
//!   { "kind": "assemble", "font": "ofl/arefruqaaink/ArefRuqaaInk-Regular.ttf",
//!     "text": "﴾صباغ﴿", "output": "aref.svg", "aspect_ratio": 2.0 },
//!   { "kind": "colorize", "font": "ofl/lobster/Lobster-Regular.ttf",
//!     "text": "Am I not colorful", "output": "am-i-not-colorful.svg" }
//! ]
//! ```
//!
//! Relative font paths are resolved against a font root; relative outputs
//! against the current directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    assemble::{assemble_text, AspectRatio},
    colorize::{colorize_text, Renderer},
    shape::Shaper,
    Error,
};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    /// Copy glyph artwork from the font's SVG table.
    Assemble {
        font: PathBuf,
        text: String,
        output: PathBuf,
        #[serde(default)]
        aspect_ratio: Option<f64>,
    },
    /// Recolor an `hb-view` rendering.
    Colorize {
        font: PathBuf,
        text: String,
        output: PathBuf,
    },
}

impl Entry {
    pub fn font(&self) -> &Path {
        match self {
            Entry::Assemble { font, .. } | Entry::Colorize { font, .. } => font,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Entry::Assemble { text, .. } | Entry::Colorize { text, .. } => text,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            Entry::Assemble { output, .. } | Entry::Colorize { output, .. } => output,
        }
    }

    pub fn aspect_ratio(&self) -> Result<Option<AspectRatio>, Error> {
        match self {
            Entry::Assemble {
                aspect_ratio: Some(ratio),
                ..
            } => AspectRatio::new(*ratio).map(Some),
            _ => Ok(None),
        }
    }

    fn resolve(&mut self, font_root: &Path) {
        let font = match self {
            Entry::Assemble { font, .. } | Entry::Colorize { font, .. } => font,
        };
        if font.is_relative() {
            *font = font_root.join(&*font);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    pub entries: Vec<Entry>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, Error> {
        let entries = serde_json::from_str(json)?;
        Ok(Manifest { entries })
    }

    /// Load a manifest, resolving relative font paths against `font_root`,
    /// or the manifest's own directory if that is `None`.
    pub fn load(path: &Path, font_root: Option<&Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut manifest = Manifest::parse(&json)?;
        let font_root = font_root
            .map(Path::to_path_buf)
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        for entry in &mut manifest.entries {
            entry.resolve(&font_root);
        }
        // validate up front so a bad entry fails before any work is done
        for entry in &manifest.entries {
            entry.aspect_ratio()?;
        }
        Ok(manifest)
    }
}

/// Build the specimen `entry` describes and write it to its output.
///
/// Nothing is written if building fails.
pub fn build_entry(
    entry: &Entry,
    shaper: &impl Shaper,
    renderer: &impl Renderer,
) -> Result<(), Error> {
    let svg = match entry {
        Entry::Assemble { font, text, .. } => {
            let specimen = assemble_text(shaper, font, text, entry.aspect_ratio()?)?;
            if specimen.skipped() > 0 {
                log::warn!("{} glyphs had no artwork", specimen.skipped());
            }
            specimen.to_svg_string()
        }
        Entry::Colorize { font, text, .. } => colorize_text(renderer, font, text)?,
    };
    let output = entry.output();
    std::fs::write(output, svg).map_err(|e| Error::io(output, e))?;
    log::info!(
        "Wrote {} with {} from {}",
        output.display(),
        entry.text(),
        entry.font().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    static SAMPLE: &str = r#"[
        {"kind": "assemble", "font": "ofl/aref.ttf", "text": "abc", "output": "aref.svg"},
        {"kind": "assemble", "font": "/abs/b.ttf", "text": "b", "output": "b.svg", "aspect_ratio": 1.5},
        {"kind": "colorize", "font": "ofl/lobster.ttf", "text": "Am I", "output": "c.svg"}
    ]"#;

    #[test]
    fn parse_entries() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.entries.len(), 3);
        assert_eq!(
            manifest.entries[0],
            Entry::Assemble {
                font: "ofl/aref.ttf".into(),
                text: "abc".into(),
                output: "aref.svg".into(),
                aspect_ratio: None,
            }
        );
        assert_eq!(
            manifest.entries[1].aspect_ratio().unwrap(),
            Some(AspectRatio::new(1.5).unwrap())
        );
        assert!(matches!(manifest.entries[2], Entry::Colorize { .. }));
        assert_eq!(manifest.entries[2].text(), "Am I");
    }

    #[test]
    fn rejects_unknown() {
        assert!(matches!(
            Manifest::parse(r#"[{"kind": "explode", "font": "a", "text": "b", "output": "c"}]"#),
            Err(Error::Manifest(_))
        ));
        assert!(matches!(
            Manifest::parse(r#"[{"kind": "colorize", "font": "a", "text": "b"}]"#),
            Err(Error::Manifest(_))
        ));
    }

    #[test]
    fn load_resolves_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specimens.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SAMPLE.as_bytes())
            .unwrap();

        let manifest = Manifest::load(&path, None).unwrap();
        assert_eq!(manifest.entries[0].font(), dir.path().join("ofl/aref.ttf"));
        assert_eq!(manifest.entries[1].font(), Path::new("/abs/b.ttf"));
        // outputs are left alone
        assert_eq!(manifest.entries[0].output(), Path::new("aref.svg"));

        let manifest = Manifest::load(&path, Some(Path::new("/fonts"))).unwrap();
        assert_eq!(manifest.entries[2].font(), Path::new("/fonts/ofl/lobster.ttf"));
    }

    #[test]
    fn load_validates_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"[{"kind": "assemble", "font": "a", "text": "b", "output": "c", "aspect_ratio": -1}]"#,
        )
        .unwrap();
        assert!(matches!(
            Manifest::load(&path, None),
            Err(Error::InvalidAspectRatio(_))
        ));
    }
}
