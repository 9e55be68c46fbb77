//! Turning text into positioned glyphs with an external shaper.
//!
//! The shaper is HarfBuzz's `hb-shape`. Its default output is a single
//! bracketed line of `|` separated glyph tokens:
//!
//! ```text
//! [5+10|12@2,-3+8]
//! ```
//!
//! Each token is `gid(@dx,dy)?+advance` in font units. Offsets are y-up, as in
//! the font; [`GlyphPlacement`] stores them y-down, as in SVG.
//!
//! Only horizontal runs are supported. HarfBuzz reports glyphs in visual
//! order, so right-to-left text accumulates correctly from the left; runs
//! with a vertical advance are rejected with [`Error::VerticalLayout`].

use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::LazyLock,
};

use read_fonts::types::GlyphId;
use regex::Regex;
use serde::Deserialize;

use crate::Error;

static GLYPH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:@(-?\d+),(-?\d+))?[+](\d+)$").unwrap());

// what hb-shape prints when a glyph has a y advance
static VERTICAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:@(-?\d+),(-?\d+))?[+](-?\d+),(-?\d+)$").unwrap());

/// A glyph positioned on the canvas, in font units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphPlacement {
    pub glyph_id: GlyphId,
    /// Absolute x: the offset plus the advance of all preceding glyphs.
    pub x: i32,
    /// Canvas (y-down) offset.
    pub y: i32,
    pub advance: i32,
}

/// The shaped glyphs for one string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapedRun {
    pub placements: Vec<GlyphPlacement>,
    /// Sum of all advances.
    pub total_advance: i32,
}

impl ShapedRun {
    /// Append a glyph given its shaper (y-up) offset.
    ///
    /// Fails if the position or the running advance overflows.
    pub fn push(
        &mut self,
        glyph_id: GlyphId,
        dx: i32,
        dy: i32,
        advance: i32,
    ) -> Result<(), Error> {
        let overflow = || {
            Error::MalformedShaperOutput(format!(
                "{glyph_id} at advance {} overflows",
                self.total_advance
            ))
        };
        let placement = GlyphPlacement {
            glyph_id,
            x: dx.checked_add(self.total_advance).ok_or_else(overflow)?,
            y: dy.checked_neg().ok_or_else(overflow)?,
            advance,
        };
        let total_advance = self
            .total_advance
            .checked_add(advance)
            .ok_or_else(overflow)?;
        log::debug!("{placement:?}");
        self.placements.push(placement);
        self.total_advance = total_advance;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// The output formats of `hb-shape` we know how to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(self, output: &str) -> Result<ShapedRun, Error> {
        match self {
            OutputFormat::Text => parse_text_output(output),
            OutputFormat::Json => parse_json_output(output),
        }
    }
}

/// Parse the default `hb-shape` text output.
pub fn parse_text_output(output: &str) -> Result<ShapedRun, Error> {
    let raw = output.trim();
    let tokens = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| Error::MalformedShaperOutput(raw.to_owned()))?;

    let mut run = ShapedRun::default();
    if tokens.is_empty() {
        return Ok(run);
    }
    for token in tokens.split('|') {
        let Some(captures) = GLYPH_TOKEN.captures(token) else {
            if VERTICAL_TOKEN.is_match(token) {
                return Err(Error::VerticalLayout(token.to_owned()));
            }
            return Err(Error::MalformedToken(token.to_owned()));
        };
        let int = |idx: usize| -> Result<i32, Error> {
            captures
                .get(idx)
                .map(|m| m.as_str().parse::<i32>())
                .transpose()
                .map(Option::unwrap_or_default)
                .map_err(|_| Error::MalformedToken(token.to_owned()))
        };
        let glyph_id = captures[1]
            .parse::<u32>()
            .map_err(|_| Error::MalformedToken(token.to_owned()))?;
        run.push(GlyphId::new(glyph_id), int(2)?, int(3)?, int(4)?)?;
    }
    Ok(run)
}

#[derive(Debug, Deserialize)]
struct JsonGlyph {
    g: u32,
    #[serde(default)]
    dx: i32,
    #[serde(default)]
    dy: i32,
    ax: i32,
    #[serde(default)]
    ay: i32,
}

/// Parse `hb-shape --output-format=json` output.
pub fn parse_json_output(output: &str) -> Result<ShapedRun, Error> {
    let glyphs: Vec<JsonGlyph> = serde_json::from_str(output.trim())
        .map_err(|e| Error::MalformedShaperOutput(e.to_string()))?;
    let mut run = ShapedRun::default();
    for glyph in glyphs {
        if glyph.ay != 0 {
            return Err(Error::VerticalLayout(format!("{glyph:?}")));
        }
        run.push(GlyphId::new(glyph.g), glyph.dx, glyph.dy, glyph.ax)?;
    }
    Ok(run)
}

/// Something that can turn text into glyphs for a font.
pub trait Shaper {
    fn shape(&self, font_path: &Path, text: &str) -> Result<ShapedRun, Error>;
}

/// Runs HarfBuzz's `hb-shape`.
#[derive(Clone, Debug)]
pub struct HbShape {
    program: PathBuf,
    format: OutputFormat,
}

impl HbShape {
    pub fn new(program: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            program: program.into(),
            format,
        }
    }

    fn command(&self, font_path: &Path, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--no-glyph-names", "--no-clusters"]);
        if self.format == OutputFormat::Json {
            cmd.arg("--output-format=json");
        }
        cmd.arg(format!("--text={text}")).arg(font_path);
        cmd
    }
}

impl Shaper for HbShape {
    fn shape(&self, font_path: &Path, text: &str) -> Result<ShapedRun, Error> {
        let stdout = run_tool(self.command(font_path, text))?;
        self.format.parse(&stdout)
    }
}

/// Run a command to completion, returning its stdout.
///
/// A non-zero exit status is an error carrying the tool's stderr.
pub(crate) fn run_tool(mut cmd: Command) -> Result<String, Error> {
    let program = PathBuf::from(cmd.get_program());
    log::debug!("running {cmd:?}");
    let output = cmd.output().map_err(|source| Error::Spawn {
        program: program.clone(),
        source,
    })?;
    if !output.status.success() {
        return Err(Error::Tool {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_test_data::shaper;

    fn placement(gid: u32, x: i32, y: i32, advance: i32) -> GlyphPlacement {
        GlyphPlacement {
            glyph_id: GlyphId::new(gid),
            x,
            y,
            advance,
        }
    }

    #[test]
    fn offsets_and_advances() {
        let run = parse_text_output(shaper::SHAPE_TEXT).unwrap();
        assert_eq!(
            run.placements,
            vec![placement(5, 0, 0, 10), placement(12, 12, 3, 8)]
        );
        assert_eq!(run.total_advance, 18);
    }

    #[test]
    fn total_advance_is_sum() {
        let run = parse_text_output("[1+100|2@-5,7+250|3+0|4@1,1+33]").unwrap();
        let sum: i32 = run.placements.iter().map(|p| p.advance).sum();
        assert_eq!(run.total_advance, sum);
        assert_eq!(run.total_advance, 383);
        // x is the advance before this glyph, plus its offset
        assert_eq!(run.placements[1].x, 95);
        assert_eq!(run.placements[1].y, -7);
        assert_eq!(run.placements[3].x, 351);
    }

    #[test]
    fn json_matches_text() {
        let text = parse_text_output(shaper::SHAPE_TEXT).unwrap();
        let json = parse_json_output(shaper::SHAPE_JSON).unwrap();
        assert_eq!(text, json);
    }

    #[test]
    fn empty_run() {
        let run = parse_text_output("[]").unwrap();
        assert!(run.is_empty());
        assert_eq!(run.total_advance, 0);
    }

    #[test]
    fn accumulated_overflow_is_an_error() {
        assert!(matches!(
            parse_text_output("[1+2000000000|2+2000000000]"),
            Err(Error::MalformedShaperOutput(_))
        ));
        assert!(matches!(
            parse_text_output("[1+2000000000|2@2000000000,0+1]"),
            Err(Error::MalformedShaperOutput(_))
        ));
        assert!(matches!(
            parse_text_output("[1@0,-2147483648+1]"),
            Err(Error::MalformedShaperOutput(_))
        ));
        assert!(matches!(
            parse_json_output(r#"[{"g":1,"ax":2147483647},{"g":2,"ax":1}]"#),
            Err(Error::MalformedShaperOutput(_))
        ));
    }

    #[test]
    fn missing_brackets() {
        assert!(matches!(
            parse_text_output("5+10|12+8"),
            Err(Error::MalformedShaperOutput(_))
        ));
    }

    #[test]
    fn malformed_token_is_fatal() {
        for bad in ["[5+10|a+8]", "[5@1+10]", "[5+-10]", "[glyph5+10]", "[5+10||6+1]"] {
            assert!(
                matches!(parse_text_output(bad), Err(Error::MalformedToken(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn vertical_runs_are_rejected() {
        assert!(matches!(
            parse_text_output(shaper::SHAPE_TEXT_VERTICAL),
            Err(Error::VerticalLayout(_))
        ));
        assert!(matches!(
            parse_json_output(r#"[{"g":5,"ax":0,"ay":-1000}]"#),
            Err(Error::VerticalLayout(_))
        ));
    }

    #[test]
    fn hb_shape_arguments() {
        let cmd = HbShape::new("hb-shape", OutputFormat::Json).command(Path::new("a.ttf"), "hi");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
        assert_eq!(
            args,
            [
                "--no-glyph-names",
                "--no-clusters",
                "--output-format=json",
                "--text=hi",
                "a.ttf"
            ]
        );
    }

    #[test]
    fn missing_tool() {
        let shaper = HbShape::new("/nonexistent/hb-shape", OutputFormat::Text);
        assert!(matches!(
            shaper.shape(Path::new("a.ttf"), "hi"),
            Err(Error::Spawn { .. })
        ));
    }
}
