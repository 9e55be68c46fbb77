//! Colorized renderings of monochrome fonts.
//!
//! `hb-view -O svg` draws each glyph as a `<use>` of a `<symbol>`, on top
//! of an opaque backdrop rectangle, with a canvas size in points. We give
//! every glyph its own fill, drop the backdrop and round the size up to
//! whole units.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{shape::run_tool, svg::Element, transform::format_number, Error};

/// The group cairo wraps the rendered surface in.
const SURFACE_ID: &str = "surface1";

/// Something that renders text in a font to an SVG document.
pub trait Renderer {
    fn render_svg(&self, font_path: &Path, text: &str) -> Result<String, Error>;
}

/// Runs HarfBuzz's `hb-view`.
#[derive(Clone, Debug)]
pub struct HbView {
    program: PathBuf,
}

impl HbView {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Renderer for HbView {
    fn render_svg(&self, font_path: &Path, text: &str) -> Result<String, Error> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-O", "svg"]).arg(font_path).arg(text);
        Ok(run_tool(cmd)?.trim().to_owned())
    }
}

/// The default palette: shades of blue-violet.
pub fn blues(nth: usize) -> String {
    let blue = (100.0 * ((nth as f64 / 5.0) % 10.0).sin()) as i32;
    format!("rgb(25%, 0%, {blue}%)")
}

/// Recolor an `hb-view` rendering.
///
/// Every `<use>` directly inside a `<g>` gets `fill` set to `color(n)`,
/// where `n` counts the uses in document order.
pub fn colorize(raw_svg: &str, color: impl Fn(usize) -> String) -> Result<String, Error> {
    let mut root = Element::parse(raw_svg)?;

    let mut nth = 0;
    root.visit_mut(&mut |el| {
        if el.name != "g" {
            return;
        }
        for child in el.elements_mut().filter(|child| child.name == "use") {
            child.set_attr("fill", color(nth));
            nth += 1;
        }
    });
    log::debug!("colored {nth} glyphs");

    for dim in ["width", "height"] {
        let raw = root
            .attr(dim)
            .ok_or_else(|| Error::UnexpectedStructure(format!("no {dim} on the root")))?;
        let rounded = strip_pt(raw).ok_or_else(|| Error::InvalidNumber {
            attribute: dim.to_owned(),
            value: raw.to_owned(),
        })?;
        root.set_attr(dim, rounded);
    }

    remove_backdrop(&mut root)?;
    Ok(root.to_pretty_string())
}

/// Render `text` with `renderer` and colorize it with [`blues`].
pub fn colorize_text(
    renderer: &impl Renderer,
    font_path: &Path,
    text: &str,
) -> Result<String, Error> {
    let raw = renderer.render_svg(font_path, text)?;
    colorize(&raw, blues)
}

/// `151.2pt` becomes `152`.
fn strip_pt(dim: &str) -> Option<String> {
    let value: f64 = dim.trim().strip_suffix("pt")?.parse().ok()?;
    Some(format_number(value.ceil()))
}

fn remove_backdrop(root: &mut Element) -> Result<(), Error> {
    let mut removed = 0;
    root.visit_mut(&mut |el| {
        if el.name == "g" && el.id() == Some(SURFACE_ID) {
            removed += el.remove_children(|child| child.name == "rect");
        }
    });
    match removed {
        1 => Ok(()),
        0 => Err(Error::UnexpectedStructure(format!(
            "no backdrop rect in g#{SURFACE_ID}"
        ))),
        n => Err(Error::UnexpectedStructure(format!(
            "{n} backdrop rects in g#{SURFACE_ID}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_test_data::shaper::VIEW_SVG;

    #[test]
    fn palette() {
        assert_eq!(blues(0), "rgb(25%, 0%, 0%)");
        // sin(0.2) = 0.1987
        assert_eq!(blues(1), "rgb(25%, 0%, 19%)");
        // sin(4.0) = -0.7568, truncated toward zero
        assert_eq!(blues(20), "rgb(25%, 0%, -75%)");
        // wraps every 50 glyphs
        assert_eq!(blues(51), blues(1));
    }

    #[test]
    fn fills_uses_in_order() {
        let out = colorize(VIEW_SVG, |n| format!("c{n}")).unwrap();
        let root = Element::parse(&out).unwrap();
        let fills: Vec<_> = root
            .descendants()
            .filter(|el| el.name == "use")
            .map(|el| el.attr("fill").unwrap())
            .collect();
        assert_eq!(fills, ["c0", "c1"]);
    }

    #[test]
    fn size_rounded_up() {
        let out = colorize(VIEW_SVG, blues).unwrap();
        let root = Element::parse(&out).unwrap();
        assert_eq!(root.attr("width"), Some("152"));
        assert_eq!(root.attr("height"), Some("83"));
        // the view box is untouched
        assert_eq!(root.attr("viewBox"), Some("0 0 151.2 82.5"));
    }

    #[test]
    fn backdrop_removed() {
        let out = colorize(VIEW_SVG, blues).unwrap();
        let root = Element::parse(&out).unwrap();
        assert!(root.descendants().all(|el| el.name != "rect"));
        // glyph symbols survive
        assert_eq!(
            root.descendants().filter(|el| el.name == "symbol").count(),
            2
        );
    }

    #[test]
    fn missing_backdrop_is_fatal() {
        let no_backdrop = VIEW_SVG
            .lines()
            .filter(|line| !line.starts_with("<rect"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(matches!(
            colorize(&no_backdrop, blues),
            Err(Error::UnexpectedStructure(_))
        ));
    }

    #[test]
    fn whole_points() {
        assert_eq!(strip_pt("12pt").as_deref(), Some("12"));
        assert_eq!(strip_pt("12.01pt").as_deref(), Some("13"));
        assert_eq!(strip_pt("12"), None);
    }

    struct Canned;

    impl Renderer for Canned {
        fn render_svg(&self, _: &Path, _: &str) -> Result<String, Error> {
            Ok(VIEW_SVG.to_owned())
        }
    }

    #[test]
    fn renderer_pipeline() {
        let out = colorize_text(&Canned, Path::new("font.ttf"), "hi").unwrap();
        assert!(out.contains(r#"fill="rgb(25%, 0%, 19%)""#));
    }
}
