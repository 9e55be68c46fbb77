//! Canned output of the HarfBuzz command line tools.

/// `hb-shape --no-glyph-names --no-clusters` for glyphs 5 and 12 of [`crate::sample_font`].
pub static SHAPE_TEXT: &str = "[5+10|12@2,-3+8]\n";

/// The same run as [`SHAPE_TEXT`] with `--output-format=json`.
pub static SHAPE_JSON: &str =
    r#"[{"g":5,"dx":0,"dy":0,"ax":10,"ay":0},{"g":12,"dx":2,"dy":-3,"ax":8,"ay":0}]"#;

/// A vertical run, as printed when shaping with `--direction=ttb`.
pub static SHAPE_TEXT_VERTICAL: &str = "[5@-500,-880+0,-1000|6@-500,-880+0,-1000]";

/// Trimmed `hb-view -O svg` output for two glyphs.
pub static VIEW_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="151.2pt" height="82.5pt" viewBox="0 0 151.2 82.5" version="1.1">
<defs>
<g>
<symbol overflow="visible" id="glyph0-1">
<path style="stroke:none;" d="M 4 0 L 4 -30 L 20 -30 L 20 0 Z "/>
</symbol>
<symbol overflow="visible" id="glyph0-2">
<path style="stroke:none;" d="M 2 0 L 12 -20 L 22 0 Z "/>
</symbol>
</g>
</defs>
<g id="surface1">
<rect x="0" y="0" width="151.2" height="82.5" style="fill:rgb(100%,100%,100%);fill-opacity:1;stroke:none;"/>
<g style="fill:rgb(0%,0%,0%);fill-opacity:1;">
  <use xlink:href="#glyph0-1" x="16" y="60"/>
  <use xlink:href="#glyph0-2" x="40" y="60"/>
</g>
</g>
</svg>
"##;
