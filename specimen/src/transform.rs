//! Parsing of the SVG `transform` attribute.

use kurbo::{Affine, Point, Vec2};

use crate::Error;

/// Parse a transform list such as `translate(10, 20) scale(2)`.
///
/// The result applies the rightmost transform first, as SVG does.
pub fn parse_transform(raw: &str) -> Result<Affine, Error> {
    let invalid = || Error::InvalidTransform(raw.to_owned());
    let mut transform = Affine::IDENTITY;
    let mut rest = raw.trim();
    while !rest.is_empty() {
        let (name, tail) = rest.split_once('(').ok_or_else(invalid)?;
        let (args, tail) = tail.split_once(')').ok_or_else(invalid)?;
        let args = parse_numbers(args).ok_or_else(invalid)?;
        transform *= match (name.trim(), args.as_slice()) {
            ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
            ("translate", &[x]) => Affine::translate((x, 0.0)),
            ("translate", &[x, y]) => Affine::translate((x, y)),
            ("scale", &[s]) => Affine::scale(s),
            ("scale", &[x, y]) => Affine::scale_non_uniform(x, y),
            ("rotate", &[angle]) => Affine::rotate(angle.to_radians()),
            ("rotate", &[angle, cx, cy]) => {
                Affine::rotate_about(angle.to_radians(), Point::new(cx, cy))
            }
            ("skewX", &[angle]) => Affine::skew(angle.to_radians().tan(), 0.0),
            ("skewY", &[angle]) => Affine::skew(0.0, angle.to_radians().tan()),
            _ => return Err(invalid()),
        };
        rest = tail.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }
    Ok(transform)
}

/// A translation as the `transform` attribute value we write.
pub fn format_translate(offset: Vec2) -> String {
    format!(
        "translate({}, {})",
        format_number(offset.x),
        format_number(offset.y)
    )
}

/// Format a number the way it should appear in markup: no trailing `.0`
/// and no negative zero.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Parse a whitespace and/or comma separated list of numbers.
pub(crate) fn parse_numbers(raw: &str) -> Option<Vec<f64>> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_maps(transform: Affine, from: (f64, f64), to: (f64, f64)) {
        let got = transform * Point::new(from.0, from.1);
        assert!(
            (got.x - to.0).abs() < 1e-9 && (got.y - to.1).abs() < 1e-9,
            "{from:?} mapped to {got:?}, expected {to:?}"
        );
    }

    #[test]
    fn single_functions() {
        assert_maps(parse_transform("translate(3)").unwrap(), (1.0, 1.0), (4.0, 1.0));
        assert_maps(parse_transform("translate(3, -2)").unwrap(), (1.0, 1.0), (4.0, -1.0));
        assert_maps(parse_transform("scale(2)").unwrap(), (1.0, 3.0), (2.0, 6.0));
        assert_maps(parse_transform("scale(2 -1)").unwrap(), (1.0, 3.0), (2.0, -3.0));
        assert_maps(parse_transform("rotate(90)").unwrap(), (1.0, 0.0), (0.0, 1.0));
        assert_maps(parse_transform("rotate(180, 5, 5)").unwrap(), (0.0, 0.0), (10.0, 10.0));
        assert_maps(parse_transform("skewX(45)").unwrap(), (0.0, 1.0), (1.0, 1.0));
        assert_maps(parse_transform("skewY(45)").unwrap(), (1.0, 0.0), (1.0, 1.0));
        assert_maps(
            parse_transform("matrix(1,0,0,1,7,8)").unwrap(),
            (0.0, 0.0),
            (7.0, 8.0),
        );
    }

    #[test]
    fn list_applies_right_to_left() {
        // scale first, then translate
        let transform = parse_transform("translate(10,0) scale(2)").unwrap();
        assert_maps(transform, (1.0, 1.0), (12.0, 2.0));
        let transform = parse_transform(" scale(2),translate(10,0) ").unwrap();
        assert_maps(transform, (1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn empty_is_identity() {
        assert_eq!(parse_transform("").unwrap(), Affine::IDENTITY);
        assert_eq!(parse_transform("  ").unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["translate(1", "wiggle(2)", "scale()", "matrix(1,2,3)", "translate(a,b)"] {
            assert!(
                matches!(parse_transform(bad), Err(Error::InvalidTransform(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_translate(Vec2::new(12.0, -3.0)), "translate(12, -3)");
    }
}
