//! Bounding box of a composite SVG tree.
//!
//! The tree is walked breadth first from the root. Each element is visited
//! with the affine transform accumulated along its ancestor path; a `use`
//! contributes its own `transform` followed by its `x`/`y` translation and
//! then continues the walk at the referenced element. The box of every
//! visited shape is mapped through its transform and added to the running
//! union.

use std::collections::{HashMap, VecDeque};

use kurbo::{Affine, BezPath, Point, Rect, Shape};

use crate::{svg::Element, transform::parse_transform, Error};

/// `use` chains deeper than this are assumed to be cyclic.
pub const MAX_NESTING_LEVEL: usize = 64;

/// Caps the work done for one tree; `use` fan-out grows exponentially with depth.
pub const MAX_VISITED_ELEMENTS: usize = 1 << 20;

/// Elements that are never rendered directly.
const NOT_RENDERED: &[&str] = &[
    "defs",
    "clipPath",
    "mask",
    "linearGradient",
    "radialGradient",
    "pattern",
    "symbol",
    "marker",
    "filter",
    "style",
    "title",
    "desc",
    "metadata",
];

/// Compute the bounding box of everything rendered below `root`.
///
/// Returns `None` if nothing with an extent is found.
pub fn bounding_box(root: &Element) -> Result<Option<Rect>, Error> {
    let ids = root.id_map();
    let mut queue = VecDeque::new();
    queue.extend(root.elements().map(|el| (el, Affine::IDENTITY, 0)));
    let mut bounds: Option<Rect> = None;
    let mut visited = 0;

    while let Some((el, parent_transform, depth)) = queue.pop_front() {
        visited += 1;
        if visited > MAX_VISITED_ELEMENTS {
            return Err(Error::TooManyElements(MAX_VISITED_ELEMENTS));
        }
        if NOT_RENDERED.contains(&el.name.as_str()) {
            continue;
        }
        let mut transform = parent_transform;
        if let Some(raw) = el.attr("transform") {
            transform *= parse_transform(raw)?;
        }
        match el.name.as_str() {
            "use" => {
                let id = el
                    .href_id()
                    .ok_or_else(|| Error::UnexpectedStructure("use without href".into()))?;
                let target = *ids
                    .get(id)
                    .ok_or_else(|| Error::UnresolvedReference(id.to_owned()))?;
                if depth >= MAX_NESTING_LEVEL {
                    return Err(Error::NestingTooDeep(MAX_NESTING_LEVEL));
                }
                transform *= Affine::translate((number(el, "x")?, number(el, "y")?));
                if target.name == "symbol" {
                    queue.extend(target.elements().map(|child| (child, transform, depth + 1)));
                } else {
                    queue.push_back((target, transform, depth + 1));
                }
            }
            "g" | "svg" | "a" | "switch" => {
                queue.extend(el.elements().map(|child| (child, transform, depth)));
            }
            _ => {
                let Some(local) = shape_bounds(el)? else {
                    log::trace!("no extent for <{}>", el.name);
                    continue;
                };
                let mapped = transform.transform_rect_bbox(local);
                bounds = Some(bounds.map_or(mapped, |b| b.union(mapped)));
            }
        }
    }
    Ok(bounds)
}

/// The untransformed bounds of a basic shape or path.
fn shape_bounds(el: &Element) -> Result<Option<Rect>, Error> {
    let rect = match el.name.as_str() {
        "path" => {
            let Some(d) = el.attr("d") else {
                return Ok(None);
            };
            let path = BezPath::from_svg(d).map_err(|e| Error::InvalidPath {
                d: d.to_owned(),
                reason: e.to_string(),
            })?;
            if path.elements().is_empty() {
                return Ok(None);
            }
            path.bounding_box()
        }
        "rect" => {
            let origin = Point::new(number(el, "x")?, number(el, "y")?);
            Rect::from_origin_size(origin, (number(el, "width")?, number(el, "height")?))
        }
        "circle" => {
            let r = number(el, "r")?;
            ellipse_bounds(el, r, r)?
        }
        "ellipse" => ellipse_bounds(el, number(el, "rx")?, number(el, "ry")?)?,
        "line" => Rect::from_points(
            (number(el, "x1")?, number(el, "y1")?),
            (number(el, "x2")?, number(el, "y2")?),
        ),
        "polygon" | "polyline" => {
            let raw = el.attr("points").unwrap_or_default();
            let coords = crate::transform::parse_numbers(raw).ok_or_else(|| {
                Error::InvalidNumber {
                    attribute: "points".into(),
                    value: raw.to_owned(),
                }
            })?;
            let mut points = coords.chunks_exact(2).map(|xy| Point::new(xy[0], xy[1]));
            let Some(first) = points.next() else {
                return Ok(None);
            };
            points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
        }
        _ => return Ok(None),
    };
    Ok(Some(rect))
}

fn ellipse_bounds(el: &Element, rx: f64, ry: f64) -> Result<Rect, Error> {
    let center = Point::new(number(el, "cx")?, number(el, "cy")?);
    Ok(Rect::new(
        center.x - rx,
        center.y - ry,
        center.x + rx,
        center.y + ry,
    ))
}

/// A numeric attribute; absent means zero. A `px` suffix is accepted.
fn number(el: &Element, attribute: &str) -> Result<f64, Error> {
    let Some(raw) = el.attr(attribute) else {
        return Ok(0.0);
    };
    let trimmed = raw.trim();
    trimmed
        .strip_suffix("px")
        .unwrap_or(trimmed)
        .parse()
        .map_err(|_| Error::InvalidNumber {
            attribute: attribute.to_owned(),
            value: raw.to_owned(),
        })
}

/// The first of `references` that is not an id in `ids`.
pub(crate) fn unresolved<'a>(
    references: impl IntoIterator<Item = &'a str>,
    ids: &HashMap<&str, &Element>,
) -> Option<&'a str> {
    references.into_iter().find(|id| !ids.contains_key(*id))
}
