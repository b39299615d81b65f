//! Hand-supplied SVG maps.
//!
//! A custom map is an SVG document with a root group (`custom-map`,
//! `map-root`, `root` or `map`). Its identified children are regions; their
//! ids are reduced to a key and normalized like any other region identifier.
//! Known boundary groups are kept as-is and drawn over the regions.

use std::str::FromStr;
use std::sync::OnceLock;

use glam::{DVec2, dvec2};
use miette::{NamedSource, SourceSpan};
use regex::Regex;
use svgtypes::{PathParser, PathSegment, PointsParser};

use super::Geography;
use super::normalize::normalize_identifier;
use crate::color::Color;
use crate::errors::CustomMapError;
use crate::render::scene::{CircleNode, Group, Node, Paint, PathNode, RectNode};
use crate::render::svg::fmt_num;
use crate::types::BBox;

pub const ROOT_IDS: &[&str] = &["custom-map", "map-root", "root", "map"];
const BOUNDARY_IDS: &[&str] = &[
    "nation",
    "outline",
    "boundaries",
    "borders",
    "state-borders",
    "country-borders",
];
const CONTAINER_IDS: &[&str] = &["states", "subdivisions", "regions", "provinces", "countries"];
const SHAPE_TAGS: &[&str] = &["path", "polygon", "polyline", "rect", "circle", "ellipse", "line", "g"];

/// One region element of a custom map
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRegion {
    /// The element's own id attribute
    pub element_id: String,
    /// Normalized key data rows match against
    pub key: String,
    /// Shape without paint, so the region's fill is inherited
    pub node: Node,
    /// Transform inherited from the element's ancestors, as an SVG attribute
    pub transform: Option<String>,
    /// Extent in map coordinates
    pub bounds: BBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomMap {
    /// Map coordinate extent (the document's view box when it has one)
    pub view_box: BBox,
    pub regions: Vec<CustomRegion>,
    /// Boundary groups, drawn unchanged above the regions
    pub boundaries: Vec<Node>,
}

impl CustomMap {
    /// Transform fitting the view box into a canvas of `size`, centered:
    /// (scale, translation)
    pub fn fit(&self, size: DVec2) -> (f64, DVec2) {
        let vb = self.view_box;
        if vb.is_empty() || vb.width() <= 0.0 || vb.height() <= 0.0 {
            return (1.0, DVec2::ZERO);
        }
        let k = (size.x / vb.width()).min(size.y / vb.height());
        let offset = (size - vb.size() * k) / 2.0 - vb.min * k;
        (k, offset)
    }
}

/// 2D affine matrix in SVG order: x' = a x + c y + e, y' = b x + d y + f
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Parse a transform attribute; unparseable lists are the identity
    fn parse(attr: &str) -> Affine {
        match svgtypes::Transform::from_str(attr) {
            Ok(t) => Affine {
                a: t.a,
                b: t.b,
                c: t.c,
                d: t.d,
                e: t.e,
                f: t.f,
            },
            Err(_) => Affine::IDENTITY,
        }
    }

    /// `self` applied after `inner`
    fn then(self, inner: Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    fn apply(&self, p: DVec2) -> DVec2 {
        dvec2(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    fn to_attr(self) -> Option<String> {
        if self == Affine::IDENTITY {
            return None;
        }
        Some(format!(
            "matrix({} {} {} {} {} {})",
            fmt_num(self.a),
            fmt_num(self.b),
            fmt_num(self.c),
            fmt_num(self.d),
            fmt_num(self.e),
            fmt_num(self.f)
        ))
    }
}

/// Ids used verbatim: two-letter code, bare word, 5-digit and 2-digit codes
fn bare_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [r"^[A-Za-z]{2}$", r"^[A-Za-z]+$", r"^\d{5}$", r"^\d{2}$"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// `state-CA`, `province_quebec` and the like
fn prefixed_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:state|province|prov|region|country|territory|area|feature|shape)[-_](.+)$").ok()
        })
        .as_ref()
}

/// Region key candidate from an element id: a bare code or word as-is, the
/// value of a `prefix-value` id, or the id with separators as spaces
pub fn key_from_id(id: &str, geography: Geography) -> String {
    let prefixed = prefixed_id_pattern().and_then(|re| re.captures(id)).and_then(|c| c.get(1));
    let candidate = if bare_id_patterns().iter().any(|re| re.is_match(id)) {
        id.to_string()
    } else if let Some(value) = prefixed {
        value.as_str().replace(['_', '-'], " ")
    } else {
        id.replace(['_', '-'], " ")
    };
    normalize_identifier(&candidate, geography)
}

/// Parse custom map markup into regions and boundary overlays
pub fn parse_custom_map(markup: &str, geography: Geography) -> Result<CustomMap, CustomMapError> {
    let doc = roxmltree::Document::parse(markup).map_err(|err| malformed(markup, &err))?;
    let svg = doc.root_element();

    let Some(root) = svg.descendants().find(|n| {
        n.is_element() && n.tag_name().name() == "g" && n.attribute("id").is_some_and(|id| ROOT_IDS.contains(&id))
    }) else {
        return Err(CustomMapError::MissingRoot {
            accepted: Some(format!("wrap the map in <g id=\"{}\">", ROOT_IDS[0])),
        });
    };

    let mut regions = Vec::new();
    let mut boundaries = Vec::new();
    for child in root.children().filter(|n| n.is_element()) {
        let id = child.attribute("id").unwrap_or_default();
        if BOUNDARY_IDS.contains(&id) {
            boundaries.extend(element_node(child, true).map(|node| wrap_inherited(node, child)));
        } else if CONTAINER_IDS.contains(&id) {
            for el in child.children().filter(|n| n.is_element()) {
                collect_region(el, geography, &mut regions);
            }
        } else {
            collect_region(child, geography, &mut regions);
        }
    }

    if regions.is_empty() {
        return Err(CustomMapError::NoRegions);
    }

    let view_box = document_extent(svg).unwrap_or_else(|| {
        let mut all = BBox::new();
        for r in &regions {
            all.union(&r.bounds);
        }
        all
    });

    crate::log::debug!(
        regions = regions.len(),
        boundaries = boundaries.len(),
        "parsed custom map"
    );

    Ok(CustomMap {
        view_box,
        regions,
        boundaries,
    })
}

fn malformed(markup: &str, err: &roxmltree::Error) -> CustomMapError {
    // Parser columns count characters, spans count bytes
    let pos = err.pos();
    let line_start = markup
        .split_inclusive('\n')
        .take(pos.row.saturating_sub(1) as usize)
        .map(str::len)
        .sum::<usize>()
        .min(markup.len());
    let line = markup[line_start..].split('\n').next().unwrap_or_default();
    let column = line
        .char_indices()
        .nth(pos.col.saturating_sub(1) as usize)
        .map_or(line.len(), |(i, _)| i);
    let offset = line_start + column;
    CustomMapError::Malformed {
        reason: err.to_string(),
        src: NamedSource::new("custom map", markup.to_string()),
        span: SourceSpan::from((offset, 0)),
    }
}

fn collect_region(el: roxmltree::Node<'_, '_>, geography: Geography, out: &mut Vec<CustomRegion>) {
    let Some(id) = el.attribute("id") else {
        return;
    };
    let Some(node) = element_node(el, false) else {
        return;
    };
    let inherited = ancestor_transform(el);
    let mut bounds = BBox::new();
    element_bounds(el, inherited, &mut bounds);
    out.push(CustomRegion {
        element_id: id.to_string(),
        key: key_from_id(id, geography),
        node,
        transform: inherited.to_attr(),
        bounds,
    });
}

/// Boundary nodes keep the transform of the root group above them
fn wrap_inherited(node: Node, el: roxmltree::Node<'_, '_>) -> Node {
    match ancestor_transform(el).to_attr() {
        None => node,
        Some(transform) => Node::Group(Group {
            transform: Some(transform),
            children: vec![node],
            ..Default::default()
        }),
    }
}

/// Composed transform of every element ancestor, outermost first
fn ancestor_transform(el: roxmltree::Node<'_, '_>) -> Affine {
    let mut ancestors: Vec<_> = el.ancestors().skip(1).filter(|n| n.is_element()).collect();
    ancestors.reverse();
    ancestors
        .iter()
        .filter_map(|n| n.attribute("transform"))
        .fold(Affine::IDENTITY, |acc, t| acc.then(Affine::parse(t)))
}

fn attr_f64(el: roxmltree::Node<'_, '_>, name: &str) -> f64 {
    el.attribute(name)
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
        .unwrap_or(0.0)
}

fn element_paint(el: roxmltree::Node<'_, '_>) -> Paint {
    let color = |name: &str| el.attribute(name).and_then(|v| Color::parse(v).ok());
    Paint {
        fill: color("fill").map(Into::into),
        stroke: color("stroke"),
        stroke_width: el
            .attribute("stroke-width")
            .and_then(|v| v.trim().trim_end_matches("px").parse().ok()),
        ..Default::default()
    }
}

fn points_data(points: &str, close: bool) -> String {
    let mut d = String::new();
    for (i, (x, y)) in PointsParser::from(points).enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&format!("{},{}", fmt_num(x), fmt_num(y)));
    }
    if close && !d.is_empty() {
        d.push('Z');
    }
    d
}

/// Scene node for a shape element. Region shapes drop their paint so the
/// region fill applies; boundary shapes keep theirs.
fn element_node(el: roxmltree::Node<'_, '_>, keep_paint: bool) -> Option<Node> {
    let tag = el.tag_name().name();
    if !SHAPE_TAGS.contains(&tag) {
        return None;
    }
    let paint = if keep_paint { element_paint(el) } else { Paint::default() };
    let transform = el.attribute("transform").map(str::to_string);
    let path = |d: String| {
        Some(Node::Path(PathNode {
            d,
            paint: paint.clone(),
            transform: transform.clone(),
            ..Default::default()
        }))
    };
    match tag {
        "path" => path(el.attribute("d")?.to_string()),
        "polygon" => path(points_data(el.attribute("points")?, true)),
        "polyline" => path(points_data(el.attribute("points")?, false)),
        "line" => path(format!(
            "M{},{}L{},{}",
            fmt_num(attr_f64(el, "x1")),
            fmt_num(attr_f64(el, "y1")),
            fmt_num(attr_f64(el, "x2")),
            fmt_num(attr_f64(el, "y2"))
        )),
        "ellipse" => {
            let (cx, cy) = (attr_f64(el, "cx"), attr_f64(el, "cy"));
            let (rx, ry) = (fmt_num(attr_f64(el, "rx")), fmt_num(attr_f64(el, "ry")));
            let left = format!("{},{}", fmt_num(cx - attr_f64(el, "rx")), fmt_num(cy));
            let right = format!("{},{}", fmt_num(cx + attr_f64(el, "rx")), fmt_num(cy));
            path(format!(
                "M{left}A{rx},{ry} 0 1,0 {right}A{rx},{ry} 0 1,0 {left}Z"
            ))
        }
        "rect" => Some(Node::Rect(RectNode {
            origin: dvec2(attr_f64(el, "x"), attr_f64(el, "y")),
            size: dvec2(attr_f64(el, "width"), attr_f64(el, "height")),
            paint,
            transform,
            ..Default::default()
        })),
        "circle" => {
            let circle = Node::Circle(CircleNode {
                center: dvec2(attr_f64(el, "cx"), attr_f64(el, "cy")),
                radius: attr_f64(el, "r"),
                paint,
                ..Default::default()
            });
            Some(match transform {
                None => circle,
                Some(t) => Node::Group(Group {
                    transform: Some(t),
                    children: vec![circle],
                    ..Default::default()
                }),
            })
        }
        "g" => {
            let children: Vec<Node> = el
                .children()
                .filter(|n| n.is_element())
                .filter_map(|n| element_node(n, keep_paint))
                .collect();
            if children.is_empty() {
                return None;
            }
            Some(Node::Group(Group {
                transform,
                paint,
                children,
                ..Default::default()
            }))
        }
        _ => None,
    }
}

/// Expand `bounds` by the element's geometry, control points included
fn element_bounds(el: roxmltree::Node<'_, '_>, ctm: Affine, bounds: &mut BBox) {
    let ctm = match el.attribute("transform") {
        Some(t) => ctm.then(Affine::parse(t)),
        None => ctm,
    };
    let mut add = |p: DVec2| bounds.expand_point(ctm.apply(p));
    match el.tag_name().name() {
        "path" => {
            if let Some(d) = el.attribute("d") {
                path_points(d, &mut add);
            }
        }
        "polygon" | "polyline" => {
            for (x, y) in PointsParser::from(el.attribute("points").unwrap_or_default()) {
                add(dvec2(x, y));
            }
        }
        "line" => {
            add(dvec2(attr_f64(el, "x1"), attr_f64(el, "y1")));
            add(dvec2(attr_f64(el, "x2"), attr_f64(el, "y2")));
        }
        "rect" => {
            let origin = dvec2(attr_f64(el, "x"), attr_f64(el, "y"));
            let size = dvec2(attr_f64(el, "width"), attr_f64(el, "height"));
            for corner in [DVec2::ZERO, dvec2(size.x, 0.0), size, dvec2(0.0, size.y)] {
                add(origin + corner);
            }
        }
        "circle" | "ellipse" => {
            let c = dvec2(attr_f64(el, "cx"), attr_f64(el, "cy"));
            let r = if el.tag_name().name() == "circle" {
                DVec2::splat(attr_f64(el, "r"))
            } else {
                dvec2(attr_f64(el, "rx"), attr_f64(el, "ry"))
            };
            for corner in [-r, dvec2(r.x, -r.y), r, dvec2(-r.x, r.y)] {
                add(c + corner);
            }
        }
        "g" => {
            for child in el.children().filter(|n| n.is_element()) {
                element_bounds(child, ctm, bounds);
            }
        }
        _ => {}
    }
}

/// Visit every absolute point of path data, control points included
fn path_points(d: &str, add: &mut impl FnMut(DVec2)) {
    let mut current = DVec2::ZERO;
    let mut start = DVec2::ZERO;
    for segment in PathParser::from(d).flatten() {
        let is_move = matches!(segment, PathSegment::MoveTo { .. });
        let (abs, controls, end) = match segment {
            PathSegment::MoveTo { abs, x, y } => (abs, vec![], Some(dvec2(x, y))),
            PathSegment::LineTo { abs, x, y }
            | PathSegment::SmoothQuadratic { abs, x, y }
            | PathSegment::EllipticalArc { abs, x, y, .. } => (abs, vec![], Some(dvec2(x, y))),
            PathSegment::HorizontalLineTo { abs, x } => {
                let y = if abs { current.y } else { 0.0 };
                (abs, vec![], Some(dvec2(x, y)))
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let x = if abs { current.x } else { 0.0 };
                (abs, vec![], Some(dvec2(x, y)))
            }
            PathSegment::CurveTo { abs, x1, y1, x2, y2, x, y } => {
                (abs, vec![dvec2(x1, y1), dvec2(x2, y2)], Some(dvec2(x, y)))
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                (abs, vec![dvec2(x2, y2)], Some(dvec2(x, y)))
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                (abs, vec![dvec2(x1, y1)], Some(dvec2(x, y)))
            }
            PathSegment::ClosePath { .. } => (true, vec![], None),
        };
        let base = if abs { DVec2::ZERO } else { current };
        for c in controls {
            add(base + c);
        }
        match end {
            Some(p) => {
                current = base + p;
                if is_move {
                    start = current;
                }
                add(current);
            }
            None => current = start,
        }
    }
}

/// The document's view box, else its width and height from the origin
fn document_extent(svg: roxmltree::Node<'_, '_>) -> Option<BBox> {
    if let Some(vb) = svg.attribute("viewBox") {
        let nums: Vec<f64> = vb
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let [x, y, w, h] = nums[..] {
            if w > 0.0 && h > 0.0 {
                return Some(BBox::from_origin_size(dvec2(x, y), dvec2(w, h)));
            }
        }
    }
    let (w, h) = (attr_f64(svg, "width"), attr_f64(svg, "height"));
    (w > 0.0 && h > 0.0).then(|| BBox::from_origin_size(DVec2::ZERO, dvec2(w, h)))
}
