//! Drawn annotation paths: path data, markers, outline stroke and edit handles

use glam::{DVec2, dvec2};

use super::context::RenderContext;
use super::defaults;
use super::scene::{CircleNode, Def, Group, MarkerDef, Node, Paint, PathNode, RectNode};
use super::svg::fmt_num;
use crate::color::Color;
use crate::paths::{DrawnPath, MarkerKind, PathOverride, PathStyle};
use crate::types::BBox;

/// A path as drawn: its override offset applied and its style resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub path: DrawnPath,
    pub style: PathStyle,
}

impl ResolvedPath {
    pub fn resolve(source: &DrawnPath, path_override: Option<&PathOverride>) -> Self {
        let mut path = source.clone();
        match path_override {
            Some(o) => {
                if let Some(offset) = o.offset {
                    path.translate(offset);
                }
                ResolvedPath {
                    style: o.apply(&source.style),
                    path,
                }
            }
            None => ResolvedPath {
                style: source.style.clone(),
                path,
            },
        }
    }
}

fn pt(p: DVec2) -> String {
    format!("{},{}", fmt_num(p.x), fmt_num(p.y))
}

/// Path data: `L` without control points, `Q` with one, `C` with two
pub fn path_data(path: &DrawnPath, closed: bool) -> String {
    let mut d = String::new();
    for (i, p) in path.points.iter().enumerate() {
        if i == 0 {
            d.push('M');
            d.push_str(&pt(p.at));
            continue;
        }
        match (p.c1, p.c2) {
            (Some(c1), Some(c2)) => {
                d.push_str(&format!("C{} {} {}", pt(c1), pt(c2), pt(p.at)));
            }
            (Some(c), None) | (None, Some(c)) => {
                d.push_str(&format!("Q{} {}", pt(c), pt(p.at)));
            }
            (None, None) => {
                d.push('L');
                d.push_str(&pt(p.at));
            }
        }
    }
    if closed && path.points.len() > 2 {
        d.push('Z');
    }
    d
}

fn marker_kind_name(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::None => "none",
        MarkerKind::Arrow => "arrow",
        MarkerKind::OpenArrow => "open-arrow",
        MarkerKind::Circle => "circle",
        MarkerKind::Square => "square",
        MarkerKind::Diamond => "diamond",
        MarkerKind::Bar => "bar",
    }
}

/// Marker definition for a kind, color and direction. Shapes are drawn in a
/// 10x10 box pointing along +x, or -x when `reversed`; the definition id is
/// derived from all three, so equal markers share one definition.
pub fn marker_def(kind: MarkerKind, color: Color, reversed: bool, size: f64) -> Option<MarkerDef> {
    let hex = color.to_svg().trim_start_matches('#').to_string();
    let id = format!(
        "marker-{}-{}-{}-{}",
        marker_kind_name(kind),
        if reversed { "rev" } else { "fwd" },
        hex,
        fmt_num(size).replace('.', "_")
    );
    let flip = |p: DVec2| if reversed { dvec2(10.0 - p.x, p.y) } else { p };
    let poly = |pts: &[DVec2], close: bool| {
        let mut d = String::new();
        for (i, p) in pts.iter().enumerate() {
            d.push(if i == 0 { 'M' } else { 'L' });
            d.push_str(&pt(flip(*p)));
        }
        if close {
            d.push('Z');
        }
        d
    };
    let (shape, ref_point) = match kind {
        MarkerKind::None => return None,
        MarkerKind::Arrow => (
            Node::Path(PathNode {
                d: poly(&[dvec2(0.0, 0.0), dvec2(10.0, 5.0), dvec2(0.0, 10.0)], true),
                paint: Paint::fill(color),
                ..Default::default()
            }),
            flip(dvec2(10.0, 5.0)),
        ),
        MarkerKind::OpenArrow => (
            Node::Path(PathNode {
                d: poly(&[dvec2(1.0, 1.0), dvec2(9.0, 5.0), dvec2(1.0, 9.0)], false),
                paint: Paint {
                    round_joins: true,
                    ..Paint::stroke(color, 1.5)
                },
                ..Default::default()
            }),
            flip(dvec2(9.0, 5.0)),
        ),
        MarkerKind::Circle => (
            Node::Circle(CircleNode {
                center: dvec2(5.0, 5.0),
                radius: 4.0,
                paint: Paint::fill(color),
                ..Default::default()
            }),
            dvec2(5.0, 5.0),
        ),
        MarkerKind::Square => (
            Node::Rect(RectNode {
                origin: dvec2(1.0, 1.0),
                size: dvec2(8.0, 8.0),
                paint: Paint::fill(color),
                ..Default::default()
            }),
            dvec2(5.0, 5.0),
        ),
        MarkerKind::Diamond => (
            Node::Path(PathNode {
                d: poly(
                    &[dvec2(5.0, 0.0), dvec2(10.0, 5.0), dvec2(5.0, 10.0), dvec2(0.0, 5.0)],
                    true,
                ),
                paint: Paint::fill(color),
                ..Default::default()
            }),
            dvec2(5.0, 5.0),
        ),
        MarkerKind::Bar => (
            Node::Path(PathNode {
                d: poly(&[dvec2(5.0, 0.0), dvec2(5.0, 10.0)], false),
                paint: Paint::stroke(color, 2.0),
                ..Default::default()
            }),
            dvec2(5.0, 5.0),
        ),
    };
    Some(MarkerDef {
        id,
        view_box: BBox::from_origin_size(DVec2::ZERO, dvec2(10.0, 10.0)),
        ref_point,
        size,
        shape,
    })
}

/// The group for one path plus the marker definitions it references.
/// Start markers point back along the path unless mirrored; end markers
/// point forward unless mirrored.
pub fn path_group(resolved: &ResolvedPath, selected: bool) -> (Node, Vec<Def>) {
    let ResolvedPath { path, style } = resolved;
    let d = path_data(path, style.closed);
    let marker_size = style.stroke_width * defaults::MARKER_SCALE;
    let mut defs = Vec::new();
    let mut marker = |kind: MarkerKind, reversed: bool| {
        let def = marker_def(kind, style.stroke, reversed, marker_size)?;
        let id = def.id.clone();
        defs.push(Def::Marker(def));
        Some(id)
    };
    let marker_start = marker(style.start_marker, !style.mirror_start);
    let marker_end = marker(style.end_marker, style.mirror_end);

    let mut group = Group::new(path.id.clone()).with_class(if selected {
        "drawn-path selected"
    } else {
        "drawn-path"
    });
    if style.opacity < 1.0 {
        group.paint.opacity = Some(style.opacity);
    }
    if style.outline_width > 0.0 {
        group.children.push(Node::Path(PathNode {
            class: Some("outline".into()),
            d: d.clone(),
            paint: Paint {
                fill: Some(Color::None.into()),
                stroke: Some(style.outline_color),
                stroke_width: Some(style.stroke_width + 2.0 * style.outline_width),
                dash: style.dash.clone(),
                round_joins: true,
                ..Default::default()
            },
            ..Default::default()
        }));
    }
    group.children.push(Node::Path(PathNode {
        class: Some("stroke".into()),
        d,
        paint: Paint {
            fill: Some(style.fill.into()),
            stroke: Some(style.stroke),
            stroke_width: Some(style.stroke_width),
            dash: style.dash.clone(),
            round_joins: true,
            ..Default::default()
        },
        marker_start,
        marker_end,
        ..Default::default()
    }));

    if selected {
        group.children.push(Node::Group(handles(path)));
    }
    (Node::Group(group), defs)
}

/// Draggable handles for vertices and control points
fn handles(path: &DrawnPath) -> Group {
    let mut group = Group::new(format!("{}-handles", path.id)).with_class("handles");
    let handle = |id: String, at: DVec2, radius: f64, fill: Color| {
        Node::Circle(CircleNode {
            id: Some(id),
            class: Some("handle".into()),
            center: at,
            radius,
            paint: Paint::fill(fill).with_stroke(defaults::HANDLE_COLOR, 1.5),
        })
    };
    for (i, p) in path.points.iter().enumerate() {
        for (which, c) in [(1, p.c1), (2, p.c2)] {
            if let Some(c) = c {
                group.children.push(Node::Path(PathNode {
                    d: format!("M{}L{}", pt(p.at), pt(c)),
                    paint: Paint::stroke(defaults::HANDLE_COLOR, 1.0),
                    ..Default::default()
                }));
                group.children.push(handle(
                    format!("{}-control-{i}-{which}", path.id),
                    c,
                    defaults::CONTROL_HANDLE_RADIUS,
                    defaults::HANDLE_COLOR,
                ));
            }
        }
        group.children.push(handle(
            format!("{}-point-{i}", path.id),
            p.at,
            defaults::HANDLE_RADIUS,
            Color::WHITE,
        ));
    }
    group
}

/// The drawn-path layer
pub fn render_paths(ctx: &RenderContext<'_>, paths: &[DrawnPath]) -> (Node, Vec<Def>) {
    let mut group = Group::new("drawn-paths");
    let mut defs = Vec::new();
    for source in paths {
        if source.points.is_empty() {
            crate::log::debug!(id = %source.id, "skipping path without points");
            continue;
        }
        let resolved = ResolvedPath::resolve(source, ctx.styling.path_overrides.get(&source.id));
        let selected = ctx.selected_path == Some(source.id.as_str());
        let (node, path_defs) = path_group(&resolved, selected);
        group.children.push(node);
        defs.extend(path_defs);
    }
    (Node::Group(group), defs)
}
