//! Boundary layer: nation outline, regions and shared borders

use super::context::{BaseMap, RenderContext};
use super::scene::{Group, Node, Paint, PathNode};
use super::svg::fmt_num;
use crate::color::Color;
use crate::geo::path::GeoPath;

/// Build the boundary group. `fills` and `ids` run parallel to the base
/// map's regions; regions without a fill take the default region color.
pub fn render_base(ctx: &RenderContext<'_>, ids: &[String], fills: &[Option<Color>]) -> Node {
    let style = &ctx.styling.base;
    let fill_at = |i: usize| fills.get(i).copied().flatten().unwrap_or(style.region_fill);
    let mut root = Group::new("boundaries");

    match &ctx.base {
        BaseMap::Empty => {}
        BaseMap::Topology(resolved) => {
            let path = GeoPath::new(&ctx.projection);
            root.clip_path = ctx.clip.as_ref().map(|(id, _)| id.clone());

            if let Some(geometry) = resolved.nation.as_ref().and_then(|n| n.geometry.as_ref()) {
                root.children.push(Node::Path(PathNode {
                    id: Some("nation".into()),
                    d: path.data(geometry),
                    paint: Paint::fill(style.nation_fill)
                        .with_stroke(style.nation_stroke, style.nation_stroke_width),
                    ..Default::default()
                }));
            }

            let mut regions = Group::new("regions");
            for (i, region) in resolved.regions.iter().enumerate() {
                let Some(geometry) = &region.feature.geometry else {
                    continue;
                };
                regions.children.push(Node::Path(PathNode {
                    id: ids.get(i).cloned(),
                    class: Some("region".into()),
                    d: path.data(geometry),
                    paint: Paint::fill(fill_at(i))
                        .with_stroke(style.region_stroke, style.region_stroke_width),
                    ..Default::default()
                }));
            }
            root.children.push(Node::Group(regions));

            if let Some(borders) = &resolved.borders {
                root.children.push(Node::Path(PathNode {
                    id: Some("borders".into()),
                    d: path.data(borders),
                    paint: Paint {
                        round_joins: true,
                        ..Paint::stroke(style.region_stroke, style.region_stroke_width)
                    },
                    ..Default::default()
                }));
            }
        }
        BaseMap::Custom { map, scale, offset } => {
            root.transform = Some(format!(
                "translate({} {}) scale({})",
                fmt_num(offset.x),
                fmt_num(offset.y),
                fmt_num(*scale)
            ));
            // Keep strokes at their on-screen width under the fit scale
            let stroke_width = style.region_stroke_width / scale.max(f64::EPSILON);
            let mut regions = Group::new("regions");
            for (i, region) in map.regions.iter().enumerate() {
                regions.children.push(Node::Group(Group {
                    id: ids.get(i).cloned(),
                    class: Some("region".into()),
                    transform: region.transform.clone(),
                    paint: Paint::fill(fill_at(i)).with_stroke(style.region_stroke, stroke_width),
                    children: vec![region.node.clone()],
                    ..Default::default()
                }));
            }
            root.children.push(Node::Group(regions));
            if !map.boundaries.is_empty() {
                root.children.push(Node::Group(Group {
                    children: map.boundaries.clone(),
                    paint: Paint::stroke(style.nation_stroke, style.nation_stroke_width / scale.max(f64::EPSILON)),
                    ..Group::new("custom-boundaries")
                }));
            }
        }
    }

    crate::log::debug!(regions = ids.len(), "boundary layer drawn");
    Node::Group(root)
}
