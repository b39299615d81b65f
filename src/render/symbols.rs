//! Symbol layer: one sized, colored mark per row with a valid location

use glam::{DVec2, dvec2};

use super::choropleth::build_scale;
use super::context::RenderContext;
use super::scene::{CircleNode, Group, Node, Paint, PathNode, RectNode};
use super::svg::fmt_num;
use crate::data::DataRow;
use crate::geo::projection::is_valid_lonlat;
use crate::scale::{ColorScale, SizeScale};
use crate::settings::{SymbolSettings, SymbolShape};
use crate::values::{numeric_bounds, parse_number};

/// A drawn symbol; labels anchor to it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolMark {
    /// Index of the source row
    pub row: usize,
    pub center: DVec2,
    pub size: f64,
}

#[derive(Debug, Clone)]
pub struct SymbolLayer {
    pub node: Node,
    pub marks: Vec<SymbolMark>,
    pub size_scale: Option<SizeScale>,
    pub color_scale: Option<ColorScale>,
}

/// Longitude/latitude from the bound columns, else from geocoding
pub fn row_location(row: &DataRow, settings: &SymbolSettings) -> Option<DVec2> {
    let column = |name: &str| row.get(name).and_then(parse_number);
    let geocode = row.geocode.as_ref();
    let lat = column(&settings.latitude_column).or_else(|| geocode.and_then(|g| g.latitude))?;
    let lon = column(&settings.longitude_column).or_else(|| geocode.and_then(|g| g.longitude))?;
    let lonlat = dvec2(lon, lat);
    is_valid_lonlat(lonlat).then_some(lonlat)
}

pub fn render_symbols(ctx: &RenderContext<'_>, settings: &SymbolSettings) -> SymbolLayer {
    let style = &ctx.styling.symbol;
    let rows = &ctx.dataset.rows;

    let size_scale = settings.size.as_ref().map(|binding| {
        SizeScale::build(&binding.scale, numeric_bounds(rows, &binding.column), style.size)
    });
    let color_scale = settings
        .color
        .as_ref()
        .map(|binding| build_scale(ctx, binding, style.fill));

    let mut group = Group::new("symbols");
    group.paint = Paint {
        opacity: Some(style.opacity),
        ..Default::default()
    };
    let mut marks = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rows.iter().enumerate() {
        let Some(center) = row_location(row, settings).and_then(|ll| ctx.projection.project(ll)) else {
            skipped += 1;
            continue;
        };
        let size = match (&size_scale, &settings.size) {
            (Some(scale), Some(binding)) => scale.size_for(row.get(&binding.column)),
            _ => style.size,
        };
        let fill = match (&color_scale, &settings.color) {
            (Some(scale), Some(binding)) => row
                .get(&binding.column)
                .and_then(|v| scale.color_for(v))
                .unwrap_or(style.fill),
            _ => style.fill,
        };
        let paint = Paint::fill(fill).with_stroke(style.stroke, style.stroke_width);
        group.children.push(symbol_node(format!("point-{i}"), style.shape, center, size, paint));
        marks.push(SymbolMark { row: i, center, size });
    }

    if skipped > 0 {
        crate::log::debug!(skipped, "rows without a valid location were not drawn");
    }

    SymbolLayer {
        node: Node::Group(group),
        marks,
        size_scale,
        color_scale,
    }
}

/// A single mark of `size` (its diameter or side) centered on `center`
pub fn symbol_node(id: String, shape: SymbolShape, center: DVec2, size: f64, paint: Paint) -> Node {
    let r = size / 2.0;
    let polygon = |pts: &[DVec2]| {
        let mut d = String::new();
        for (i, p) in pts.iter().enumerate() {
            d.push(if i == 0 { 'M' } else { 'L' });
            d.push_str(&format!("{},{}", fmt_num(p.x), fmt_num(p.y)));
        }
        d.push('Z');
        d
    };
    match shape {
        SymbolShape::Circle => Node::Circle(CircleNode {
            id: Some(id),
            class: Some("symbol".into()),
            center,
            radius: r,
            paint,
        }),
        SymbolShape::Square => Node::Rect(RectNode {
            id: Some(id),
            class: Some("symbol".into()),
            origin: center - DVec2::splat(r),
            size: DVec2::splat(size),
            paint,
            transform: None,
        }),
        SymbolShape::Triangle => Node::Path(PathNode {
            id: Some(id),
            class: Some("symbol".into()),
            d: polygon(&[
                center + dvec2(0.0, -r),
                center + dvec2(r, r),
                center + dvec2(-r, r),
            ]),
            paint,
            ..Default::default()
        }),
        SymbolShape::Diamond => Node::Path(PathNode {
            id: Some(id),
            class: Some("symbol".into()),
            d: polygon(&[
                center + dvec2(0.0, -r),
                center + dvec2(r, 0.0),
                center + dvec2(0.0, r),
                center + dvec2(-r, 0.0),
            ]),
            paint,
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Geocode, Value};

    #[test]
    fn location_requires_valid_coordinates() {
        let s = SymbolSettings::default();
        let ok = DataRow::default().with("latitude", 40.0).with("longitude", -75.0);
        assert_eq!(row_location(&ok, &s), Some(dvec2(-75.0, 40.0)));
        let bad = DataRow::default().with("latitude", 200.0).with("longitude", -75.0);
        assert_eq!(row_location(&bad, &s), None);
        let missing = DataRow::default().with("latitude", 40.0).with("longitude", Value::Null);
        assert_eq!(row_location(&missing, &s), None);
    }

    #[test]
    fn location_falls_back_to_geocode() {
        let s = SymbolSettings::default();
        let row = DataRow {
            geocode: Some(Geocode {
                latitude: Some(45.5),
                longitude: Some(-73.6),
                geocoded: true,
                source: Some("cache".into()),
            }),
            ..Default::default()
        };
        assert_eq!(row_location(&row, &s), Some(dvec2(-73.6, 45.5)));
    }

    #[test]
    fn diamond_path() {
        let node = symbol_node("p".into(), SymbolShape::Diamond, dvec2(10.0, 10.0), 4.0, Paint::default());
        let Node::Path(p) = node else { panic!("expected path") };
        insta::assert_snapshot!(p.d, @"M10,8L12,10L10,12L8,10Z");
    }
}
