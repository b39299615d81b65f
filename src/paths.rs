//! Freehand annotation paths: the point/curve model and its edit operations.
//!
//! Control points are stored in absolute canvas coordinates. Moving a
//! vertex carries its own control points along; moving a path translates
//! everything.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::render::defaults;

/// A path vertex. With no control points the segment arriving here is a
/// straight line, with one a quadratic curve, with two a cubic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub at: DVec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c1: Option<DVec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c2: Option<DVec2>,
}

impl PathPoint {
    pub fn line(at: DVec2) -> Self {
        Self { at, c1: None, c2: None }
    }

    pub fn quad(control: DVec2, at: DVec2) -> Self {
        Self {
            at,
            c1: Some(control),
            c2: None,
        }
    }

    pub fn cubic(c1: DVec2, c2: DVec2, at: DVec2) -> Self {
        Self {
            at,
            c1: Some(c1),
            c2: Some(c2),
        }
    }

    pub fn controls(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.c1.iter().chain(self.c2.iter()).copied()
    }

    /// Move the vertex and its own control points together
    pub fn translate(&mut self, delta: DVec2) {
        self.at += delta;
        if let Some(c) = &mut self.c1 {
            *c += delta;
        }
        if let Some(c) = &mut self.c2 {
            *c += delta;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    #[default]
    None,
    Arrow,
    OpenArrow,
    Circle,
    Square,
    Diamond,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathStyle {
    pub stroke: Color,
    pub stroke_width: f64,
    pub dash: Option<String>,
    pub fill: Color,
    pub opacity: f64,
    pub closed: bool,
    pub start_marker: MarkerKind,
    pub end_marker: MarkerKind,
    /// Point the start marker along the path instead of away from it
    pub mirror_start: bool,
    /// Point the end marker back along the path
    pub mirror_end: bool,
    pub outline_color: Color,
    /// Zero disables the outline stroke
    pub outline_width: f64,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke: defaults::PATH_STROKE,
            stroke_width: defaults::PATH_STROKE_WIDTH,
            dash: None,
            fill: Color::None,
            opacity: 1.0,
            closed: false,
            start_marker: MarkerKind::None,
            end_marker: MarkerKind::None,
            mirror_start: false,
            mirror_end: false,
            outline_color: defaults::PATH_OUTLINE,
            outline_width: 0.0,
        }
    }
}

/// A drawn annotation path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnPath {
    pub id: String,
    pub points: Vec<PathPoint>,
    #[serde(default)]
    pub style: PathStyle,
}

impl DrawnPath {
    pub fn new(id: impl Into<String>, points: Vec<PathPoint>) -> Self {
        Self {
            id: id.into(),
            points,
            style: PathStyle::default(),
        }
    }

    /// Translate every vertex and control point by the same delta
    pub fn translate(&mut self, delta: DVec2) {
        for p in &mut self.points {
            p.translate(delta);
        }
    }

    /// Move one vertex (and its control points); others are untouched.
    /// Returns false if `index` is out of range.
    pub fn move_point(&mut self, index: usize, to: DVec2) -> bool {
        match self.points.get_mut(index) {
            Some(p) => {
                let delta = to - p.at;
                p.translate(delta);
                true
            }
            None => false,
        }
    }

    /// Move a single control point (1 or 2) of a vertex
    pub fn move_control(&mut self, index: usize, which: u8, to: DVec2) -> bool {
        let Some(p) = self.points.get_mut(index) else {
            return false;
        };
        let slot = match which {
            1 => &mut p.c1,
            2 => &mut p.c2,
            _ => return false,
        };
        match slot {
            Some(c) => {
                *c = to;
                true
            }
            None => false,
        }
    }
}

/// Per-path override: a translation plus any style field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PathOverride {
    pub offset: Option<DVec2>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub dash: Option<String>,
    pub fill: Option<Color>,
    pub opacity: Option<f64>,
    pub closed: Option<bool>,
    pub start_marker: Option<MarkerKind>,
    pub end_marker: Option<MarkerKind>,
    pub mirror_start: Option<bool>,
    pub mirror_end: Option<bool>,
    pub outline_color: Option<Color>,
    pub outline_width: Option<f64>,
}

impl PathOverride {
    pub fn apply(&self, base: &PathStyle) -> PathStyle {
        PathStyle {
            stroke: self.stroke.unwrap_or(base.stroke),
            stroke_width: self.stroke_width.unwrap_or(base.stroke_width),
            dash: self.dash.clone().or_else(|| base.dash.clone()),
            fill: self.fill.unwrap_or(base.fill),
            opacity: self.opacity.unwrap_or(base.opacity),
            closed: self.closed.unwrap_or(base.closed),
            start_marker: self.start_marker.unwrap_or(base.start_marker),
            end_marker: self.end_marker.unwrap_or(base.end_marker),
            mirror_start: self.mirror_start.unwrap_or(base.mirror_start),
            mirror_end: self.mirror_end.unwrap_or(base.mirror_end),
            outline_color: self.outline_color.unwrap_or(base.outline_color),
            outline_width: self.outline_width.unwrap_or(base.outline_width),
        }
    }

    /// The same override with every style field cleared; only the offset stays
    pub fn geometry_only(&self) -> PathOverride {
        PathOverride {
            offset: self.offset,
            ..Default::default()
        }
    }
}

/// Copy the rendered style of `source_id` (its base style with its override
/// applied) onto every other path. Style fields in the other paths'
/// overrides are cleared so the copied style shows; their offsets and points
/// are kept. Returns false when no path has that id.
pub fn apply_style_to_all(
    source_id: &str,
    paths: &mut [DrawnPath],
    overrides: &mut BTreeMap<String, PathOverride>,
) -> bool {
    let Some(source) = paths.iter().find(|p| p.id == source_id) else {
        return false;
    };
    let style = match overrides.get(source_id) {
        Some(o) => o.apply(&source.style),
        None => source.style.clone(),
    };
    for path in paths.iter_mut().filter(|p| p.id != source_id) {
        path.style = style.clone();
        if let Some(o) = overrides.get_mut(&path.id) {
            *o = o.geometry_only();
            if o.offset.is_none() {
                overrides.remove(&path.id);
            }
        }
    }
    true
}
