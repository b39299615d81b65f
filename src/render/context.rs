//! Render context: everything a layer reads, assembled once per scene

use glam::DVec2;

use super::text::LabelMetrics;
use super::{MapRequest, defaults};
use crate::data::{DataRow, Dataset};
use crate::errors::{Layer, LayerError, Notice, Severity, TopologyError};
use crate::format::format_value;
use crate::geo::custom::{CustomMap, parse_custom_map};
use crate::geo::path::GeoPath;
use crate::geo::projection::{Projection, ProjectionKind};
use crate::geo::resolve::{RegionFeature, ResolvedGeography, resolve};
use crate::geo::{Feature, Geography};
use crate::settings::{Canvas, LabelOverride, LabelStyle, MapSettings, Styling};
use crate::template::{RichText, Template};
use crate::types::BBox;

/// Id of the clip path installed when clipping to a country
pub const CLIP_ID: &str = "country-clip";

/// The boundary layer's source geometry
#[derive(Debug, Clone)]
pub enum BaseMap {
    /// Nothing to draw (missing or broken boundary data)
    Empty,
    Topology(ResolvedGeography),
    /// A custom map placed on the canvas with `scale` then `offset`
    Custom {
        map: CustomMap,
        scale: f64,
        offset: DVec2,
    },
}

/// Read-only state shared by every layer of one render
pub struct RenderContext<'a> {
    pub geography: Geography,
    pub settings: &'a MapSettings,
    pub styling: &'a Styling,
    pub dataset: &'a Dataset,
    pub canvas: Canvas,
    pub projection: Projection,
    pub base: BaseMap,
    /// Clip path installed on the boundary layer, with its path data
    pub clip: Option<(String, String)>,
    /// Label template, parsed once
    pub template: Option<Template>,
    pub selected_path: Option<&'a str>,
    pub selected_label: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    /// Resolve boundaries and fit the projection. Boundary failures become
    /// notices and leave an empty base map.
    pub fn build(request: &MapRequest<'a>, notices: &mut Vec<Notice>) -> Self {
        let geography = request.geography;
        let styling = request.styling;
        let canvas = request.canvas;
        let kind = styling
            .projection
            .unwrap_or_else(|| ProjectionKind::default_for(geography));
        let mut projection = Projection::new(kind, geography, canvas.size());

        let base = match load_base(request) {
            Ok(base) => base,
            Err(err) => {
                crate::log::warn!(error = %err, "boundary layer unavailable");
                notices.push(Notice::from_diagnostic(err.layer(), Severity::Error, &err));
                BaseMap::Empty
            }
        };

        let extent = BBox::from_origin_size(DVec2::ZERO, canvas.size()).inset(defaults::FIT_PADDING);
        let mut clip = None;
        match &base {
            BaseMap::Topology(resolved) => {
                notices.extend(resolved.notices.iter().cloned());
                let clip_feature = resolved
                    .clip
                    .as_ref()
                    .filter(|_| styling.clip_to_country && kind.is_clippable());
                if let Some(feature) = clip_feature {
                    if projection.fit_extent(extent, [feature]) {
                        clip = clip_data(&projection, feature).map(|d| (CLIP_ID.to_string(), d));
                    }
                } else {
                    let features: Vec<&Feature> = resolved
                        .regions
                        .iter()
                        .map(|r| &r.feature)
                        .chain(resolved.nation.as_ref())
                        .collect();
                    projection.fit_extent(extent, features);
                }
                let hidden = unprojectable_regions(&projection, &resolved.regions);
                if !hidden.is_empty() {
                    crate::log::warn!(regions = ?hidden, projection = ?kind, "regions outside the projection");
                    notices.push(Notice::warning(
                        Layer::Boundaries,
                        format!("not shown by this projection: {}", hidden.join(", ")),
                    ));
                }
            }
            BaseMap::Custom { .. } | BaseMap::Empty => {}
        }

        crate::log::debug!(
            geography = %geography,
            projection = ?kind,
            scale = projection.scale,
            clipped = clip.is_some(),
            "render context ready"
        );

        Self {
            geography,
            settings: request.settings,
            styling,
            dataset: request.dataset,
            canvas,
            projection,
            base,
            clip,
            template: request
                .settings
                .label_template()
                .filter(|t| !t.trim().is_empty())
                .map(Template::parse),
            selected_path: request.selected_path,
            selected_label: request.selected_label,
        }
    }

    pub fn metrics(&self) -> &LabelMetrics {
        &self.styling.metrics
    }

    /// The map area (legends extend below it)
    pub fn map_bounds(&self) -> BBox {
        BBox::from_origin_size(DVec2::ZERO, self.canvas.size())
    }

    /// Display text for a cell, formatted per its column type and format
    pub fn format_cell(&self, row: &DataRow, column: &str) -> Option<String> {
        let value = row.get(column)?;
        Some(format_value(
            value,
            self.dataset.column_type(column),
            self.dataset.column_format(column),
            self.geography,
        ))
    }

    /// Expand the label template against a row; `None` when there is no
    /// template or the result is blank
    pub fn label_text(&self, row: &DataRow) -> Option<RichText> {
        let text = self
            .template
            .as_ref()?
            .expand(|column| self.format_cell(row, column));
        (!text.is_empty()).then_some(text)
    }

    /// Effective label style and the override that produced it
    pub fn label_style(&self, id: &str) -> (LabelStyle, Option<&'a LabelOverride>) {
        let styling: &'a Styling = self.styling;
        match styling.label_overrides.get(id) {
            Some(o) => (o.apply(&styling.label), Some(o)),
            None => (styling.label.clone(), None),
        }
    }

    /// Map a custom-map coordinate onto the canvas
    pub fn custom_to_canvas(&self, p: DVec2) -> DVec2 {
        match &self.base {
            BaseMap::Custom { scale, offset, .. } => *offset + p * *scale,
            _ => p,
        }
    }
}

fn load_base(request: &MapRequest<'_>) -> Result<BaseMap, LayerError> {
    if let MapSettings::Custom(custom) = request.settings {
        let map = parse_custom_map(&custom.markup, request.geography)?;
        let (scale, offset) = map.fit(request.canvas.size());
        return Ok(BaseMap::Custom { map, scale, offset });
    }
    match request.topology {
        Some(topology) => Ok(BaseMap::Topology(resolve(request.geography, topology)?)),
        // Symbol maps can be drawn on a bare projection
        None if matches!(request.settings, MapSettings::Symbol(_)) => Ok(BaseMap::Empty),
        None => Err(TopologyError::Missing {
            geography: request.geography,
        }
        .into()),
    }
}

/// Keys of regions that have vertices but none the projection can place
fn unprojectable_regions(projection: &Projection, regions: &[RegionFeature]) -> Vec<String> {
    regions
        .iter()
        .filter(|region| {
            let Some(geometry) = &region.feature.geometry else {
                return false;
            };
            let (mut seen, mut placed) = (false, false);
            geometry.for_each_point(&mut |p| {
                seen = true;
                placed |= projection.project(p).is_some();
            });
            seen && !placed
        })
        .map(|region| region.key().to_string())
        .collect()
}

fn clip_data(projection: &Projection, feature: &Feature) -> Option<String> {
    let d = GeoPath::new(projection).data(feature.geometry.as_ref()?);
    (!d.is_empty()).then_some(d)
}

/// Offset used when a label has no symbol to clear
pub fn region_label_margin() -> f64 {
    defaults::LABEL_GAP
}

/// Offset between a symbol's center and its label
pub fn symbol_label_margin(size: f64) -> f64 {
    size / 2.0 + defaults::LABEL_GAP
}
