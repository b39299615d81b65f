//! Cartographic rendering core.
//!
//! Turns a geography selection, boundary data, tabular rows and styling into
//! an immutable [`Scene`]: base map, choropleth fills, sized symbols, labels,
//! legends and freehand annotation paths. Hosts serialize the scene to SVG or
//! diff it against the previous one and patch only what changed.

use pest_derive::Parser;

pub mod cache;
pub mod color;
pub mod data;
pub mod errors;
pub mod format;
pub mod geo;
pub mod interact;
pub mod log;
pub mod paths;
pub mod render;
pub mod scale;
pub mod settings;
pub mod template;
pub mod types;
pub mod values;

pub use cache::{CacheConfig, KeyCache};
pub use color::Color;
pub use data::{ColumnType, DataRow, Dataset, Value};
pub use errors::{CustomMapError, Layer, LayerError, Notice, SettingsError, Severity, TopologyError};
pub use geo::{Geography, Topology};
pub use interact::{EditSink, LabelDrag, PathDrag, PointDrag, PointTarget, StylingEditor};
pub use paths::{DrawnPath, PathOverride, PathPoint, PathStyle, apply_style_to_all};
pub use render::scene::{Node, Scene, SceneChange};
pub use render::{MapRequest, RenderOutput};
pub use settings::{Canvas, LabelOverride, MapSettings, Styling};

/// Label template grammar
#[derive(Parser)]
#[grammar = "template.pest"]
pub struct TemplateParser;

/// Render a map to an immutable scene.
///
/// Never fails: a layer that cannot be drawn is left empty and reported in
/// [`RenderOutput::notices`]. Rendering the same request twice yields equal
/// scenes.
pub fn render_map(request: &MapRequest<'_>) -> RenderOutput {
    render::render_scene(request)
}

/// [`render_map`] with a caller-owned key cache kept across renders
pub fn render_map_with_cache(request: &MapRequest<'_>, cache: &mut KeyCache) -> RenderOutput {
    render::render_scene_with_cache(request, cache)
}

/// Render a map straight to an SVG document
pub fn render_svg(request: &MapRequest<'_>) -> (String, Vec<Notice>) {
    let RenderOutput { scene, notices } = render_map(request);
    (render::svg::write_svg(&scene), notices)
}
