//! Scene rendering for maps
//!
//! This module is organized into submodules:
//! - `defaults`: Default sizes, colors and layout constants
//! - `scene`: The immutable scene description and its diff
//! - `context`: RenderContext assembled once per render
//! - `basemap`, `choropleth`, `symbols`, `labels`, `legend`, `annotations`: layers
//! - `text`: Label metrics and placement
//! - `svg`: SVG serialization

pub mod annotations;
pub mod basemap;
pub mod choropleth;
pub mod context;
pub mod defaults;
pub mod labels;
pub mod legend;
pub mod scene;
pub mod svg;
pub mod symbols;
pub mod text;

pub use context::RenderContext;
pub use scene::{Def, Node, Scene, SceneChange};

use crate::cache::{CacheConfig, KeyCache};
use crate::data::Dataset;
use crate::errors::Notice;
use crate::geo::Geography;
use crate::geo::topology::Topology;
use crate::paths::DrawnPath;
use crate::settings::{Canvas, MapSettings, Styling};
use legend::{LegendKind, LegendSpec};

/// Everything one render reads. Nothing here is mutated by rendering.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    pub geography: Geography,
    /// Boundary data; symbol maps may render without it
    pub topology: Option<&'a Topology>,
    pub settings: &'a MapSettings,
    pub styling: &'a Styling,
    pub dataset: &'a Dataset,
    pub canvas: Canvas,
    pub paths: &'a [DrawnPath],
    pub selected_path: Option<&'a str>,
    pub selected_label: Option<&'a str>,
}

impl<'a> MapRequest<'a> {
    pub fn new(
        geography: Geography,
        settings: &'a MapSettings,
        styling: &'a Styling,
        dataset: &'a Dataset,
    ) -> Self {
        Self {
            geography,
            topology: None,
            settings,
            styling,
            dataset,
            canvas: Canvas::default(),
            paths: &[],
            selected_path: None,
            selected_label: None,
        }
    }

    pub fn with_topology(mut self, topology: &'a Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_paths(mut self, paths: &'a [DrawnPath]) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_selected_path(mut self, id: Option<&'a str>) -> Self {
        self.selected_path = id;
        self
    }

    pub fn with_selected_label(mut self, id: Option<&'a str>) -> Self {
        self.selected_label = id;
        self
    }
}

/// A rendered scene and the problems met while building it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub scene: Scene,
    pub notices: Vec<Notice>,
}

/// Render with a throwaway key cache
pub fn render_scene(request: &MapRequest<'_>) -> RenderOutput {
    let mut cache = KeyCache::new(CacheConfig::default());
    render_scene_with_cache(request, &mut cache)
}

/// Build the complete scene. Layers are drawn bottom to top: boundaries,
/// symbols, labels, drawn paths, legends. A failing layer leaves a notice
/// and an empty group; the others still render.
pub fn render_scene_with_cache(request: &MapRequest<'_>, cache: &mut KeyCache) -> RenderOutput {
    let mut notices = Vec::new();
    let ctx = RenderContext::build(request, &mut notices);

    let slots = choropleth::region_slots(&ctx);
    let ids = choropleth::region_ids(&slots);
    let join = choropleth::join(&ctx, &slots, cache);
    let boundaries = basemap::render_base(&ctx, &ids, &join.fills);

    let symbol_layer = match ctx.settings {
        MapSettings::Symbol(settings) => Some(symbols::render_symbols(&ctx, settings)),
        MapSettings::Choropleth(_) | MapSettings::Custom(_) => None,
    };

    let mut scene = Scene::new(ctx.canvas.width, ctx.canvas.height);
    scene.background = Some(ctx.styling.base.background);
    if let Some((id, d)) = &ctx.clip {
        scene.add_def(Def::ClipPath {
            id: id.clone(),
            d: d.clone(),
        });
    }

    scene.children.push(boundaries);
    let symbol_labels = match &symbol_layer {
        Some(layer) => {
            scene.children.push(layer.node.clone());
            labels::render_symbol_labels(&ctx, &layer.marks)
        }
        None => Node::Group(scene::Group::new("symbol-labels")),
    };
    scene
        .children
        .push(labels::render_choropleth_labels(&ctx, &slots, &join));
    scene.children.push(symbol_labels);

    let (paths, path_defs) = annotations::render_paths(&ctx, request.paths);
    scene.children.push(paths);
    for def in path_defs {
        scene.add_def(def);
    }

    if ctx.styling.show_legends {
        let specs = legend_specs(&ctx, symbol_layer.as_ref(), join.scale.as_ref());
        let legends = legend::render_legends(&ctx, &specs);
        scene.height += legends.height;
        scene.children.push(legends.node);
        for def in legends.defs {
            scene.add_def(def);
        }
    }

    crate::log::debug!(
        nodes = scene.children.len(),
        defs = scene.defs.len(),
        notices = notices.len(),
        "scene rendered"
    );
    RenderOutput { scene, notices }
}

/// Panels for every active scale: size, then symbol color, then choropleth
fn legend_specs<'s>(
    ctx: &'s RenderContext<'_>,
    symbols: Option<&'s symbols::SymbolLayer>,
    choropleth: Option<&'s crate::scale::ColorScale>,
) -> Vec<LegendSpec<'s>> {
    let mut specs = Vec::new();
    if let (Some(layer), MapSettings::Symbol(settings)) = (symbols, ctx.settings) {
        if let (Some(scale), Some(binding)) = (&layer.size_scale, &settings.size) {
            specs.push(LegendSpec {
                id: "legend-size",
                column: &binding.column,
                kind: LegendKind::Size(scale),
            });
        }
        if let (Some(scale), Some(binding)) = (&layer.color_scale, &settings.color) {
            specs.push(LegendSpec {
                id: "legend-symbol-color",
                column: &binding.column,
                kind: LegendKind::Color {
                    scale,
                    gradient: "symbol",
                },
            });
        }
    }
    let binding = ctx.settings.choropleth().and_then(|c| c.color.as_ref());
    if let (Some(scale), Some(binding)) = (choropleth, binding) {
        specs.push(LegendSpec {
            id: "legend-choropleth-color",
            column: &binding.column,
            kind: LegendKind::Color {
                scale,
                gradient: "choropleth",
            },
        });
    }
    specs
}
