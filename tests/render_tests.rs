//! End-to-end renders over small inline topologies
//!
//! Run with logging: RUST_LOG=cartograph=debug cargo test --features tracing -- --nocapture

use cartograph::color::Color;
use cartograph::data::{ColumnType, DataRow, Dataset, Value};
use cartograph::format::{ColumnFormat, NumberFormat};
use cartograph::geo::projection::ProjectionKind;
use cartograph::render::defaults;
use cartograph::render::scene::{Def, Fill, Node, SceneChange, TextAnchor, TextNode};
use cartograph::scale::{ColorScaleConfig, ContinuousConfig};
use cartograph::settings::{
    ChoroplethSettings, ColorBinding, CustomSettings, LabelAlignment, LabelOverride, SymbolSettings,
};
use cartograph::{
    Canvas, DrawnPath, Geography, KeyCache, Layer, MapRequest, MapSettings, PathOverride, PathPoint,
    Scene, Styling, StylingEditor, Topology, render_map, render_map_with_cache, render_svg,
};
use glam::{DVec2, dvec2};

const BLUE: Color = Color::rgb(0, 0, 255);

/// California and Nevada as two rectangles sharing one border arc
const TWO_STATES: &str = r#"{
  "type": "Topology",
  "arcs": [
    [[-119, 35], [-119, 40]],
    [[-119, 40], [-124, 40], [-124, 35], [-119, 35]],
    [[-119, 35], [-114, 35], [-114, 40], [-119, 40]]
  ],
  "objects": {
    "nation": {
      "type": "GeometryCollection",
      "geometries": [{ "type": "Polygon", "arcs": [[1, 2]] }]
    },
    "states": {
      "type": "GeometryCollection",
      "geometries": [
        { "type": "Polygon", "id": "06", "properties": { "name": "California" }, "arcs": [[0, 1]] },
        { "type": "Polygon", "id": "32", "properties": { "name": "Nevada" }, "arcs": [[-1, 2]] }
      ]
    }
  }
}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn topology() -> Topology {
    Topology::from_json(TWO_STATES).unwrap()
}

fn white_to_blue(column: &str) -> ColorBinding {
    ColorBinding {
        column: column.into(),
        scale: ColorScaleConfig::Continuous(ContinuousConfig {
            min: Some(0.0),
            max: Some(100.0),
            min_color: Color::WHITE,
            max_color: BLUE,
            ..Default::default()
        }),
    }
}

fn choropleth(template: Option<&str>) -> MapSettings {
    MapSettings::Choropleth(ChoroplethSettings {
        region_column: "state".into(),
        color: Some(white_to_blue("value")),
        label_template: template.map(str::to_string),
    })
}

fn state_rows(value: f64) -> Dataset {
    Dataset::new(vec![
        DataRow::default().with("state", "California").with("value", value),
    ])
    .with_type("value", ColumnType::Number)
}

fn fill_of(scene: &Scene, id: &str) -> Option<Fill> {
    match scene.find(id)? {
        Node::Path(p) => p.paint.fill.clone(),
        Node::Group(g) => g.paint.fill.clone(),
        _ => None,
    }
}

fn text_of(node: &Node) -> Vec<String> {
    let Node::Text(TextNode { lines, .. }) = node else {
        panic!("expected a text node, got {node:?}");
    };
    lines
        .iter()
        .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect())
        .collect()
}

// =============================================================================
// Choropleth
// =============================================================================

#[test]
fn california_by_name_fills_halfway_to_blue() {
    init_tracing();
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling::default();
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);

    let out = render_map(&request);
    assert!(out.notices.is_empty(), "{:?}", out.notices);
    assert_eq!(
        fill_of(&out.scene, "region-CA"),
        Some(Fill::Color(Color::WHITE.mix(BLUE, 0.5)))
    );
    // unmatched regions keep the default fill
    assert_eq!(
        fill_of(&out.scene, "region-NV"),
        Some(Fill::Color(styling.base.region_fill))
    );
}

#[test]
fn region_codes_in_any_form_join_the_same_region() {
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling::default();
    let mut fills = Vec::new();
    for raw in ["California", "ca", "CA", "06", "6"] {
        let data = Dataset::new(vec![DataRow::default().with("state", raw).with("value", 100.0)]);
        let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
        fills.push(fill_of(&render_map(&request).scene, "region-CA"));
    }
    assert!(fills.iter().all(|f| *f == Some(Fill::Color(BLUE))), "{fills:?}");
}

#[test]
fn shared_border_is_drawn_once() {
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling::default();
    let data = state_rows(10.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    let out = render_map(&request);
    let Some(Node::Path(borders)) = out.scene.find("borders") else {
        panic!("expected a borders path");
    };
    assert_eq!(borders.d.matches('M').count(), 1);
}

#[test]
fn choropleth_legend_sits_below_the_map() {
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling::default();
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    let out = render_map(&request);

    assert!(out.scene.find("legend-choropleth-color").is_some());
    assert!(out.scene.height > defaults::CANVAS_HEIGHT);
    assert!(
        out.scene
            .defs
            .iter()
            .any(|d| matches!(d, Def::LinearGradient { id, .. } if id == "legend-gradient-choropleth"))
    );

    let hidden = Styling {
        show_legends: false,
        ..Styling::default()
    };
    let request = MapRequest::new(Geography::UsaStates, &settings, &hidden, &data).with_topology(&topology);
    let out = render_map(&request);
    assert!(out.scene.find("legend-choropleth-color").is_none());
    assert_eq!(out.scene.height, defaults::CANVAS_HEIGHT);
}

#[test]
fn clipping_installs_the_country_outline() {
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling {
        projection: Some(ProjectionKind::Equirectangular),
        clip_to_country: true,
        ..Styling::default()
    };
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    let out = render_map(&request);
    assert!(out.scene.defs.iter().any(|d| matches!(d, Def::ClipPath { .. })));
    let Some(Node::Group(boundaries)) = out.scene.find("boundaries") else {
        panic!("expected boundaries group");
    };
    assert!(boundaries.clip_path.is_some());
}

// =============================================================================
// Labels
// =============================================================================

#[test]
fn symbol_label_uses_compact_format() {
    let settings = MapSettings::Symbol(SymbolSettings {
        label_template: Some("{name}: {value}".into()),
        ..Default::default()
    });
    let styling = Styling::default();
    let data = Dataset::new(vec![
        DataRow::default()
            .with("name", "X")
            .with("value", 1500.0)
            .with("latitude", 38.0)
            .with("longitude", -100.0),
    ])
    .with_type("value", ColumnType::Number)
    .with_format("value", ColumnFormat::Number(NumberFormat::Compact));
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data);

    let out = render_map(&request);
    let label = out.scene.find("symbol-0").expect("label rendered");
    assert_eq!(text_of(label), ["X: 1.5K"]);
}

#[test]
fn region_labels_are_keyed_by_region() {
    let topology = topology();
    let settings = choropleth(Some("<b>{state}</b>\n{value}"));
    let styling = Styling::default();
    let data = state_rows(42.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    let out = render_map(&request);
    let label = out.scene.find("choropleth-CA").expect("label rendered");
    assert_eq!(text_of(label), ["California", "42"]);
    assert!(out.scene.find("choropleth-NV").is_none());
}

#[test]
fn auto_label_near_right_edge_goes_left() {
    let settings = MapSettings::Symbol(SymbolSettings {
        label_template: Some("{name}".into()),
        ..Default::default()
    });
    let mut styling = Styling {
        projection: Some(ProjectionKind::Equirectangular),
        ..Styling::default()
    };
    styling.label.alignment = LabelAlignment::Auto;
    let data = Dataset::new(vec![
        DataRow::default()
            .with("name", "A fairly long label")
            .with("latitude", 0.0)
            .with("longitude", 60.0),
    ]);
    let canvas = Canvas {
        width: 400.0,
        height: 300.0,
    };
    let request = MapRequest::new(Geography::World, &settings, &styling, &data).with_canvas(canvas);
    let out = render_map(&request);

    let Some(Node::Circle(symbol)) = out.scene.find("point-0") else {
        panic!("expected the symbol");
    };
    assert!(symbol.center.x > 300.0, "symbol at {}", symbol.center);
    let Some(Node::Text(label)) = out.scene.find("symbol-0") else {
        panic!("expected the label");
    };
    assert_eq!(label.anchor, TextAnchor::End);
    assert!(label.lines[0].position.x < symbol.center.x);
}

#[test]
fn reset_label_override_renders_like_no_override() {
    let settings = MapSettings::Symbol(SymbolSettings {
        label_template: Some("{name}".into()),
        ..Default::default()
    });
    let data = Dataset::new(vec![
        DataRow::default()
            .with("name", "Philadelphia")
            .with("latitude", 39.95)
            .with("longitude", -75.16),
    ]);
    let plain = Styling::default();
    let mut edited = Styling::default();
    edited.label_overrides.insert(
        "symbol-0".into(),
        LabelOverride {
            position: Some(dvec2(5.0, 5.0)),
            font_size: Some(30.0),
            ..Default::default()
        },
    );

    let render = |styling: &Styling| render_map(&MapRequest::new(Geography::UsaStates, &settings, styling, &data)).scene;
    let before = render(&plain);
    assert_ne!(render(&edited), before);
    edited.reset_label("symbol-0");
    assert_eq!(render(&edited), before);
}

// =============================================================================
// Symbols
// =============================================================================

#[test]
fn out_of_range_latitude_is_not_drawn() {
    let settings = MapSettings::Symbol(SymbolSettings::default());
    let styling = Styling::default();
    let data = Dataset::new(vec![
        DataRow::default().with("latitude", 40.0).with("longitude", -100.0),
        DataRow::default().with("latitude", 200.0).with("longitude", -100.0),
        DataRow::default().with("latitude", Value::Null).with("longitude", -100.0),
    ]);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data);
    let out = render_map(&request);
    let Some(Node::Group(symbols)) = out.scene.find("symbols") else {
        panic!("expected symbols group");
    };
    let ids: Vec<_> = symbols.children.iter().filter_map(Node::id).collect();
    assert_eq!(ids, ["point-0"]);
}

// =============================================================================
// Errors stay local to their layer
// =============================================================================

#[test]
fn missing_topology_is_reported_and_other_layers_render() {
    let settings = choropleth(None);
    let styling = Styling::default();
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data);
    let out = render_map(&request);

    assert_eq!(out.notices.len(), 1);
    assert_eq!(out.notices[0].layer, Layer::Boundaries);
    assert!(out.scene.find("boundaries").is_some());
    assert!(out.scene.find("legend-choropleth-color").is_some());
}

/// California plus Puerto Rico, which the composite US projection has no inset for
const WITH_PUERTO_RICO: &str = r#"{
  "type": "Topology",
  "arcs": [
    [[-119, 35], [-124, 35], [-124, 40], [-119, 40], [-119, 35]],
    [[-67, 18], [-65, 18], [-65, 18.5], [-67, 18.5], [-67, 18]]
  ],
  "objects": {
    "nation": {
      "type": "GeometryCollection",
      "geometries": [{ "type": "Polygon", "arcs": [[0]] }]
    },
    "states": {
      "type": "GeometryCollection",
      "geometries": [
        { "type": "Polygon", "id": "06", "properties": { "name": "California" }, "arcs": [[0]] },
        { "type": "Polygon", "id": "72", "properties": { "name": "Puerto Rico" }, "arcs": [[1]] }
      ]
    }
  }
}"#;

#[test]
fn regions_outside_the_projection_are_reported() {
    let topology = Topology::from_json(WITH_PUERTO_RICO).unwrap();
    let settings = choropleth(None);
    let styling = Styling::default();
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    let out = render_map(&request);

    assert_eq!(out.notices.len(), 1, "{:?}", out.notices);
    assert_eq!(out.notices[0].layer, Layer::Boundaries);
    assert!(out.notices[0].message.contains("PR"), "{}", out.notices[0].message);
    assert!(!out.notices[0].message.contains("CA"));
    assert!(fill_of(&out.scene, "region-CA").is_some());

    // The same topology under a world projection places every region
    let styling = Styling {
        projection: Some(ProjectionKind::Equirectangular),
        ..Styling::default()
    };
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);
    assert!(render_map(&request).notices.is_empty());
}

#[test]
fn malformed_custom_map_is_reported_once() {
    let settings = MapSettings::Custom(CustomSettings {
        markup: "<svg><g id=\"map\"><path id=\"CA\" d=\"M0,0L1,1Z\"></g>".into(),
        choropleth: ChoroplethSettings {
            region_column: "state".into(),
            color: Some(white_to_blue("value")),
            label_template: None,
        },
    });
    let styling = Styling::default();
    let data = state_rows(50.0);
    let paths = [DrawnPath::new("note", vec![PathPoint::line(DVec2::ZERO), PathPoint::line(dvec2(10.0, 10.0))])];
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_paths(&paths);
    let out = render_map(&request);

    assert_eq!(out.notices.len(), 1);
    assert_eq!(out.notices[0].layer, Layer::CustomMap);
    assert_eq!(out.notices[0].code.as_deref(), Some("cartograph::custom_map::malformed"));
    assert!(out.scene.find("note").is_some());
}

#[test]
fn custom_map_regions_are_filled() {
    let settings = MapSettings::Custom(CustomSettings {
        markup: r#"<svg viewBox="0 0 100 50">
  <g id="map">
    <path id="california" d="M0,0 L40,0 L40,40 Z"/>
    <rect id="state-nv" x="50" y="0" width="40" height="40"/>
  </g>
</svg>"#
            .into(),
        choropleth: ChoroplethSettings {
            region_column: "state".into(),
            color: Some(white_to_blue("value")),
            label_template: Some("{state}".into()),
        },
    });
    let styling = Styling::default();
    let data = Dataset::new(vec![DataRow::default().with("state", "NV").with("value", 100.0)]);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data);
    let out = render_map(&request);

    assert!(out.notices.is_empty(), "{:?}", out.notices);
    assert_eq!(fill_of(&out.scene, "region-NV"), Some(Fill::Color(BLUE)));
    assert_eq!(
        fill_of(&out.scene, "region-CA"),
        Some(Fill::Color(styling.base.region_fill))
    );
    assert!(out.scene.find("choropleth-NV").is_some());
}

// =============================================================================
// Drawn paths
// =============================================================================

#[test]
fn drawn_paths_render_markers_and_overrides() {
    let settings = MapSettings::Symbol(SymbolSettings::default());
    let mut path = DrawnPath::new(
        "route",
        vec![
            PathPoint::line(dvec2(10.0, 10.0)),
            PathPoint::quad(dvec2(30.0, 0.0), dvec2(50.0, 10.0)),
        ],
    );
    path.style.end_marker = cartograph::paths::MarkerKind::Arrow;
    let mut styling = Styling::default();
    styling.path_overrides.insert(
        "route".into(),
        PathOverride {
            offset: Some(dvec2(5.0, 0.0)),
            ..Default::default()
        },
    );
    let data = Dataset::default();
    let paths = [path];
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data)
        .with_paths(&paths)
        .with_selected_path(Some("route"));
    let out = render_map(&request);

    let Some(Node::Group(group)) = out.scene.find("route") else {
        panic!("expected the path group");
    };
    let Some(Node::Path(stroke)) = group.children.first() else {
        panic!("expected the stroke");
    };
    insta::assert_snapshot!(stroke.d, @"M15,10Q35,0 55,10");
    assert!(stroke.marker_end.is_some());
    assert!(out.scene.defs.iter().any(|d| matches!(d, Def::Marker(_))));
    assert!(out.scene.find("route-point-1").is_some());
    assert!(out.scene.find("route-control-1-1").is_some());
}

fn stroke_of(scene: &Scene, id: &str) -> cartograph::render::scene::PathNode {
    let Some(Node::Group(group)) = scene.find(id) else {
        panic!("expected the {id} group");
    };
    group
        .children
        .iter()
        .find_map(|c| match c {
            Node::Path(p) if p.class.as_deref() == Some("stroke") => Some(p.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("{id} has no stroke"))
}

#[test]
fn apply_to_all_makes_every_path_render_alike() {
    let settings = MapSettings::Symbol(SymbolSettings::default());
    let data = Dataset::default();
    let red = Color::rgb(255, 0, 0);
    let mut styling = Styling::default();
    styling.path_overrides.insert(
        "a".into(),
        PathOverride {
            stroke: Some(red),
            ..Default::default()
        },
    );
    styling.path_overrides.insert(
        "b".into(),
        PathOverride {
            stroke_width: Some(9.0),
            offset: Some(dvec2(0.0, 20.0)),
            ..Default::default()
        },
    );
    let mut paths = vec![
        DrawnPath::new("a", vec![PathPoint::line(dvec2(0.0, 0.0)), PathPoint::line(dvec2(10.0, 0.0))]),
        DrawnPath::new("b", vec![PathPoint::line(dvec2(0.0, 0.0)), PathPoint::line(dvec2(10.0, 0.0))]),
    ];
    paths[0].style.end_marker = cartograph::paths::MarkerKind::Arrow;

    let mut editor = StylingEditor::new(&mut styling, &mut paths);
    assert!(editor.apply_style_to_all("a"));

    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_paths(&paths);
    let scene = render_map(&request).scene;
    let a = stroke_of(&scene, "a");
    let b = stroke_of(&scene, "b");
    assert_eq!(a.paint, b.paint);
    assert_eq!(b.paint.stroke, Some(red));
    assert_eq!(a.marker_end.is_some(), b.marker_end.is_some());
    // geometry and offset of the target survive
    assert_eq!(b.d, "M0,20L10,20");
    assert_eq!(styling.path_overrides["b"].offset, Some(dvec2(0.0, 20.0)));
}

// =============================================================================
// Idempotence and diffing
// =============================================================================

#[test]
fn same_inputs_render_identically() {
    let topology = topology();
    let settings = choropleth(Some("{state}: {value}"));
    let styling = Styling::default();
    let data = state_rows(50.0);
    let request = MapRequest::new(Geography::UsaStates, &settings, &styling, &data).with_topology(&topology);

    let (a, _) = render_svg(&request);
    let (b, _) = render_svg(&request);
    assert_eq!(a, b);
    assert!(a.starts_with("<svg"));

    let mut cache = KeyCache::default();
    let first = render_map_with_cache(&request, &mut cache);
    let second = render_map_with_cache(&request, &mut cache);
    assert_eq!(first, second);
    assert!(cache.stats().0 > 0);
    assert!(Scene::diff(&first.scene, &second.scene).is_empty());
}

#[test]
fn changing_one_value_changes_only_its_region() {
    let topology = topology();
    let settings = choropleth(None);
    let styling = Styling {
        show_legends: false,
        ..Styling::default()
    };
    let before_data = state_rows(10.0);
    let after_data = state_rows(90.0);
    let render = |data: &Dataset| {
        render_map(&MapRequest::new(Geography::UsaStates, &settings, &styling, data).with_topology(&topology)).scene
    };
    let changes = Scene::diff(&render(&before_data), &render(&after_data));
    assert_eq!(changes, vec![SceneChange::Changed { id: "region-CA".into() }]);
}
