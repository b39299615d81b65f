//! Map and styling settings.
//!
//! Map settings are a tagged enum with a closed field set per map kind.
//! Styling carries visual defaults plus the per-label and per-path override
//! maps, keyed by stable ids. Every type here loads from camelCase JSON with
//! defaults filled in.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::errors::SettingsError;
use crate::geo::projection::ProjectionKind;
use crate::paths::PathOverride;
use crate::render::defaults;
use crate::render::text::LabelMetrics;
use crate::scale::{ColorScaleConfig, SizeConfig};

/// Binds a column to symbol size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeBinding {
    pub column: String,
    #[serde(flatten)]
    pub scale: SizeConfig,
}

/// Binds a column to fill color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorBinding {
    pub column: String,
    pub scale: ColorScaleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolSettings {
    pub latitude_column: String,
    pub longitude_column: String,
    pub size: Option<SizeBinding>,
    pub color: Option<ColorBinding>,
    pub label_template: Option<String>,
}

impl Default for SymbolSettings {
    fn default() -> Self {
        Self {
            latitude_column: "latitude".into(),
            longitude_column: "longitude".into(),
            size: None,
            color: None,
            label_template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoroplethSettings {
    /// Column holding region identifiers (names, codes, numeric codes)
    pub region_column: String,
    pub color: Option<ColorBinding>,
    pub label_template: Option<String>,
}

impl Default for ChoroplethSettings {
    fn default() -> Self {
        Self {
            region_column: "region".into(),
            color: None,
            label_template: None,
        }
    }
}

/// A choropleth drawn over hand-supplied SVG markup instead of a topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomSettings {
    pub markup: String,
    #[serde(flatten)]
    pub choropleth: ChoroplethSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapSettings {
    Symbol(SymbolSettings),
    Choropleth(ChoroplethSettings),
    Custom(CustomSettings),
}

impl MapSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn label_template(&self) -> Option<&str> {
        match self {
            MapSettings::Symbol(s) => s.label_template.as_deref(),
            MapSettings::Choropleth(c) => c.label_template.as_deref(),
            MapSettings::Custom(c) => c.choropleth.label_template.as_deref(),
        }
    }

    /// Region binding shared by choropleth and custom maps
    pub fn choropleth(&self) -> Option<&ChoroplethSettings> {
        match self {
            MapSettings::Symbol(_) => None,
            MapSettings::Choropleth(c) => Some(c),
            MapSettings::Custom(c) => Some(&c.choropleth),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

/// Where a label sits relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LabelAlignment {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    #[default]
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
    /// First of right, left, below, above that fits the canvas
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub decoration: TextDecoration,
    pub color: Color,
    pub alignment: LabelAlignment,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_family: defaults::FONT_FAMILY.into(),
            font_size: defaults::FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            decoration: TextDecoration::None,
            color: defaults::LABEL_COLOR,
            alignment: LabelAlignment::Right,
        }
    }
}

/// Per-label override. Every set field wins over the computed value,
/// including an explicit `normal` weight or style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelOverride {
    /// Absolute canvas position of the label anchor
    pub position: Option<DVec2>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub decoration: Option<TextDecoration>,
    pub color: Option<Color>,
    pub alignment: Option<LabelAlignment>,
}

impl LabelOverride {
    pub fn apply(&self, base: &LabelStyle) -> LabelStyle {
        LabelStyle {
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| base.font_family.clone()),
            font_size: self.font_size.unwrap_or(base.font_size),
            font_weight: self.font_weight.unwrap_or(base.font_weight),
            font_style: self.font_style.unwrap_or(base.font_style),
            decoration: self.decoration.unwrap_or(base.decoration),
            color: self.color.unwrap_or(base.color),
            alignment: self.alignment.unwrap_or(base.alignment),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LabelOverride::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseMapStyle {
    pub background: Color,
    pub nation_fill: Color,
    pub nation_stroke: Color,
    pub nation_stroke_width: f64,
    pub region_fill: Color,
    pub region_stroke: Color,
    pub region_stroke_width: f64,
}

impl Default for BaseMapStyle {
    fn default() -> Self {
        Self {
            background: defaults::BACKGROUND,
            nation_fill: defaults::NATION_FILL,
            nation_stroke: defaults::NATION_STROKE,
            nation_stroke_width: defaults::NATION_STROKE_WIDTH,
            region_fill: defaults::REGION_FILL,
            region_stroke: defaults::REGION_STROKE,
            region_stroke_width: defaults::REGION_STROKE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolStyle {
    pub shape: SymbolShape,
    /// Size used when no size scale applies
    pub size: f64,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            shape: SymbolShape::Circle,
            size: defaults::SYMBOL_SIZE,
            fill: defaults::SYMBOL_FILL,
            stroke: defaults::SYMBOL_STROKE,
            stroke_width: defaults::SYMBOL_STROKE_WIDTH,
            opacity: defaults::SYMBOL_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Styling {
    pub base: BaseMapStyle,
    pub symbol: SymbolStyle,
    pub label: LabelStyle,
    /// Text extent estimate used by label placement
    pub metrics: LabelMetrics,
    pub show_legends: bool,
    /// Overrides the geography's default projection family
    pub projection: Option<ProjectionKind>,
    pub clip_to_country: bool,
    pub label_overrides: BTreeMap<String, LabelOverride>,
    pub path_overrides: BTreeMap<String, PathOverride>,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            base: BaseMapStyle::default(),
            symbol: SymbolStyle::default(),
            label: LabelStyle::default(),
            metrics: LabelMetrics::default(),
            show_legends: true,
            projection: None,
            clip_to_country: false,
            label_overrides: BTreeMap::new(),
            path_overrides: BTreeMap::new(),
        }
    }
}

impl Styling {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Drop a label's override so it renders with computed values again
    pub fn reset_label(&mut self, id: &str) -> Option<LabelOverride> {
        self.label_overrides.remove(id)
    }

    /// Drop a path's override so it renders from its own style again
    pub fn reset_path(&mut self, id: &str) -> Option<PathOverride> {
        self.path_overrides.remove(id)
    }
}

/// Size of the map area; legends extend the scene below it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
        }
    }
}

impl Canvas {
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_settings_are_tagged() {
        let s = MapSettings::from_json(
            r#"{"kind": "choropleth", "regionColumn": "state",
                "color": {"column": "value", "scale": {"type": "categorical"}}}"#,
        )
        .unwrap();
        let MapSettings::Choropleth(c) = &s else { panic!("expected choropleth") };
        assert_eq!(c.region_column, "state");
        assert!(matches!(
            c.color.as_ref().map(|b| &b.scale),
            Some(ColorScaleConfig::Categorical(_))
        ));
        assert_eq!(s.label_template(), None);
    }

    #[test]
    fn symbol_settings_defaults() {
        let s = MapSettings::from_json(r#"{"kind": "symbol", "labelTemplate": "{name}"}"#).unwrap();
        let MapSettings::Symbol(sym) = &s else { panic!("expected symbol") };
        assert_eq!(sym.latitude_column, "latitude");
        assert_eq!(s.label_template(), Some("{name}"));
    }

    #[test]
    fn custom_settings_flatten_the_region_binding() {
        let s = MapSettings::from_json(
            r#"{"kind": "custom", "markup": "<svg/>", "regionColumn": "id"}"#,
        )
        .unwrap();
        assert_eq!(s.choropleth().map(|c| c.region_column.as_str()), Some("id"));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!(MapSettings::from_json(r#"{"kind": "heatmap"}"#).is_err());
    }

    #[test]
    fn explicit_normal_overrides_bold_default() {
        let base = LabelStyle {
            font_weight: FontWeight::Bold,
            font_style: FontStyle::Italic,
            ..Default::default()
        };
        let o = LabelOverride {
            font_weight: Some(FontWeight::Normal),
            font_style: Some(FontStyle::Normal),
            ..Default::default()
        };
        let styled = o.apply(&base);
        assert_eq!(styled.font_weight, FontWeight::Normal);
        assert_eq!(styled.font_style, FontStyle::Normal);
        assert_eq!(LabelOverride::default().apply(&base), base);
    }

    #[test]
    fn styling_loads_partial_json() {
        let s = Styling::from_json(
            r#"{"label": {"fontSize": 14, "alignment": "auto"},
                "labelOverrides": {"symbol-0": {"position": [10, 20]}}}"#,
        )
        .unwrap();
        assert_eq!(s.label.font_size, 14.0);
        assert_eq!(s.label.alignment, LabelAlignment::Auto);
        assert_eq!(s.label.font_family, defaults::FONT_FAMILY);
        assert_eq!(
            s.label_overrides["symbol-0"].position,
            Some(DVec2::new(10.0, 20.0))
        );
        assert!(s.show_legends);
    }
}
