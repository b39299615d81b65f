//! Size and color scales for symbols and choropleth fills.
//!
//! Every scale degrades instead of failing: a missing or degenerate domain
//! yields a flat scale that always answers with the caller's default.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::data::Value;
use crate::render::defaults;
use crate::types::{Domain, lerp};
use crate::values::parse_number;

/// Linear size scale configuration: value domain to pixel range.
/// Unset domain endpoints come from the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizeConfig {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_size: f64,
    pub max_size: f64,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            min_value: None,
            max_value: None,
            min_size: defaults::SIZE_RANGE_MIN,
            max_size: defaults::SIZE_RANGE_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeScale {
    Linear {
        domain: Domain,
        range: (f64, f64),
        fallback: f64,
    },
    Flat(f64),
}

impl SizeScale {
    /// Build from config and the data's numeric bounds. When the data has a
    /// single distinct value (or none) no scale is built.
    pub fn build(config: &SizeConfig, data_bounds: Option<(f64, f64)>, flat: f64) -> SizeScale {
        let Some((lo, hi)) = data_bounds else {
            return SizeScale::Flat(flat);
        };
        if lo == hi {
            crate::log::debug!(value = lo, "size data has one value, using flat size");
            return SizeScale::Flat(flat);
        }
        let min = config.min_value.unwrap_or(lo);
        let max = config.max_value.unwrap_or(hi);
        match Domain::try_new(min, max) {
            Ok(domain) => SizeScale::Linear {
                domain,
                range: (config.min_size, config.max_size),
                fallback: flat,
            },
            Err(_e) => {
                crate::log::debug!(error = %_e, "size domain unusable, using flat size");
                SizeScale::Flat(flat)
            }
        }
    }

    pub fn size_for(&self, value: Option<&Value>) -> f64 {
        match self {
            SizeScale::Flat(s) => *s,
            SizeScale::Linear {
                domain,
                range,
                fallback,
            } => match value.and_then(parse_number) {
                Some(v) => lerp(range.0, range.1, domain.normalize_clamped(v)),
                None => *fallback,
            },
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, SizeScale::Flat(_))
    }
}

/// Continuous color scale configuration: two stops, or three when a
/// midpoint color is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContinuousConfig {
    pub min: Option<f64>,
    pub mid: Option<f64>,
    pub max: Option<f64>,
    pub min_color: Color,
    pub mid_color: Option<Color>,
    pub max_color: Color,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            min: None,
            mid: None,
            max: None,
            min_color: defaults::CONTINUOUS_MIN_COLOR,
            mid_color: None,
            max_color: defaults::CONTINUOUS_MAX_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryColor {
    pub category: String,
    pub color: Color,
}

/// Categorical color configuration: explicit assignments win, other
/// values take palette colors in unique-value order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoricalConfig {
    pub categories: Vec<CategoryColor>,
    pub palette: Vec<Color>,
}

impl Default for CategoricalConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            palette: defaults::CATEGORY_PALETTE.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColorScaleConfig {
    Continuous(ContinuousConfig),
    Categorical(CategoricalConfig),
}

impl Default for ColorScaleConfig {
    fn default() -> Self {
        ColorScaleConfig::Continuous(ContinuousConfig::default())
    }
}

/// Piecewise-linear interpolation over two or three stops
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousScale {
    pub domain: Domain,
    pub min_color: Color,
    /// Midpoint value and color
    pub mid: Option<(f64, Color)>,
    pub max_color: Color,
}

impl ContinuousScale {
    pub fn color_at(&self, v: f64) -> Color {
        let t = self.domain.normalize_clamped(v);
        let Some((mid_value, mid_color)) = self.mid else {
            return self.min_color.mix(self.max_color, t);
        };
        let t_mid = self.domain.normalize_clamped(mid_value);
        if t <= t_mid {
            if t_mid == 0.0 {
                mid_color
            } else {
                self.min_color.mix(mid_color, t / t_mid)
            }
        } else {
            mid_color.mix(self.max_color, (t - t_mid) / (1.0 - t_mid))
        }
    }

    /// Gradient stops as (offset in [0, 1], color)
    pub fn stops(&self) -> Vec<(f64, Color)> {
        let mut stops = vec![(0.0, self.min_color)];
        if let Some((v, c)) = self.mid {
            stops.push((self.domain.normalize_clamped(v), c));
        }
        stops.push((1.0, self.max_color));
        stops
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalScale {
    /// Category -> color in unique-value order
    pub assignments: IndexMap<String, Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Continuous(ContinuousScale),
    Categorical(CategoricalScale),
    /// Degenerate or missing domain: everything takes the default
    Flat(Color),
}

impl ColorScale {
    /// Build a scale from its configuration.
    ///
    /// `bounds` are the numeric bounds of the bound column and `unique` its
    /// distinct display values in first-appearance order.
    pub fn build(
        config: &ColorScaleConfig,
        bounds: Option<(f64, f64)>,
        unique: &[String],
        default: Color,
    ) -> ColorScale {
        match config {
            ColorScaleConfig::Continuous(c) => {
                let min = c.min.or(bounds.map(|b| b.0));
                let max = c.max.or(bounds.map(|b| b.1));
                let (Some(min), Some(max)) = (min, max) else {
                    return ColorScale::Flat(default);
                };
                match Domain::try_new(min, max) {
                    Ok(domain) => ColorScale::Continuous(ContinuousScale {
                        domain,
                        min_color: c.min_color,
                        mid: c
                            .mid_color
                            .map(|color| (c.mid.unwrap_or((min + max) / 2.0), color)),
                        max_color: c.max_color,
                    }),
                    Err(_e) => {
                        crate::log::debug!(error = %_e, "color domain unusable, using default");
                        ColorScale::Flat(default)
                    }
                }
            }
            ColorScaleConfig::Categorical(c) => {
                let mut assignments = IndexMap::new();
                for (i, value) in unique.iter().enumerate() {
                    let explicit = c
                        .categories
                        .iter()
                        .find(|cc| cc.category == *value)
                        .map(|cc| cc.color);
                    let color = explicit
                        .or_else(|| (!c.palette.is_empty()).then(|| c.palette[i % c.palette.len()]))
                        .unwrap_or(default);
                    assignments.insert(value.clone(), color);
                }
                ColorScale::Categorical(CategoricalScale { assignments })
            }
        }
    }

    /// Color for a cell, or `None` when the cell does not map (the caller
    /// applies its default)
    pub fn color_for(&self, value: &Value) -> Option<Color> {
        match self {
            ColorScale::Flat(c) => Some(*c),
            ColorScale::Continuous(s) => parse_number(value).map(|v| s.color_at(v)),
            ColorScale::Categorical(s) => {
                let key = value.to_string();
                s.assignments.get(key.trim()).copied()
            }
        }
    }
}
