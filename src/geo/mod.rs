//! Geography: identifiers, boundary data and projections.
//!
//! - `normalize`: identifier normalization per geography
//! - `topology`: TopoJSON decoding into features and meshes
//! - `resolve`: picks the renderable features for a geography selection
//! - `custom`: features extracted from a hand-supplied SVG map
//! - `projection`: the four projection families and extent fitting
//! - `path`: projected path data, bounds and centroids

pub mod custom;
pub mod normalize;
pub mod path;
pub mod projection;
pub mod resolve;
pub mod topology;

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use normalize::normalize_identifier;
pub use topology::Topology;

/// Which boundary set a map is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Geography {
    UsaStates,
    UsaNation,
    CanadaProvinces,
    CanadaNation,
    World,
}

impl Geography {
    /// Subdivision geographies key features by a two-letter code
    pub fn is_subdivision(self) -> bool {
        matches!(self, Geography::UsaStates | Geography::CanadaProvinces)
    }

    /// Single-country outline geographies
    pub fn is_nation(self) -> bool {
        matches!(self, Geography::UsaNation | Geography::CanadaNation)
    }

    /// Names a country feature may carry, used when searching a country collection
    pub fn country_candidates(self) -> &'static [&'static str] {
        match self {
            Geography::UsaStates | Geography::UsaNation => {
                &["United States of America", "United States", "USA", "US"]
            }
            Geography::CanadaProvinces | Geography::CanadaNation => &["Canada", "CAN", "CA"],
            Geography::World => &[],
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Geography::UsaStates => "usa-states",
            Geography::UsaNation => "usa-nation",
            Geography::CanadaProvinces => "canada-provinces",
            Geography::CanadaNation => "canada-nation",
            Geography::World => "world",
        };
        f.write_str(s)
    }
}

/// Geometry in geographic coordinates (x = longitude, y = latitude)
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(DVec2),
    MultiPoint(Vec<DVec2>),
    LineString(Vec<DVec2>),
    MultiLineString(Vec<Vec<DVec2>>),
    /// Exterior ring followed by holes
    Polygon(Vec<Vec<DVec2>>),
    MultiPolygon(Vec<Vec<Vec<DVec2>>>),
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Visit every coordinate
    pub fn for_each_point<F: FnMut(DVec2)>(&self, f: &mut F) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(pts) | Geometry::LineString(pts) => {
                for p in pts {
                    f(*p);
                }
            }
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                for p in lines.iter().flatten() {
                    f(*p);
                }
            }
            Geometry::MultiPolygon(polys) => {
                for p in polys.iter().flatten().flatten() {
                    f(*p);
                }
            }
            Geometry::Collection(items) => {
                for g in items {
                    g.for_each_point(f);
                }
            }
        }
    }
}

/// A boundary feature: geometry plus identifying properties
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// String property lookup (numbers are rendered as strings)
    pub fn property(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Display name as found in common boundary datasets
    pub fn name(&self) -> Option<String> {
        self.property("name")
            .or_else(|| self.property("NAME"))
            .or_else(|| self.property("name_en"))
    }

    /// Identifying strings tried in order when matching country-level data:
    /// id, name, long name, admin name, ISO3 code
    pub fn country_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        keys.extend(self.id.clone());
        for prop in ["name", "name_long", "admin", "iso_a3", "adm0_a3"] {
            keys.extend(self.property(prop));
        }
        keys
    }
}
