//! TopoJSON decoding.
//!
//! A topology stores shared boundary arcs once and lets each geometry refer
//! to them by index. `feature` expands an object back into standalone
//! features; `mesh` emits each referenced arc exactly once, which is how
//! shared borders are drawn without doubling strokes.

use glam::{DVec2, dvec2};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use super::{Feature, Geometry};
use crate::errors::TopologyError;

/// Quantization transform
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> DVec2 {
        dvec2(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// A TopoJSON topology as supplied by the host
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub objects: IndexMap<String, TopoObject>,
}

/// One named object or nested geometry. Arc references and coordinates are
/// kept as raw JSON and interpreted according to `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopoObject {
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub arcs: serde_json::Value,
    #[serde(default)]
    pub coordinates: serde_json::Value,
    #[serde(default)]
    pub geometries: Vec<TopoObject>,
}

/// Null geometries have `"type": null`
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Which arcs `mesh` keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFilter {
    /// Every arc, once
    All,
    /// Arcs shared by two different geometries
    Interior,
    /// Arcs used by a single geometry
    Exterior,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn object(&self, name: &str) -> Option<&TopoObject> {
        self.objects.get(name)
    }

    /// First object present among `names`, with the name that matched
    pub fn first_object<'a>(&'a self, names: &[&'a str]) -> Option<(&'a str, &'a TopoObject)> {
        names
            .iter()
            .find_map(|name| self.objects.get(*name).map(|obj| (*name, obj)))
    }

    /// Decode the arc table into absolute coordinates
    pub fn decode_arcs(&self) -> Vec<Vec<DVec2>> {
        self.arcs
            .iter()
            .map(|arc| match &self.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            t.apply(x, y)
                        })
                        .collect()
                }
                None => arc
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| dvec2(p[0], p[1]))
                    .collect(),
            })
            .collect()
    }

    /// Expand an object into features. A `GeometryCollection` yields one
    /// feature per member; anything else yields a single feature.
    pub fn features(&self, object: &TopoObject) -> Result<Vec<Feature>, TopologyError> {
        let arcs = self.decode_arcs();
        let reader = ArcReader { topology: self, arcs: &arcs };
        if object.kind == "GeometryCollection" {
            object.geometries.iter().map(|g| reader.feature(g)).collect()
        } else {
            Ok(vec![reader.feature(object)?])
        }
    }

    /// Merge every member of an object into a single feature
    pub fn merged_feature(&self, object: &TopoObject) -> Result<Feature, TopologyError> {
        let arcs = self.decode_arcs();
        let reader = ArcReader { topology: self, arcs: &arcs };
        let geometry = reader.geometry(object)?;
        Ok(Feature {
            id: object.id.as_ref().and_then(id_string),
            properties: object.properties.clone().unwrap_or_default(),
            geometry,
        })
    }

    /// Boundary lines of an object, each arc emitted once
    pub fn mesh(&self, object: &TopoObject, filter: MeshFilter) -> Result<Geometry, TopologyError> {
        // arc index -> indices of the geometries referencing it
        let mut geoms_by_arc: IndexMap<usize, Vec<usize>> = IndexMap::new();
        let mut members = Vec::new();
        flatten_collection(object, &mut members);

        for (geom_index, geom) in members.iter().enumerate() {
            let mut refs = Vec::new();
            collect_arc_refs(&geom.arcs, &mut refs);
            for index in refs {
                let arc = resolve_index(index, self.arcs.len())?;
                let users = geoms_by_arc.entry(arc).or_default();
                if users.last() != Some(&geom_index) {
                    users.push(geom_index);
                }
            }
        }

        let arcs = self.decode_arcs();
        let lines = geoms_by_arc
            .iter()
            .filter(|(_, users)| {
                let first = users.first();
                let last = users.last();
                match filter {
                    MeshFilter::All => true,
                    MeshFilter::Interior => first != last,
                    MeshFilter::Exterior => first == last,
                }
            })
            .map(|(arc, _)| arcs[*arc].clone())
            .collect();
        Ok(Geometry::MultiLineString(lines))
    }
}

fn flatten_collection<'a>(object: &'a TopoObject, out: &mut Vec<&'a TopoObject>) {
    if object.kind == "GeometryCollection" {
        for g in &object.geometries {
            flatten_collection(g, out);
        }
    } else {
        out.push(object);
    }
}

fn collect_arc_refs(value: &serde_json::Value, out: &mut Vec<i64>) {
    match value {
        serde_json::Value::Number(n) => out.extend(n.as_i64()),
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_arc_refs(v, out)),
        _ => {}
    }
}

/// Map a possibly-negative arc reference (`!i` means reversed) to a table index
fn resolve_index(index: i64, count: usize) -> Result<usize, TopologyError> {
    let arc = if index < 0 { !index } else { index };
    usize::try_from(arc)
        .ok()
        .filter(|a| *a < count)
        .ok_or(TopologyError::ArcOutOfRange { index, count })
}

fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

struct ArcReader<'a> {
    topology: &'a Topology,
    arcs: &'a [Vec<DVec2>],
}

impl ArcReader<'_> {
    fn feature(&self, object: &TopoObject) -> Result<Feature, TopologyError> {
        Ok(Feature {
            id: object.id.as_ref().and_then(id_string),
            properties: object.properties.clone().unwrap_or_default(),
            geometry: self.geometry(object)?,
        })
    }

    fn geometry(&self, object: &TopoObject) -> Result<Option<Geometry>, TopologyError> {
        let malformed = |reason: &str| TopologyError::MalformedGeometry {
            kind: object.kind.clone(),
            reason: reason.to_string(),
        };
        let geometry = match object.kind.as_str() {
            "Point" => {
                let p: Vec<f64> = Vec::deserialize(&object.coordinates)
                    .map_err(|_| malformed("expected a position"))?;
                Geometry::Point(self.position(&p).ok_or_else(|| malformed("short position"))?)
            }
            "MultiPoint" => {
                let pts: Vec<Vec<f64>> = Vec::deserialize(&object.coordinates)
                    .map_err(|_| malformed("expected positions"))?;
                Geometry::MultiPoint(pts.iter().filter_map(|p| self.position(p)).collect())
            }
            "LineString" => {
                let refs: Vec<i64> = Vec::deserialize(&object.arcs)
                    .map_err(|_| malformed("expected arc indices"))?;
                Geometry::LineString(self.line(&refs)?)
            }
            "MultiLineString" => {
                let lines: Vec<Vec<i64>> = Vec::deserialize(&object.arcs)
                    .map_err(|_| malformed("expected arc index lists"))?;
                Geometry::MultiLineString(
                    lines.iter().map(|l| self.line(l)).collect::<Result<_, _>>()?,
                )
            }
            "Polygon" => {
                let rings: Vec<Vec<i64>> = Vec::deserialize(&object.arcs)
                    .map_err(|_| malformed("expected ring arc lists"))?;
                Geometry::Polygon(self.polygon(&rings)?)
            }
            "MultiPolygon" => {
                let polys: Vec<Vec<Vec<i64>>> = Vec::deserialize(&object.arcs)
                    .map_err(|_| malformed("expected polygon ring lists"))?;
                Geometry::MultiPolygon(
                    polys.iter().map(|p| self.polygon(p)).collect::<Result<_, _>>()?,
                )
            }
            "GeometryCollection" => Geometry::Collection(
                object
                    .geometries
                    .iter()
                    .filter_map(|g| self.geometry(g).transpose())
                    .collect::<Result<_, _>>()?,
            ),
            // A null geometry carries properties only
            _ if object.arcs.is_null() && object.coordinates.is_null() => return Ok(None),
            _ => return Err(malformed("unsupported geometry type")),
        };
        Ok(Some(geometry))
    }

    fn position(&self, p: &[f64]) -> Option<DVec2> {
        if p.len() < 2 {
            return None;
        }
        Some(match &self.topology.transform {
            Some(t) => t.apply(p[0], p[1]),
            None => dvec2(p[0], p[1]),
        })
    }

    /// Stitch arcs into one coordinate run, dropping duplicated join points
    fn line(&self, refs: &[i64]) -> Result<Vec<DVec2>, TopologyError> {
        let mut points: Vec<DVec2> = Vec::new();
        for &index in refs {
            let arc = &self.arcs[resolve_index(index, self.arcs.len())?];
            if !points.is_empty() {
                points.pop();
            }
            if index < 0 {
                points.extend(arc.iter().rev().copied());
            } else {
                points.extend(arc.iter().copied());
            }
        }
        Ok(points)
    }

    fn ring(&self, refs: &[i64]) -> Result<Vec<DVec2>, TopologyError> {
        let mut points = self.line(refs)?;
        // Degenerate rings still need to close
        while !points.is_empty() && points.len() < 4 {
            points.push(points[0]);
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<DVec2>>, TopologyError> {
        rings.iter().map(|r| self.ring(r)).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit squares side by side sharing the edge x = 1.
    /// Arc 0 is the shared edge, arcs 1 and 2 the outer boundaries.
    pub(crate) const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ],
        "objects": {
            "squares": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "06", "properties": {"name": "West"}, "arcs": [[0, 1]]},
                    {"type": "Polygon", "id": 48, "properties": {"name": "East"}, "arcs": [[2, -1]]}
                ]
            }
        }
    }"#;

    #[test]
    fn decodes_features_with_ids_and_properties() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let features = topo.features(topo.object("squares").unwrap()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id.as_deref(), Some("06"));
        assert_eq!(features[1].id.as_deref(), Some("48"));
        assert_eq!(features[1].name().as_deref(), Some("East"));
    }

    #[test]
    fn stitches_rings_without_duplicate_joins() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let features = topo.features(topo.object("squares").unwrap()).unwrap();
        let Some(Geometry::Polygon(rings)) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![dvec2(1.0, 0.0), dvec2(1.0, 1.0), dvec2(0.0, 1.0), dvec2(0.0, 0.0), dvec2(1.0, 0.0)]
        );
        let Some(Geometry::Polygon(rings)) = &features[1].geometry else {
            panic!("expected polygon");
        };
        // Reversed reference walks the shared edge downward
        assert_eq!(rings[0].last(), Some(&dvec2(1.0, 0.0)));
        assert_eq!(rings[0].len(), 5);
    }

    #[test]
    fn quantized_arcs_are_delta_decoded() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 2.0], "translate": [10, 20]},
            "arcs": [[[0, 0], [2, 1], [2, 1]]],
            "objects": {}
        }"#;
        let topo = Topology::from_json(json).unwrap();
        let arcs = topo.decode_arcs();
        assert_eq!(arcs[0], vec![dvec2(10.0, 20.0), dvec2(11.0, 22.0), dvec2(12.0, 24.0)]);
    }

    #[test]
    fn interior_mesh_keeps_only_shared_edge() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let obj = topo.object("squares").unwrap();
        let Geometry::MultiLineString(lines) = topo.mesh(obj, MeshFilter::Interior).unwrap() else {
            panic!("expected lines");
        };
        assert_eq!(lines, vec![vec![dvec2(1.0, 0.0), dvec2(1.0, 1.0)]]);

        let Geometry::MultiLineString(all) = topo.mesh(obj, MeshFilter::All).unwrap() else {
            panic!("expected lines");
        };
        assert_eq!(all.len(), 3);

        let Geometry::MultiLineString(outer) = topo.mesh(obj, MeshFilter::Exterior).unwrap() else {
            panic!("expected lines");
        };
        assert_eq!(outer.len(), 2);
    }

    #[test]
    fn out_of_range_arc_is_an_error() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [1, 1]]],
            "objects": {"bad": {"type": "LineString", "arcs": [5]}}
        }"#;
        let topo = Topology::from_json(json).unwrap();
        let err = topo.features(topo.object("bad").unwrap()).unwrap_err();
        assert!(matches!(err, TopologyError::ArcOutOfRange { index: 5, count: 1 }));
    }

    #[test]
    fn first_object_respects_priority() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let (name, _) = topo.first_object(&["provinces", "squares"]).unwrap();
        assert_eq!(name, "squares");
        assert!(topo.first_object(&["provinces"]).is_none());
    }
}
