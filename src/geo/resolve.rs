//! Feature resolution: which boundary features a geography draws, and the
//! keys each one can be matched by.

use super::normalize::{full_name, normalize_identifier};
use super::topology::{MeshFilter, Topology};
use super::{Feature, Geography, Geometry};
use crate::errors::{Layer, Notice, TopologyError};

const NATION_OBJECTS: &[&str] = &["nation", "country"];
const US_STATE_OBJECTS: &[&str] = &["states"];
const CA_PROVINCE_OBJECTS: &[&str] = &[
    "provinces",
    "canada_provinces",
    "canadaProvinces",
    "province",
];
const ADMIN1_OBJECTS: &[&str] = &[
    "admin1",
    "states_provinces",
    "ne_10m_admin_1_states_provinces",
    "ne_50m_admin_1_states_provinces",
];
const COUNTRY_OBJECTS: &[&str] = &[
    "countries",
    "ne_110m_admin_0_countries",
    "ne_50m_admin_0_countries",
    "ne_10m_admin_0_countries",
];

/// A drawable region and the keys data rows can match it by, most specific first
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub keys: Vec<String>,
    pub feature: Feature,
}

impl RegionFeature {
    /// The key used for element and label ids
    pub fn key(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or_default()
    }
}

/// Everything the base map needs for one geography
#[derive(Debug, Clone, Default)]
pub struct ResolvedGeography {
    pub regions: Vec<RegionFeature>,
    /// National outline drawn beneath the regions
    pub nation: Option<Feature>,
    /// Shared borders between regions, each drawn once
    pub borders: Option<Geometry>,
    /// Feature the projection can be clipped to
    pub clip: Option<Feature>,
    /// Fallbacks taken while resolving
    pub notices: Vec<Notice>,
}

/// Resolve the features for `geography` from a topology.
///
/// Missing required objects are errors; the caller reports them and draws
/// nothing for the boundary layer. Softer problems are returned as notices.
pub fn resolve(geography: Geography, topology: &Topology) -> Result<ResolvedGeography, TopologyError> {
    let resolved = match geography {
        Geography::UsaStates => resolve_us_states(topology)?,
        Geography::CanadaProvinces => resolve_canada_provinces(topology)?,
        Geography::UsaNation | Geography::CanadaNation => resolve_nation(geography, topology)?,
        Geography::World => resolve_world(topology)?,
    };
    crate::log::debug!(
        geography = %geography,
        regions = resolved.regions.len(),
        notices = resolved.notices.len(),
        "resolved geography"
    );
    Ok(resolved)
}

fn missing(object: &[&str], geography: Geography) -> TopologyError {
    TopologyError::MissingObject {
        object: object.first().copied().unwrap_or_default().to_string(),
        geography,
        expected: Some(format!("accepted object names: {}", object.join(", "))),
    }
}

fn resolve_us_states(topology: &Topology) -> Result<ResolvedGeography, TopologyError> {
    let geography = Geography::UsaStates;
    let (_, nation_obj) = topology
        .first_object(NATION_OBJECTS)
        .ok_or_else(|| missing(NATION_OBJECTS, geography))?;
    let (_, states_obj) = topology
        .first_object(US_STATE_OBJECTS)
        .ok_or_else(|| missing(US_STATE_OBJECTS, geography))?;

    let nation = topology.merged_feature(nation_obj)?;
    let regions = topology
        .features(states_obj)?
        .into_iter()
        .map(|feature| RegionFeature {
            keys: subdivision_keys(&feature, geography, &[]),
            feature,
        })
        .collect();

    Ok(ResolvedGeography {
        regions,
        clip: Some(nation.clone()),
        nation: Some(nation),
        borders: Some(topology.mesh(states_obj, MeshFilter::Interior)?),
        notices: Vec::new(),
    })
}

/// Candidate keys for a subdivision feature: id, then name, then any extra
/// property-derived codes, normalized. Keys that resolve to a known code
/// are moved to the front.
fn subdivision_keys(feature: &Feature, geography: Geography, extra: &[String]) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();
    raw.extend(extra.iter().cloned());
    raw.extend(feature.id.clone());
    raw.extend(feature.name());

    let mut keys: Vec<String> = Vec::new();
    for r in raw {
        let key = normalize_identifier(&r, geography);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.sort_by_key(|k| full_name(k, geography).is_none());
    keys
}

fn resolve_canada_provinces(topology: &Topology) -> Result<ResolvedGeography, TopologyError> {
    let geography = Geography::CanadaProvinces;
    let nation = canada_outline(topology)?;
    let mut notices = Vec::new();

    if let Some((_name, obj)) = topology.first_object(CA_PROVINCE_OBJECTS) {
        crate::log::debug!(object = _name, "using named province object");
        let regions = topology
            .features(obj)?
            .into_iter()
            .map(|feature| RegionFeature {
                keys: subdivision_keys(&feature, geography, &[]),
                feature,
            })
            .collect();
        return Ok(ResolvedGeography {
            regions,
            clip: nation.clone(),
            nation,
            borders: Some(topology.mesh(obj, MeshFilter::Interior)?),
            notices,
        });
    }

    if let Some((_name, obj)) = topology.first_object(ADMIN1_OBJECTS) {
        let regions: Vec<RegionFeature> = topology
            .features(obj)?
            .into_iter()
            .filter(|f| is_in_country(f, geography))
            .map(|feature| {
                let codes = admin1_codes(&feature);
                RegionFeature {
                    keys: subdivision_keys(&feature, geography, &codes),
                    feature,
                }
            })
            .collect();
        crate::log::debug!(
            object = _name,
            regions = regions.len(),
            "filtered admin-level object for provinces"
        );
        if !regions.is_empty() {
            return Ok(ResolvedGeography {
                regions,
                clip: nation.clone(),
                nation,
                borders: None,
                notices,
            });
        }
    }

    match nation {
        Some(outline) => {
            crate::log::warn!("no province boundaries found, showing the country outline");
            notices.push(Notice::warning(
                Layer::Boundaries,
                "province boundaries are missing from the topology; showing the country outline only",
            ));
            Ok(ResolvedGeography {
                regions: Vec::new(),
                clip: Some(outline.clone()),
                nation: Some(outline),
                borders: None,
                notices,
            })
        }
        None => Err(missing(CA_PROVINCE_OBJECTS, geography)),
    }
}

fn canada_outline(topology: &Topology) -> Result<Option<Feature>, TopologyError> {
    if let Some((_, obj)) = topology.first_object(NATION_OBJECTS) {
        return Ok(Some(topology.merged_feature(obj)?));
    }
    if let Some((_, obj)) = topology.first_object(COUNTRY_OBJECTS) {
        let features = topology.features(obj)?;
        return Ok(find_country(&features, Geography::CanadaNation).cloned());
    }
    Ok(None)
}

/// Province codes an admin-level feature may carry (`postal`, `CA-QC`, `CA.QC`)
fn admin1_codes(feature: &Feature) -> Vec<String> {
    let mut codes = Vec::new();
    codes.extend(feature.property("postal"));
    for (prop, sep) in [("iso_3166_2", '-'), ("code_hasc", '.')] {
        if let Some(v) = feature.property(prop) {
            if let Some((_, code)) = v.split_once(sep) {
                codes.push(code.to_string());
            }
        }
    }
    codes
}

fn is_in_country(feature: &Feature, geography: Geography) -> bool {
    let candidates = geography.country_candidates();
    let matches = |v: &str| candidates.iter().any(|c| c.eq_ignore_ascii_case(v.trim()));
    let by_property = ["admin", "adm0_a3", "iso_a2", "geonunit", "country"]
        .iter()
        .filter_map(|p| feature.property(p))
        .any(|v| matches(&v));
    by_property
        || feature
            .property("iso_3166_2")
            .and_then(|v| v.split_once('-').map(|(cc, _)| matches(cc)))
            .unwrap_or(false)
}

/// First feature any of whose country keys matches the geography's candidates
fn find_country(features: &[Feature], geography: Geography) -> Option<&Feature> {
    let candidates = geography.country_candidates();
    features.iter().find(|f| {
        f.country_keys()
            .iter()
            .any(|k| candidates.iter().any(|c| c.eq_ignore_ascii_case(k.trim())))
    })
}

fn country_region(feature: Feature, extra: &[&str]) -> RegionFeature {
    let mut keys = Vec::new();
    for k in feature
        .country_keys()
        .into_iter()
        .chain(extra.iter().map(|s| s.to_string()))
    {
        let k = normalize_identifier(&k, Geography::World);
        if !k.is_empty() && !keys.contains(&k) {
            keys.push(k);
        }
    }
    RegionFeature { keys, feature }
}

fn resolve_nation(geography: Geography, topology: &Topology) -> Result<ResolvedGeography, TopologyError> {
    let candidates = geography.country_candidates();
    let mut notices = Vec::new();

    let regions = if let Some((_, obj)) = topology.first_object(NATION_OBJECTS) {
        let nation = topology.merged_feature(obj)?;
        vec![country_region(nation, candidates)]
    } else if let Some((_, obj)) = topology.first_object(COUNTRY_OBJECTS) {
        let features = topology.features(obj)?;
        match find_country(&features, geography) {
            Some(f) => vec![country_region(f.clone(), candidates)],
            None => {
                crate::log::warn!(geography = %geography, "country not found, using whole collection");
                notices.push(Notice::warning(
                    Layer::Boundaries,
                    format!("no feature named like {geography} was found; drawing every country"),
                ));
                features.into_iter().map(|f| country_region(f, &[])).collect()
            }
        }
    } else {
        return Err(missing(NATION_OBJECTS, geography));
    };

    let clip = match regions.as_slice() {
        [only] => Some(only.feature.clone()),
        _ => None,
    };
    Ok(ResolvedGeography {
        regions,
        nation: None,
        borders: None,
        clip,
        notices,
    })
}

fn resolve_world(topology: &Topology) -> Result<ResolvedGeography, TopologyError> {
    let (_, obj) = topology
        .first_object(COUNTRY_OBJECTS)
        .ok_or_else(|| missing(COUNTRY_OBJECTS, Geography::World))?;
    let regions = topology
        .features(obj)?
        .into_iter()
        .map(|f| country_region(f, &[]))
        .collect();
    Ok(ResolvedGeography {
        regions,
        nation: None,
        borders: Some(topology.mesh(obj, MeshFilter::Interior)?),
        clip: None,
        notices: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_arcs() -> serde_json::Value {
        json!([
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ])
    }

    fn us_topology() -> Topology {
        Topology::from_json(&json!({
            "type": "Topology",
            "arcs": square_arcs(),
            "objects": {
                "nation": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "arcs": [[1, 2]]}
                ]},
                "states": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "id": "06", "properties": {"name": "California"}, "arcs": [[0, 1]]},
                    {"type": "Polygon", "id": "48", "properties": {"name": "Texas"}, "arcs": [[2, -1]]}
                ]}
            }
        }).to_string())
        .unwrap()
    }

    #[test]
    fn us_states_keys_are_codes() {
        let r = resolve(Geography::UsaStates, &us_topology()).unwrap();
        let keys: Vec<&str> = r.regions.iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["CA", "TX"]);
        assert!(r.nation.is_some());
        assert!(r.clip.is_some());
        match r.borders {
            Some(Geometry::MultiLineString(lines)) => assert_eq!(lines.len(), 1),
            other => panic!("unexpected borders {other:?}"),
        }
    }

    #[test]
    fn us_states_without_nation_is_an_error() {
        let topo = Topology::from_json(&json!({
            "type": "Topology", "arcs": square_arcs(),
            "objects": {"states": {"type": "GeometryCollection", "geometries": []}}
        }).to_string())
        .unwrap();
        let err = resolve(Geography::UsaStates, &topo).unwrap_err();
        assert!(matches!(err, TopologyError::MissingObject { ref object, .. } if object == "nation"));
    }

    #[test]
    fn canada_prefers_named_provinces() {
        let topo = Topology::from_json(&json!({
            "type": "Topology", "arcs": square_arcs(),
            "objects": {
                "provinces": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "properties": {"name": "Québec"}, "arcs": [[0, 1]]}
                ]}
            }
        }).to_string())
        .unwrap();
        let r = resolve(Geography::CanadaProvinces, &topo).unwrap();
        assert_eq!(r.regions[0].key(), "QC");
        assert!(r.notices.is_empty());
    }

    #[test]
    fn canada_filters_admin_level_object() {
        let topo = Topology::from_json(&json!({
            "type": "Topology", "arcs": square_arcs(),
            "objects": {
                "admin1": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "properties": {"admin": "Canada", "iso_3166_2": "CA-ON", "name": "Ontario"}, "arcs": [[0, 1]]},
                    {"type": "Polygon", "properties": {"admin": "United States of America", "postal": "TX", "name": "Texas"}, "arcs": [[2, -1]]}
                ]}
            }
        }).to_string())
        .unwrap();
        let r = resolve(Geography::CanadaProvinces, &topo).unwrap();
        assert_eq!(r.regions.len(), 1);
        assert_eq!(r.regions[0].key(), "ON");
    }

    #[test]
    fn canada_falls_back_to_outline_with_warning() {
        let topo = Topology::from_json(&json!({
            "type": "Topology", "arcs": square_arcs(),
            "objects": {
                "countries": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "properties": {"name": "Mexico"}, "arcs": [[2, -1]]},
                    {"type": "Polygon", "properties": {"name": "Canada"}, "arcs": [[0, 1]]}
                ]}
            }
        }).to_string())
        .unwrap();
        let r = resolve(Geography::CanadaProvinces, &topo).unwrap();
        assert!(r.regions.is_empty());
        assert_eq!(r.nation.as_ref().and_then(|f| f.name()).as_deref(), Some("Canada"));
        assert_eq!(r.notices.len(), 1);
    }

    #[test]
    fn nation_search_is_case_insensitive_and_falls_back() {
        let countries = |name: &str| {
            Topology::from_json(&json!({
                "type": "Topology", "arcs": square_arcs(),
                "objects": {
                    "countries": {"type": "GeometryCollection", "geometries": [
                        {"type": "Polygon", "properties": {"name": "Mexico"}, "arcs": [[2, -1]]},
                        {"type": "Polygon", "properties": {"name": name}, "arcs": [[0, 1]]}
                    ]}
                }
            }).to_string())
            .unwrap()
        };
        let r = resolve(Geography::UsaNation, &countries("united states of america")).unwrap();
        assert_eq!(r.regions.len(), 1);
        assert!(r.clip.is_some());

        let r = resolve(Geography::UsaNation, &countries("Atlantis")).unwrap();
        assert_eq!(r.regions.len(), 2);
        assert_eq!(r.notices.len(), 1);
    }

    #[test]
    fn world_keys_cover_names_and_iso3() {
        let topo = Topology::from_json(&json!({
            "type": "Topology", "arcs": square_arcs(),
            "objects": {
                "countries": {"type": "GeometryCollection", "geometries": [
                    {"type": "Polygon", "id": "250", "properties": {"name": "France", "iso_a3": "FRA"}, "arcs": [[0, 1]]}
                ]}
            }
        }).to_string())
        .unwrap();
        let r = resolve(Geography::World, &topo).unwrap();
        assert_eq!(r.regions[0].keys, ["250", "France", "FRA"]);
        assert!(r.clip.is_none());
    }
}
