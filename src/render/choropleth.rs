//! Choropleth fills: data rows joined to regions by normalized key

use std::collections::HashMap;

use glam::DVec2;

use super::context::{BaseMap, RenderContext};
use crate::cache::KeyCache;
use crate::color::Color;
use crate::geo::Geography;
use crate::geo::path::GeoPath;
use crate::scale::ColorScale;
use crate::settings::ColorBinding;
use crate::values::{numeric_bounds, unique_values};

/// A drawable region as the choropleth and label layers see it
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSlot {
    /// Matching keys, most specific first; the first names the element
    pub keys: Vec<String>,
    /// Label anchor in canvas space
    pub anchor: Option<DVec2>,
}

/// Regions of the base map, in drawing order
pub fn region_slots(ctx: &RenderContext<'_>) -> Vec<RegionSlot> {
    match &ctx.base {
        BaseMap::Empty => Vec::new(),
        BaseMap::Topology(resolved) => {
            let path = GeoPath::new(&ctx.projection);
            resolved
                .regions
                .iter()
                .map(|r| RegionSlot {
                    keys: r.keys.clone(),
                    anchor: r.feature.geometry.as_ref().and_then(|g| path.centroid(g)),
                })
                .collect()
        }
        BaseMap::Custom { map, .. } => map
            .regions
            .iter()
            .map(|r| RegionSlot {
                keys: vec![r.key.clone()],
                anchor: (!r.bounds.is_empty()).then(|| ctx.custom_to_canvas(r.bounds.center())),
            })
            .collect(),
    }
}

/// Element id per region, `region-<key>`, suffixed when keys repeat
pub fn region_ids(slots: &[RegionSlot]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let key = slot.keys.first().cloned().unwrap_or_else(|| i.to_string());
            let base = format!("region-{}", id_safe(&key));
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            if *n == 1 { base } else { format!("{base}-{n}") }
        })
        .collect()
}

/// Keys become part of element ids: keep them to one token
pub fn id_safe(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Result of joining rows to regions
#[derive(Debug, Clone, Default)]
pub struct ChoroplethJoin {
    /// Fill per region slot; `None` takes the default region fill
    pub fills: Vec<Option<Color>>,
    /// Matched row index per region slot
    pub rows: Vec<Option<usize>>,
    pub scale: Option<ColorScale>,
}

/// Key used for joining. Subdivision keys are already canonical codes;
/// every other geography matches case-insensitively.
fn join_key(raw: &str, geography: Geography, cache: &mut KeyCache) -> String {
    if geography.is_subdivision() {
        cache.normalize(raw, geography)
    } else {
        cache.normalize(raw, Geography::World).to_lowercase()
    }
}

/// Join data rows to region slots through the region column
pub fn join(ctx: &RenderContext<'_>, slots: &[RegionSlot], cache: &mut KeyCache) -> ChoroplethJoin {
    let Some(settings) = ctx.settings.choropleth() else {
        return ChoroplethJoin::default();
    };
    let rows = &ctx.dataset.rows;
    let geography = ctx.geography;

    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let Some(raw) = row.get(&settings.region_column).filter(|v| !v.is_blank()) else {
            continue;
        };
        let key = join_key(&raw.to_string(), geography, cache);
        if by_key.contains_key(&key) {
            crate::log::debug!(key = %key, row = i, "duplicate region key, keeping first row");
            continue;
        }
        by_key.insert(key, i);
    }

    let matched: Vec<Option<usize>> = slots
        .iter()
        .map(|slot| {
            slot.keys
                .iter()
                .find_map(|k| by_key.get(&join_key(k, geography, cache)).copied())
        })
        .collect();

    let scale = settings
        .color
        .as_ref()
        .map(|binding| build_scale(ctx, binding, ctx.styling.base.region_fill));

    let fills = matched
        .iter()
        .map(|row| {
            let (scale, binding) = (scale.as_ref()?, settings.color.as_ref()?);
            let value = rows.get((*row)?)?.get(&binding.column)?;
            scale.color_for(value)
        })
        .collect();

    crate::log::debug!(
        rows = rows.len(),
        regions = slots.len(),
        matched = matched.iter().filter(|m| m.is_some()).count(),
        "choropleth join"
    );

    ChoroplethJoin {
        fills,
        rows: matched,
        scale,
    }
}

/// Color scale over a bound column of the dataset
pub fn build_scale(ctx: &RenderContext<'_>, binding: &ColorBinding, default: Color) -> ColorScale {
    let rows = &ctx.dataset.rows;
    ColorScale::build(
        &binding.scale,
        numeric_bounds(rows, &binding.column),
        &unique_values(rows, &binding.column),
        default,
    )
}
