//! Label layers for symbols and choropleth regions.
//!
//! Label ids are `symbol-<row index>` and `choropleth-<region key>`. An
//! override for an id replaces the computed style fields it sets and, with a
//! position, the computed placement.

use std::collections::HashSet;

use glam::DVec2;

use super::choropleth::{ChoroplethJoin, RegionSlot, id_safe};
use super::context::{RenderContext, region_label_margin, symbol_label_margin};
use super::scene::{Font, Group, Node, TextLine, TextNode};
use super::symbols::SymbolMark;
use super::text::{Placement, place_label};
use crate::settings::LabelStyle;
use crate::template::RichText;

pub fn symbol_label_id(row: usize) -> String {
    format!("symbol-{row}")
}

pub fn choropleth_label_id(key: &str) -> String {
    format!("choropleth-{}", id_safe(key))
}

/// One label, positioned and styled
pub fn label_node(
    ctx: &RenderContext<'_>,
    id: String,
    text: &RichText,
    at: DVec2,
    margin: f64,
) -> Node {
    let (style, label_override) = ctx.label_style(&id);
    let metrics = ctx.metrics();
    let size = metrics.block_size(text, style.font_size);
    let computed = place_label(
        style.alignment,
        at,
        margin,
        size,
        ctx.map_bounds(),
        metrics.edge_margin,
    );
    let placement = match label_override.and_then(|o| o.position) {
        Some(position) => Placement {
            position,
            anchor: computed.anchor,
        },
        None => computed,
    };
    text_node(ctx, id, text, &style, placement)
}

pub fn text_node(
    ctx: &RenderContext<'_>,
    id: String,
    text: &RichText,
    style: &LabelStyle,
    placement: Placement,
) -> Node {
    let advance = ctx.metrics().line_advance(style.font_size);
    let positions = placement.line_positions(text.lines.len(), advance);
    let selected = ctx.selected_label == Some(id.as_str());
    Node::Text(TextNode {
        class: Some(if selected { "label selected" } else { "label" }.into()),
        id: Some(id),
        anchor: placement.anchor,
        font: Font {
            family: style.font_family.clone(),
            size: style.font_size,
            weight: style.font_weight,
            style: style.font_style,
            decoration: style.decoration,
        },
        fill: style.color,
        lines: text
            .lines
            .iter()
            .zip(positions)
            .map(|(spans, position)| TextLine {
                position,
                spans: spans.clone(),
            })
            .collect(),
    })
}

pub fn render_symbol_labels(ctx: &RenderContext<'_>, marks: &[SymbolMark]) -> Node {
    let mut group = Group::new("symbol-labels");
    for mark in marks {
        let Some(row) = ctx.dataset.rows.get(mark.row) else {
            continue;
        };
        let Some(text) = ctx.label_text(row) else {
            continue;
        };
        group.children.push(label_node(
            ctx,
            symbol_label_id(mark.row),
            &text,
            mark.center,
            symbol_label_margin(mark.size),
        ));
    }
    Node::Group(group)
}

/// Labels for matched regions, one per key
pub fn render_choropleth_labels(ctx: &RenderContext<'_>, slots: &[RegionSlot], join: &ChoroplethJoin) -> Node {
    let mut group = Group::new("choropleth-labels");
    let mut seen = HashSet::new();
    for (slot, row) in slots.iter().zip(&join.rows) {
        let (Some(row), Some(at), Some(key)) = (*row, slot.anchor, slot.keys.first()) else {
            continue;
        };
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(text) = ctx.dataset.rows.get(row).and_then(|r| ctx.label_text(r)) else {
            continue;
        };
        group.children.push(label_node(
            ctx,
            choropleth_label_id(key),
            &text,
            at,
            region_label_margin(),
        ));
    }
    Node::Group(group)
}
