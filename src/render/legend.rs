//! Legend panels for the active size and color scales.
//!
//! Panels stack below the map in a fixed order (size, symbol color,
//! choropleth color), each horizontally centered on the canvas.

use glam::{DVec2, dvec2};

use super::context::RenderContext;
use super::defaults;
use super::scene::{
    CircleNode, Def, Fill, Font, GradientStop, Group, Node, Paint, RectNode, TextAnchor, TextLine,
    TextNode,
};
use crate::color::Color;
use crate::data::Value;
use crate::format::format_value;
use crate::scale::{ColorScale, SizeScale};
use crate::settings::{FontStyle, FontWeight, TextDecoration};
use crate::template::RichText;

/// Space between a panel title and its body
const TITLE_GAP: f64 = 6.0;
/// Space between a swatch or bar and its text
const TEXT_GAP: f64 = 4.0;
/// Horizontal distance between the two size samples
const SIZE_SAMPLE_SPACING: f64 = 80.0;

/// What one panel shows
#[derive(Debug, Clone)]
pub enum LegendKind<'s> {
    Size(&'s SizeScale),
    Color {
        scale: &'s ColorScale,
        /// Suffix for the gradient definition id
        gradient: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct LegendSpec<'s> {
    pub id: &'static str,
    /// Bound column, used as the title and for value formatting
    pub column: &'s str,
    pub kind: LegendKind<'s>,
}

/// Rendered legends: the group, the definitions it uses and the height it
/// adds below the map
pub struct Legends {
    pub node: Node,
    pub defs: Vec<Def>,
    pub height: f64,
}

/// Lay out every panel that has something to show
pub fn render_legends(ctx: &RenderContext<'_>, specs: &[LegendSpec<'_>]) -> Legends {
    let mut group = Group::new("legends");
    let mut defs = Vec::new();
    let mut top = ctx.canvas.height + defaults::LEGEND_GAP;
    for spec in specs {
        let Some((panel, height)) = render_panel(ctx, spec, top, &mut defs) else {
            continue;
        };
        group.children.push(Node::Group(panel));
        top += height + defaults::LEGEND_GAP;
    }
    let height = if group.children.is_empty() {
        0.0
    } else {
        top - ctx.canvas.height
    };
    Legends {
        node: Node::Group(group),
        defs,
        height,
    }
}

fn font(ctx: &RenderContext<'_>, size: f64, bold: bool) -> Font {
    Font {
        family: ctx.styling.label.font_family.clone(),
        size,
        weight: if bold { FontWeight::Bold } else { FontWeight::Normal },
        style: FontStyle::Normal,
        decoration: TextDecoration::None,
    }
}

fn text(ctx: &RenderContext<'_>, s: &str, at: DVec2, anchor: TextAnchor, size: f64, bold: bool) -> Node {
    let rich = RichText::plain(s);
    Node::Text(TextNode {
        id: None,
        class: None,
        anchor,
        font: font(ctx, size, bold),
        fill: defaults::LABEL_COLOR,
        lines: rich
            .lines
            .into_iter()
            .map(|spans| TextLine { position: at, spans })
            .collect(),
    })
}

fn value_label(ctx: &RenderContext<'_>, column: &str, v: f64) -> String {
    format_value(
        &Value::Number(v),
        ctx.dataset.column_type(column),
        ctx.dataset.column_format(column),
        ctx.geography,
    )
}

fn render_panel(
    ctx: &RenderContext<'_>,
    spec: &LegendSpec<'_>,
    top: f64,
    defs: &mut Vec<Def>,
) -> Option<(Group, f64)> {
    let cx = ctx.canvas.width / 2.0;
    let pad = defaults::LEGEND_PADDING;
    let text_size = defaults::LEGEND_TEXT_SIZE;
    let mut group = Group::new(spec.id).with_class("legend");
    group.children.push(text(
        ctx,
        spec.column,
        dvec2(cx, top + pad + defaults::LEGEND_TITLE_SIZE / 2.0),
        TextAnchor::Middle,
        defaults::LEGEND_TITLE_SIZE,
        true,
    ));
    let body = top + pad + defaults::LEGEND_TITLE_SIZE + TITLE_GAP;

    let body_height = match &spec.kind {
        LegendKind::Size(SizeScale::Flat(_)) | LegendKind::Color { scale: ColorScale::Flat(_), .. } => {
            return None;
        }
        LegendKind::Size(SizeScale::Linear { domain, range, .. }) => {
            let diameter = range.0.max(range.1);
            let cy = body + diameter / 2.0;
            let label_y = body + diameter + TEXT_GAP + text_size / 2.0;
            let samples = [
                (cx - SIZE_SAMPLE_SPACING / 2.0, range.0, domain.min()),
                (cx + SIZE_SAMPLE_SPACING / 2.0, range.1, domain.max()),
            ];
            for (x, size, value) in samples {
                group.children.push(Node::Circle(CircleNode {
                    center: dvec2(x, cy),
                    radius: size / 2.0,
                    paint: Paint::fill(Color::None).with_stroke(defaults::LABEL_COLOR, 1.0),
                    ..Default::default()
                }));
                group.children.push(text(
                    ctx,
                    &value_label(ctx, spec.column, value),
                    dvec2(x, label_y),
                    TextAnchor::Middle,
                    text_size,
                    false,
                ));
            }
            diameter + TEXT_GAP + text_size
        }
        LegendKind::Color {
            scale: ColorScale::Continuous(scale),
            gradient,
        } => {
            let gradient_id = format!("legend-gradient-{gradient}");
            defs.push(Def::LinearGradient {
                id: gradient_id.clone(),
                stops: scale
                    .stops()
                    .into_iter()
                    .map(|(offset, color)| GradientStop { offset, color })
                    .collect(),
            });
            let width = defaults::LEGEND_BAR_WIDTH;
            let left = cx - width / 2.0;
            group.children.push(Node::Rect(RectNode {
                origin: dvec2(left, body),
                size: dvec2(width, defaults::LEGEND_BAR_HEIGHT),
                paint: Paint {
                    fill: Some(Fill::Gradient(gradient_id)),
                    ..Default::default()
                },
                ..Default::default()
            }));
            let label_y = body + defaults::LEGEND_BAR_HEIGHT + TEXT_GAP + text_size / 2.0;
            let domain = scale.domain;
            let mut ticks = vec![
                (left, domain.min(), TextAnchor::Start),
                (left + width, domain.max(), TextAnchor::End),
            ];
            if let Some((mid, _)) = scale.mid {
                let t = domain.normalize_clamped(mid);
                ticks.insert(1, (left + width * t, mid, TextAnchor::Middle));
            }
            for (x, value, anchor) in ticks {
                group.children.push(text(
                    ctx,
                    &value_label(ctx, spec.column, value),
                    dvec2(x, label_y),
                    anchor,
                    text_size,
                    false,
                ));
            }
            defaults::LEGEND_BAR_HEIGHT + TEXT_GAP + text_size
        }
        LegendKind::Color {
            scale: ColorScale::Categorical(scale),
            ..
        } => {
            let total = scale.assignments.len();
            let shown = total.min(defaults::LEGEND_MAX_ENTRIES);
            let mut entries: Vec<(String, Option<Color>)> = scale
                .assignments
                .iter()
                .take(shown)
                .map(|(k, c)| (k.clone(), Some(*c)))
                .collect();
            if total > shown {
                entries.push((format!("+{} more", total - shown), None));
            }
            let metrics = ctx.metrics();
            let text_width = entries
                .iter()
                .map(|(label, _)| metrics.text_width(label, text_size))
                .fold(0.0, f64::max);
            let width = defaults::LEGEND_SWATCH + TEXT_GAP + text_width;
            let left = cx - width / 2.0;
            for (i, (label, color)) in entries.iter().enumerate() {
                let row_top = body + i as f64 * defaults::LEGEND_ROW_HEIGHT;
                let row_mid = row_top + defaults::LEGEND_SWATCH / 2.0;
                if let Some(color) = color {
                    group.children.push(Node::Rect(RectNode {
                        origin: dvec2(left, row_top),
                        size: DVec2::splat(defaults::LEGEND_SWATCH),
                        paint: Paint::fill(*color),
                        ..Default::default()
                    }));
                }
                group.children.push(text(
                    ctx,
                    label,
                    dvec2(left + defaults::LEGEND_SWATCH + TEXT_GAP, row_mid),
                    TextAnchor::Start,
                    text_size,
                    false,
                ));
            }
            entries.len() as f64 * defaults::LEGEND_ROW_HEIGHT
        }
    };

    let height = pad + defaults::LEGEND_TITLE_SIZE + TITLE_GAP + body_height + pad;
    Some((group, height))
}
