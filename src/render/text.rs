//! Label metrics and placement.
//!
//! Text is never shaped; its extent is estimated from the character count
//! (or a proportional width table) and the font size. Placement works on
//! those estimated boxes.

use glam::{DVec2, dvec2};
use serde::{Deserialize, Serialize};

use super::defaults;
use super::scene::TextAnchor;
use crate::settings::LabelAlignment;
use crate::template::RichText;
use crate::types::BBox;

/// Relative advance widths of printable ASCII, in hundredths of the width
/// of an average character
#[rustfmt::skip]
const PROPORTIONAL_WIDTHS: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Sum of proportional widths, in hundredths of an average character
fn proportional_length(text: &str) -> u32 {
    text.chars()
        .map(|c| match c {
            ' '..='~' => PROPORTIONAL_WIDTHS[(c as usize) - 0x20] as u32,
            _ => 100,
        })
        .sum()
}

/// How glyph advances are estimated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharWidth {
    /// Every character advances this many em
    Uniform(f64),
    /// Per-character widths scaled so an average character is 0.6 em
    Proportional,
}

impl Default for CharWidth {
    fn default() -> Self {
        CharWidth::Uniform(defaults::CHAR_WIDTH_EM)
    }
}

/// The label bounding-box estimate. Auto placement decides collisions with
/// the canvas edge from these boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelMetrics {
    pub char_width: CharWidth,
    /// Line advance in em
    pub line_height: f64,
    /// Distance auto-placed boxes keep from the canvas edge
    pub edge_margin: f64,
}

impl Default for LabelMetrics {
    fn default() -> Self {
        Self {
            char_width: CharWidth::default(),
            line_height: defaults::LINE_HEIGHT_EM,
            edge_margin: defaults::EDGE_MARGIN,
        }
    }
}

impl LabelMetrics {
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        match self.char_width {
            CharWidth::Uniform(em) => text.chars().count() as f64 * em * font_size,
            CharWidth::Proportional => {
                proportional_length(text) as f64 / 100.0 * defaults::CHAR_WIDTH_EM * font_size
            }
        }
    }

    pub fn line_advance(&self, font_size: f64) -> f64 {
        self.line_height * font_size
    }

    /// Estimated width and height of a text block
    pub fn block_size(&self, text: &RichText, font_size: f64) -> DVec2 {
        let lines = text.line_texts();
        let width = lines
            .iter()
            .map(|l| self.text_width(l, font_size))
            .fold(0.0, f64::max);
        dvec2(width, lines.len() as f64 * self.line_advance(font_size))
    }
}

/// Where a text block goes: the x of its anchor edge and its vertical center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: DVec2,
    pub anchor: TextAnchor,
}

impl Placement {
    /// Box covered by a block of `size` at this placement
    pub fn bounds(&self, size: DVec2) -> BBox {
        let left = match self.anchor {
            TextAnchor::Start => self.position.x,
            TextAnchor::Middle => self.position.x - size.x / 2.0,
            TextAnchor::End => self.position.x - size.x,
        };
        BBox::from_origin_size(dvec2(left, self.position.y - size.y / 2.0), size)
    }

    /// Center point of each line
    pub fn line_positions(&self, lines: usize, advance: f64) -> Vec<DVec2> {
        let top = self.position.y - lines as f64 * advance / 2.0;
        (0..lines)
            .map(|i| dvec2(self.position.x, top + (i as f64 + 0.5) * advance))
            .collect()
    }
}

/// Auto placement tries these in order
const AUTO_CANDIDATES: [LabelAlignment; 4] = [
    LabelAlignment::Right,
    LabelAlignment::Left,
    LabelAlignment::Bottom,
    LabelAlignment::Top,
];

/// Placement for an explicit alignment `margin` away from `at`
fn place_fixed(alignment: LabelAlignment, at: DVec2, margin: f64, size: DVec2) -> Placement {
    use LabelAlignment::*;
    let dx = match alignment {
        TopLeft | Left | BottomLeft => -margin,
        TopRight | Right | BottomRight => margin,
        Top | Center | Bottom | Auto => 0.0,
    };
    let dy = match alignment {
        TopLeft | Top | TopRight => -(margin + size.y / 2.0),
        BottomLeft | Bottom | BottomRight => margin + size.y / 2.0,
        Left | Center | Right | Auto => 0.0,
    };
    let anchor = match dx {
        d if d > 0.0 => TextAnchor::Start,
        d if d < 0.0 => TextAnchor::End,
        _ => TextAnchor::Middle,
    };
    Placement {
        position: at + dvec2(dx, dy),
        anchor,
    }
}

/// Place a block of `size` around `at`.
///
/// `Auto` takes the first of right, left, below and above whose box stays
/// `edge_margin` inside `canvas`, falling back to the right.
pub fn place_label(
    alignment: LabelAlignment,
    at: DVec2,
    margin: f64,
    size: DVec2,
    canvas: BBox,
    edge_margin: f64,
) -> Placement {
    if alignment != LabelAlignment::Auto {
        return place_fixed(alignment, at, margin, size);
    }
    let safe = canvas.inset(edge_margin);
    AUTO_CANDIDATES
        .iter()
        .map(|a| place_fixed(*a, at, margin, size))
        .find(|p| safe.contains_box(&p.bounds(size)))
        .unwrap_or_else(|| place_fixed(LabelAlignment::Right, at, margin, size))
}
