//! Default sizes, colors and layout constants (pixels unless noted)

use crate::color::Color;

pub const CANVAS_WIDTH: f64 = 975.0;
pub const CANVAS_HEIGHT: f64 = 610.0;
/// Gap kept between fitted geometry and the canvas edge
pub const FIT_PADDING: f64 = 20.0;

pub const BACKGROUND: Color = Color::WHITE;
pub const NATION_FILL: Color = Color::rgb(0xf3, 0xf4, 0xf6);
pub const NATION_STROKE: Color = Color::rgb(0x6b, 0x72, 0x80);
pub const NATION_STROKE_WIDTH: f64 = 1.0;
pub const REGION_FILL: Color = Color::rgb(0xe5, 0xe7, 0xeb);
pub const REGION_STROKE: Color = Color::WHITE;
pub const REGION_STROKE_WIDTH: f64 = 0.75;

pub const SYMBOL_SIZE: f64 = 10.0;
pub const SYMBOL_FILL: Color = Color::rgb(0x25, 0x63, 0xeb);
pub const SYMBOL_STROKE: Color = Color::WHITE;
pub const SYMBOL_STROKE_WIDTH: f64 = 1.0;
pub const SYMBOL_OPACITY: f64 = 0.85;
pub const SIZE_RANGE_MIN: f64 = 4.0;
pub const SIZE_RANGE_MAX: f64 = 30.0;

pub const CONTINUOUS_MIN_COLOR: Color = Color::rgb(0xef, 0xf3, 0xff);
pub const CONTINUOUS_MAX_COLOR: Color = Color::rgb(0x08, 0x51, 0x9c);
/// Tableau 10
pub const CATEGORY_PALETTE: [Color; 10] = [
    Color::rgb(0x4e, 0x79, 0xa7),
    Color::rgb(0xf2, 0x8e, 0x2b),
    Color::rgb(0xe1, 0x57, 0x59),
    Color::rgb(0x76, 0xb7, 0xb2),
    Color::rgb(0x59, 0xa1, 0x4f),
    Color::rgb(0xed, 0xc9, 0x48),
    Color::rgb(0xb0, 0x7a, 0xa1),
    Color::rgb(0xff, 0x9d, 0xa7),
    Color::rgb(0x9c, 0x75, 0x5f),
    Color::rgb(0xba, 0xb0, 0xac),
];

pub const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
pub const FONT_SIZE: f64 = 12.0;
pub const LABEL_COLOR: Color = Color::rgb(0x11, 0x18, 0x27);
/// Gap between a label and the edge of its symbol
pub const LABEL_GAP: f64 = 4.0;
/// Estimated glyph advance in em
pub const CHAR_WIDTH_EM: f64 = 0.6;
pub const LINE_HEIGHT_EM: f64 = 1.2;
/// Auto placement keeps label boxes this far inside the canvas
pub const EDGE_MARGIN: f64 = 4.0;

pub const LEGEND_GAP: f64 = 16.0;
pub const LEGEND_PADDING: f64 = 8.0;
pub const LEGEND_TITLE_SIZE: f64 = 12.0;
pub const LEGEND_TEXT_SIZE: f64 = 11.0;
pub const LEGEND_BAR_WIDTH: f64 = 200.0;
pub const LEGEND_BAR_HEIGHT: f64 = 12.0;
pub const LEGEND_SWATCH: f64 = 12.0;
pub const LEGEND_ROW_HEIGHT: f64 = 18.0;
pub const LEGEND_MAX_ENTRIES: usize = 10;

pub const PATH_STROKE: Color = Color::rgb(0xdc, 0x26, 0x26);
pub const PATH_STROKE_WIDTH: f64 = 2.0;
pub const PATH_OUTLINE: Color = Color::WHITE;
/// Marker size as a multiple of stroke width
pub const MARKER_SCALE: f64 = 4.0;
pub const HANDLE_RADIUS: f64 = 5.0;
pub const CONTROL_HANDLE_RADIUS: f64 = 3.5;
pub const HANDLE_COLOR: Color = Color::rgb(0x25, 0x63, 0xeb);
