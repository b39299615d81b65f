//! Label templates and the rich text they expand into.
//!
//! A template is parsed once into pieces. Expansion substitutes each
//! `{column}` with a caller-formatted value (inserted as plain text, never
//! re-parsed as markup) and resolves the markup tags into styled spans,
//! split into lines.

use pest::Parser;

use crate::{Rule, TemplateParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Markup {
    Bold,
    Italic,
    Underline,
    Strike,
}

impl Markup {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "b" | "strong" => Some(Markup::Bold),
            "i" | "em" => Some(Markup::Italic),
            "u" => Some(Markup::Underline),
            "s" | "strike" | "del" => Some(Markup::Strike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Field(String),
    Open(Markup),
    Close(Markup),
    Break,
}

/// A parsed label template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Parse a template. Never fails: unrecognised syntax is literal text.
    pub fn parse(src: &str) -> Template {
        let pairs = match TemplateParser::parse(Rule::template, src) {
            Ok(mut pairs) => match pairs.next() {
                Some(template) => template.into_inner(),
                None => return Template::literal(src),
            },
            Err(_err) => {
                crate::log::debug!(error = %_err, "template parse failed, using literal text");
                return Template::literal(src);
            }
        };

        let mut pieces = Vec::new();
        for pair in pairs {
            let piece = match pair.as_rule() {
                Rule::field => {
                    let column = pair.into_inner().next().map(|c| c.as_str()).unwrap_or_default();
                    Piece::Field(column.to_string())
                }
                Rule::line_break => Piece::Break,
                Rule::open_tag | Rule::close_tag => {
                    let is_open = pair.as_rule() == Rule::open_tag;
                    let text = pair.as_str().to_string();
                    let markup = pair
                        .into_inner()
                        .next()
                        .and_then(|t| Markup::from_tag(t.as_str()));
                    match (markup, is_open) {
                        (Some(m), true) => Piece::Open(m),
                        (Some(m), false) => Piece::Close(m),
                        (None, _) => Piece::Text(text),
                    }
                }
                Rule::text | Rule::stray => Piece::Text(pair.as_str().to_string()),
                _ => continue,
            };
            pieces.push(piece);
        }
        Template { pieces }
    }

    fn literal(src: &str) -> Template {
        Template {
            pieces: vec![Piece::Text(src.to_string())],
        }
    }

    /// Column names referenced by placeholders, in order of appearance
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Field(c) => Some(c.as_str()),
            _ => None,
        })
    }

    /// Expand with `lookup` supplying the display text of each column.
    /// Unknown columns expand to nothing.
    pub fn expand(&self, mut lookup: impl FnMut(&str) -> Option<String>) -> RichText {
        let mut builder = RichTextBuilder::default();
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => builder.push_text(t),
                Piece::Field(column) => {
                    if let Some(value) = lookup(column) {
                        // Values may carry their own newlines
                        for (i, part) in value.split('\n').enumerate() {
                            if i > 0 {
                                builder.line_break();
                            }
                            builder.push_text(part);
                        }
                    }
                }
                Piece::Open(m) => builder.open(*m),
                Piece::Close(m) => builder.close(*m),
                Piece::Break => builder.line_break(),
            }
        }
        builder.finish()
    }
}

/// Inline style of a span of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
}

impl SpanStyle {
    pub fn is_plain(&self) -> bool {
        *self == SpanStyle::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Styled text split into lines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichText {
    pub lines: Vec<Vec<Span>>,
}

impl RichText {
    /// A single unstyled line
    pub fn plain(text: impl Into<String>) -> Self {
        let mut builder = RichTextBuilder::default();
        builder.push_text(&text.into());
        builder.finish()
    }

    /// True when there is no visible text
    pub fn is_empty(&self) -> bool {
        self.lines
            .iter()
            .flatten()
            .all(|s| s.text.trim().is_empty())
    }

    /// Text without markup, lines joined by `\n`
    pub fn to_plain_string(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain text of each line
    pub fn line_texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect())
            .collect()
    }
}

#[derive(Default)]
struct RichTextBuilder {
    lines: Vec<Vec<Span>>,
    current: Vec<Span>,
    // Open-tag depth per markup kind; closing an unopened tag is ignored
    depth: [u32; 4],
}

impl RichTextBuilder {
    fn slot(m: Markup) -> usize {
        match m {
            Markup::Bold => 0,
            Markup::Italic => 1,
            Markup::Underline => 2,
            Markup::Strike => 3,
        }
    }

    fn style(&self) -> SpanStyle {
        SpanStyle {
            bold: self.depth[0] > 0,
            italic: self.depth[1] > 0,
            underline: self.depth[2] > 0,
            strike: self.depth[3] > 0,
        }
    }

    fn open(&mut self, m: Markup) {
        self.depth[Self::slot(m)] += 1;
    }

    fn close(&mut self, m: Markup) {
        let d = &mut self.depth[Self::slot(m)];
        *d = d.saturating_sub(1);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = self.style();
        match self.current.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.current.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn line_break(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn finish(mut self) -> RichText {
        self.lines.push(self.current);
        RichText { lines: self.lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(template: &str, row: &[(&str, &str)]) -> RichText {
        Template::parse(template).expand(|col| {
            row.iter()
                .find(|(k, _)| *k == col)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn substitutes_fields() {
        let text = expand("{name}: {value}", &[("name", "X"), ("value", "1.5K")]);
        assert_eq!(text.to_plain_string(), "X: 1.5K");
        assert_eq!(text.lines.len(), 1);
    }

    #[test]
    fn unknown_columns_are_empty() {
        let text = expand("{missing}!", &[]);
        assert_eq!(text.to_plain_string(), "!");
    }

    #[test]
    fn splits_on_breaks() {
        let text = expand("a\nb<br>c<BR />d<br/>e", &[]);
        assert_eq!(text.line_texts(), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn markup_styles_spans() {
        let text = expand("<b>bold <i>both</i></b> <u>u</u><del>s</del>", &[]);
        let line = &text.lines[0];
        assert_eq!(line[0].text, "bold ");
        assert!(line[0].style.bold && !line[0].style.italic);
        assert_eq!(line[1].text, "both");
        assert!(line[1].style.bold && line[1].style.italic);
        assert!(line[2].style.is_plain());
        assert!(line[3].style.underline);
        assert!(line[4].style.strike);
    }

    #[test]
    fn other_angle_brackets_are_literal() {
        let text = expand("a < b <span>c</span> {x", &[]);
        assert_eq!(text.to_plain_string(), "a < b <span>c</span> {x");
    }

    #[test]
    fn values_are_not_parsed_as_markup() {
        let text = expand("{v}", &[("v", "<b>x</b>")]);
        assert_eq!(text.to_plain_string(), "<b>x</b>");
        assert!(text.lines[0][0].style.is_plain());
    }

    #[test]
    fn columns_in_order() {
        let t = Template::parse("{a} and {b} and {a}");
        assert_eq!(t.columns().collect::<Vec<_>>(), ["a", "b", "a"]);
    }

    #[test]
    fn expansion_is_repeatable() {
        let t = Template::parse("<b>{name}</b>\n{value}");
        let lookup = |c: &str| Some(format!("<{c}>"));
        assert_eq!(t.expand(lookup), t.expand(lookup));
    }
}
