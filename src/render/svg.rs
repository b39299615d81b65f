//! SVG serialization of a [`Scene`]

use std::fmt::Write;

use super::scene::*;
use crate::color::Color;
use crate::settings::{FontStyle, FontWeight, TextDecoration};
use crate::template::SpanStyle;

/// Format a canvas coordinate: two decimals, trailing zeros trimmed
pub(crate) fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Escape text content. Only `&`, `<` and `>` need it.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Attribute list builder; `None` values are skipped
#[derive(Default)]
struct Attrs(String);

impl Attrs {
    fn add(&mut self, name: &str, value: impl AsRef<str>) -> &mut Self {
        let _ = write!(self.0, " {}=\"{}\"", name, escape_attr(value.as_ref()));
        self
    }

    fn opt(&mut self, name: &str, value: Option<impl AsRef<str>>) -> &mut Self {
        if let Some(v) = value {
            self.add(name, v);
        }
        self
    }

    fn num(&mut self, name: &str, value: f64) -> &mut Self {
        self.add(name, fmt_num(value))
    }

    fn paint(&mut self, paint: &Paint) -> &mut Self {
        match &paint.fill {
            Some(Fill::Color(c)) => {
                self.add("fill", c.to_svg());
            }
            Some(Fill::Gradient(id)) => {
                self.add("fill", format!("url(#{id})"));
            }
            None => {}
        }
        self.opt("stroke", paint.stroke.map(Color::to_svg));
        self.opt("stroke-width", paint.stroke_width.map(fmt_num));
        self.opt("stroke-dasharray", paint.dash.as_deref());
        self.opt("opacity", paint.opacity.filter(|o| *o < 1.0).map(fmt_num));
        if paint.round_joins {
            self.add("stroke-linejoin", "round").add("stroke-linecap", "round");
        }
        self
    }
}

fn font_attrs(attrs: &mut Attrs, font: &Font) {
    attrs.add("font-family", &font.family).num("font-size", font.size);
    if font.weight == FontWeight::Bold {
        attrs.add("font-weight", "bold");
    }
    if font.style == FontStyle::Italic {
        attrs.add("font-style", "italic");
    }
    match font.decoration {
        TextDecoration::None => {}
        TextDecoration::Underline => {
            attrs.add("text-decoration", "underline");
        }
        TextDecoration::LineThrough => {
            attrs.add("text-decoration", "line-through");
        }
    }
}

fn span_attrs(style: &SpanStyle) -> Attrs {
    let mut attrs = Attrs::default();
    if style.bold {
        attrs.add("font-weight", "bold");
    }
    if style.italic {
        attrs.add("font-style", "italic");
    }
    match (style.underline, style.strike) {
        (true, true) => {
            attrs.add("text-decoration", "underline line-through");
        }
        (true, false) => {
            attrs.add("text-decoration", "underline");
        }
        (false, true) => {
            attrs.add("text-decoration", "line-through");
        }
        (false, false) => {}
    }
    attrs
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Group(g) => {
            let mut a = Attrs::default();
            a.opt("id", g.id.as_deref())
                .opt("class", g.class.as_deref())
                .opt("transform", g.transform.as_deref())
                .opt("clip-path", g.clip_path.as_ref().map(|id| format!("url(#{id})")))
                .paint(&g.paint);
            if g.children.is_empty() {
                let _ = writeln!(out, "{indent}<g{}/>", a.0);
                return;
            }
            let _ = writeln!(out, "{indent}<g{}>", a.0);
            for child in &g.children {
                write_node(out, child, depth + 1);
            }
            let _ = writeln!(out, "{indent}</g>");
        }
        Node::Path(p) => {
            let mut a = Attrs::default();
            a.opt("id", p.id.as_deref())
                .opt("class", p.class.as_deref())
                .add("d", &p.d)
                .opt("transform", p.transform.as_deref())
                .paint(&p.paint)
                .opt("marker-start", p.marker_start.as_ref().map(|m| format!("url(#{m})")))
                .opt("marker-end", p.marker_end.as_ref().map(|m| format!("url(#{m})")));
            let _ = writeln!(out, "{indent}<path{}/>", a.0);
        }
        Node::Circle(c) => {
            let mut a = Attrs::default();
            a.opt("id", c.id.as_deref())
                .opt("class", c.class.as_deref())
                .num("cx", c.center.x)
                .num("cy", c.center.y)
                .num("r", c.radius)
                .paint(&c.paint);
            let _ = writeln!(out, "{indent}<circle{}/>", a.0);
        }
        Node::Rect(r) => {
            let mut a = Attrs::default();
            a.opt("id", r.id.as_deref())
                .opt("class", r.class.as_deref())
                .num("x", r.origin.x)
                .num("y", r.origin.y)
                .num("width", r.size.x)
                .num("height", r.size.y)
                .opt("transform", r.transform.as_deref())
                .paint(&r.paint);
            let _ = writeln!(out, "{indent}<rect{}/>", a.0);
        }
        Node::Text(t) => write_text(out, t, &indent),
    }
}

fn write_text(out: &mut String, t: &TextNode, indent: &str) {
    let mut a = Attrs::default();
    a.opt("id", t.id.as_deref()).opt("class", t.class.as_deref());
    let anchor = match t.anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    };
    a.add("text-anchor", anchor).add("dominant-baseline", "central");
    font_attrs(&mut a, &t.font);
    a.add("fill", t.fill.to_svg());
    let _ = write!(out, "{indent}<text{}>", a.0);
    for line in &t.lines {
        let mut la = Attrs::default();
        la.num("x", line.position.x).num("y", line.position.y);
        let _ = write!(out, "<tspan{}>", la.0);
        for span in &line.spans {
            let text = escape_text(&span.text);
            if span.style.is_plain() {
                out.push_str(&text);
            } else {
                let _ = write!(out, "<tspan{}>{}</tspan>", span_attrs(&span.style).0, text);
            }
        }
        out.push_str("</tspan>");
    }
    out.push_str("</text>\n");
}

fn write_def(out: &mut String, def: &Def) {
    match def {
        Def::Marker(m) => {
            let mut a = Attrs::default();
            a.add("id", &m.id)
                .add(
                    "viewBox",
                    format!(
                        "{} {} {} {}",
                        fmt_num(m.view_box.min.x),
                        fmt_num(m.view_box.min.y),
                        fmt_num(m.view_box.width()),
                        fmt_num(m.view_box.height())
                    ),
                )
                .num("refX", m.ref_point.x)
                .num("refY", m.ref_point.y)
                .num("markerWidth", m.size)
                .num("markerHeight", m.size)
                .add("markerUnits", "userSpaceOnUse")
                .add("orient", "auto");
            let _ = writeln!(out, "    <marker{}>", a.0);
            write_node(out, &m.shape, 3);
            out.push_str("    </marker>\n");
        }
        Def::ClipPath { id, d } => {
            let _ = writeln!(
                out,
                "    <clipPath id=\"{}\"><path d=\"{}\"/></clipPath>",
                escape_attr(id),
                escape_attr(d)
            );
        }
        Def::LinearGradient { id, stops } => {
            let _ = writeln!(out, "    <linearGradient id=\"{}\">", escape_attr(id));
            for stop in stops {
                let _ = writeln!(
                    out,
                    "      <stop offset=\"{}%\" stop-color=\"{}\"/>",
                    fmt_num(stop.offset * 100.0),
                    stop.color.to_svg()
                );
            }
            out.push_str("    </linearGradient>\n");
        }
    }
}

/// Serialize a scene as a standalone SVG document
pub fn write_svg(scene: &Scene) -> String {
    let mut out = String::new();
    let w = fmt_num(scene.width);
    let h = fmt_num(scene.height);
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    if !scene.defs.is_empty() {
        out.push_str("  <defs>\n");
        for def in &scene.defs {
            write_def(&mut out, def);
        }
        out.push_str("  </defs>\n");
    }
    if let Some(bg) = scene.background.filter(|c| *c != Color::None) {
        let _ = writeln!(
            out,
            "  <rect class=\"background\" width=\"{w}\" height=\"{h}\" fill=\"{}\"/>",
            bg.to_svg()
        );
    }
    for node in &scene.children {
        write_node(&mut out, node, 1);
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Span;
    use glam::dvec2;

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.5), "1.5");
        assert_eq!(fmt_num(2.456), "2.46");
        assert_eq!(fmt_num(-0.001), "0");
        assert_eq!(fmt_num(f64::NAN), "0");
    }

    #[test]
    fn writes_nodes_and_escapes() {
        let mut scene = Scene::new(10.0, 10.0);
        scene.children.push(Node::Path(PathNode {
            id: Some("a\"b".into()),
            d: "M0,0L1,1".into(),
            paint: Paint::stroke(Color::BLACK, 1.5),
            ..Default::default()
        }));
        let svg = write_svg(&scene);
        insta::assert_snapshot!(svg, @r###"
        <svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
          <path id="a&quot;b" d="M0,0L1,1" fill="none" stroke="#000000" stroke-width="1.5"/>
        </svg>
        "###);
    }

    #[test]
    fn text_spans_carry_markup() {
        let mut scene = Scene::new(10.0, 10.0);
        scene.children.push(Node::Text(TextNode {
            id: Some("t".into()),
            class: None,
            anchor: TextAnchor::Middle,
            font: Font {
                family: "serif".into(),
                size: 12.0,
                weight: FontWeight::Normal,
                style: FontStyle::Normal,
                decoration: TextDecoration::None,
            },
            fill: Color::BLACK,
            lines: vec![TextLine {
                position: dvec2(5.0, 5.0),
                spans: vec![
                    Span { text: "a<".into(), style: SpanStyle::default() },
                    Span { text: "b".into(), style: SpanStyle { bold: true, ..Default::default() } },
                ],
            }],
        }));
        let svg = write_svg(&scene);
        assert!(svg.contains(
            r##"<text id="t" text-anchor="middle" dominant-baseline="central" font-family="serif" font-size="12" fill="#000000"><tspan x="5" y="5">a&lt;<tspan font-weight="bold">b</tspan></tspan></text>"##
        ));
    }
}
