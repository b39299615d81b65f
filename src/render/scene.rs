//! Immutable scene description.
//!
//! A render pass produces a [`Scene`]; hosts either serialize it whole or
//! diff it against the previous scene and patch only the changed elements.
//! Node ids are stable across renders for unchanged inputs.

use glam::DVec2;
use indexmap::IndexMap;
use serde::Serialize;

use crate::color::Color;
use crate::settings::{FontStyle, FontWeight, TextDecoration};
use crate::template::Span;
use crate::types::BBox;

/// Fill paint: a color or a reference to a gradient definition
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Color(Color),
    Gradient(String),
}

impl From<Color> for Fill {
    fn from(c: Color) -> Self {
        Fill::Color(c)
    }
}

/// Presentation attributes shared by shapes and groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Fill>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub dash: Option<String>,
    pub opacity: Option<f64>,
    pub round_joins: bool,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(Fill::Color(color)),
            ..Default::default()
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            fill: Some(Fill::Color(Color::None)),
            stroke: Some(color),
            stroke_width: Some(width),
            ..Default::default()
        }
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = Some(width);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub id: Option<String>,
    pub class: Option<String>,
    pub transform: Option<String>,
    /// Id of a clip path definition
    pub clip_path: Option<String>,
    pub paint: Paint,
    pub children: Vec<Node>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathNode {
    pub id: Option<String>,
    pub class: Option<String>,
    pub d: String,
    pub paint: Paint,
    pub marker_start: Option<String>,
    pub marker_end: Option<String>,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CircleNode {
    pub id: Option<String>,
    pub class: Option<String>,
    pub center: DVec2,
    pub radius: f64,
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RectNode {
    pub id: Option<String>,
    pub class: Option<String>,
    pub origin: DVec2,
    pub size: DVec2,
    pub paint: Paint,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub decoration: TextDecoration,
}

/// One line of text, centered vertically on `position`
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub position: DVec2,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub id: Option<String>,
    pub class: Option<String>,
    pub anchor: TextAnchor,
    pub font: Font,
    pub fill: Color,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Path(PathNode),
    Circle(CircleNode),
    Rect(RectNode),
    Text(TextNode),
}

impl Node {
    pub fn id(&self) -> Option<&str> {
        match self {
            Node::Group(g) => g.id.as_deref(),
            Node::Path(p) => p.id.as_deref(),
            Node::Circle(c) => c.id.as_deref(),
            Node::Rect(r) => r.id.as_deref(),
            Node::Text(t) => t.id.as_deref(),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Group(g) => &g.children,
            _ => &[],
        }
    }

    fn find(&self, id: &str) -> Option<&Node> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id() == Some(id) {
            return Some(self);
        }
        match self {
            Node::Group(g) => g.children.iter_mut().find_map(|c| c.find_mut(id)),
            _ => None,
        }
    }

    /// The node with every identified descendant removed, so that changes
    /// to those descendants are attributed to them alone
    fn shallow(&self) -> Node {
        match self {
            Node::Group(g) => Node::Group(Group {
                children: g
                    .children
                    .iter()
                    .filter(|c| c.id().is_none())
                    .map(Node::shallow)
                    .collect(),
                ..g.clone()
            }),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDef {
    pub id: String,
    pub view_box: BBox,
    pub ref_point: DVec2,
    pub size: f64,
    pub shape: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Def {
    Marker(MarkerDef),
    ClipPath { id: String, d: String },
    LinearGradient { id: String, stops: Vec<GradientStop> },
}

impl Def {
    pub fn id(&self) -> &str {
        match self {
            Def::Marker(m) => &m.id,
            Def::ClipPath { id, .. } | Def::LinearGradient { id, .. } => id,
        }
    }
}

/// A complete rendered map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Option<Color>,
    pub defs: Vec<Def>,
    pub children: Vec<Node>,
}

/// One difference between two scenes, keyed by element id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum SceneChange {
    Added { id: String, parent: Option<String> },
    Removed { id: String },
    Changed { id: String },
    DefsChanged,
    Resized,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Add a definition unless one with the same id exists
    pub fn add_def(&mut self, def: Def) {
        if !self.defs.iter().any(|d| d.id() == def.id()) {
            self.defs.push(def);
        }
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Swap in a new node for `id`, returning the old one
    pub fn replace(&mut self, id: &str, node: Node) -> Option<Node> {
        let slot = self.find_mut(id)?;
        Some(std::mem::replace(slot, node))
    }

    /// Every identified node with its nearest identified ancestor
    fn index(&self) -> IndexMap<&str, (Option<&str>, &Node)> {
        fn walk<'a>(
            nodes: &'a [Node],
            parent: Option<&'a str>,
            out: &mut IndexMap<&'a str, (Option<&'a str>, &'a Node)>,
        ) {
            for node in nodes {
                let id = node.id();
                if let Some(id) = id {
                    out.insert(id, (parent, node));
                }
                walk(node.children(), id.or(parent), out);
            }
        }
        let mut out = IndexMap::new();
        walk(&self.children, None, &mut out);
        out
    }

    /// Id-keyed changes needed to turn `old` into `new`
    pub fn diff(old: &Scene, new: &Scene) -> Vec<SceneChange> {
        let mut changes = Vec::new();
        if old.width != new.width || old.height != new.height || old.background != new.background {
            changes.push(SceneChange::Resized);
        }
        if old.defs != new.defs {
            changes.push(SceneChange::DefsChanged);
        }
        let before = old.index();
        let after = new.index();
        for id in before.keys() {
            if !after.contains_key(id) {
                changes.push(SceneChange::Removed { id: id.to_string() });
            }
        }
        for (id, (parent, node)) in &after {
            match before.get(id) {
                None => changes.push(SceneChange::Added {
                    id: id.to_string(),
                    parent: parent.map(str::to_string),
                }),
                Some((_, old_node)) => {
                    if old_node.shallow() != node.shallow() {
                        changes.push(SceneChange::Changed { id: id.to_string() });
                    }
                }
            }
        }
        changes
    }
}
