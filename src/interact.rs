//! Interactive edit sessions.
//!
//! A session is a bounded sequence of pointer events: `start` captures the
//! starting state, `drag` returns a preview node for the one affected
//! element without touching any data, and `end` reports the committed
//! change to an [`EditSink`]. The host persists the change and renders
//! again.

use glam::DVec2;

use crate::paths::{DrawnPath, PathPoint, apply_style_to_all};
use crate::render::annotations::{ResolvedPath, path_group};
use crate::render::scene::{Node, Scene, TextNode};
use crate::settings::Styling;

/// Receives committed edits and selection changes
pub trait EditSink {
    /// A label was dropped; `position` is its new absolute anchor position
    fn label_moved(&mut self, id: &str, position: DVec2);
    /// A whole path was dragged by `delta`
    fn path_moved(&mut self, id: &str, delta: DVec2);
    /// A vertex or control point of a path was dragged
    fn path_points_changed(&mut self, id: &str, points: &[PathPoint]);
    fn label_selected(&mut self, id: Option<&str>);
    fn path_selected(&mut self, id: Option<&str>);
}

/// Anchor position of a rendered label: the x of its lines and the middle
/// of its line block
fn label_position(text: &TextNode) -> Option<DVec2> {
    let first = text.lines.first()?;
    let last = text.lines.last()?;
    Some(DVec2::new(
        first.position.x,
        (first.position.y + last.position.y) / 2.0,
    ))
}

/// Dragging one label
#[derive(Debug, Clone)]
pub struct LabelDrag {
    id: String,
    node: TextNode,
    origin: DVec2,
    pointer: DVec2,
}

impl LabelDrag {
    /// Begin dragging the label `id` of a rendered scene. Selects it.
    pub fn start(scene: &Scene, id: &str, pointer: DVec2, sink: &mut impl EditSink) -> Option<Self> {
        let Some(Node::Text(node)) = scene.find(id) else {
            crate::log::debug!(id, "no label with that id");
            return None;
        };
        let origin = label_position(node)?;
        sink.label_selected(Some(id));
        Some(Self {
            id: id.to_string(),
            node: node.clone(),
            origin,
            pointer,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Preview with every line shifted by the pointer's travel
    pub fn drag(&self, pointer: DVec2) -> Node {
        let delta = pointer - self.pointer;
        let mut node = self.node.clone();
        for line in &mut node.lines {
            line.position += delta;
        }
        Node::Text(node)
    }

    /// Commit the new position as the label's position override
    pub fn end(self, pointer: DVec2, sink: &mut impl EditSink) -> DVec2 {
        let position = self.origin + (pointer - self.pointer);
        sink.label_moved(&self.id, position);
        position
    }
}

/// Dragging a whole path
#[derive(Debug, Clone)]
pub struct PathDrag {
    resolved: ResolvedPath,
    pointer: DVec2,
}

impl PathDrag {
    /// Begin dragging `path` as currently styled. Selects it.
    pub fn start(path: &DrawnPath, styling: &Styling, pointer: DVec2, sink: &mut impl EditSink) -> Self {
        sink.path_selected(Some(&path.id));
        Self {
            resolved: ResolvedPath::resolve(path, styling.path_overrides.get(&path.id)),
            pointer,
        }
    }

    pub fn drag(&self, pointer: DVec2) -> Node {
        let mut preview = self.resolved.clone();
        preview.path.translate(pointer - self.pointer);
        path_group(&preview, true).0
    }

    /// Report the translation; every vertex and control point moves by it
    pub fn end(self, pointer: DVec2, sink: &mut impl EditSink) -> DVec2 {
        let delta = pointer - self.pointer;
        sink.path_moved(&self.resolved.path.id, delta);
        delta
    }
}

/// Which part of a path a point drag moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTarget {
    Vertex(usize),
    /// Control point 1 or 2 of a vertex
    Control(usize, u8),
}

impl PointTarget {
    /// Target named by a handle id (`<path>-point-<i>` or
    /// `<path>-control-<i>-<1|2>`)
    pub fn from_handle_id(path_id: &str, handle_id: &str) -> Option<Self> {
        let rest = handle_id.strip_prefix(path_id)?.strip_prefix('-')?;
        if let Some(index) = rest.strip_prefix("point-") {
            return index.parse().ok().map(PointTarget::Vertex);
        }
        let (index, which) = rest.strip_prefix("control-")?.split_once('-')?;
        let which: u8 = which.parse().ok()?;
        matches!(which, 1 | 2).then_some(PointTarget::Control(index.parse().ok()?, which))
    }
}

/// Dragging a single vertex or control point
#[derive(Debug, Clone)]
pub struct PointDrag {
    resolved: ResolvedPath,
    /// Override offset applied when drawing, removed again on commit
    offset: DVec2,
    target: PointTarget,
    grab: DVec2,
}

impl PointDrag {
    /// Begin dragging a point of `path`; `None` if the target does not exist
    pub fn start(
        path: &DrawnPath,
        styling: &Styling,
        target: PointTarget,
        pointer: DVec2,
        sink: &mut impl EditSink,
    ) -> Option<Self> {
        let path_override = styling.path_overrides.get(&path.id);
        let resolved = ResolvedPath::resolve(path, path_override);
        let point = resolved.path.points.get(target_index(target))?;
        let at = match target {
            PointTarget::Vertex(_) => point.at,
            PointTarget::Control(_, 1) => point.c1?,
            PointTarget::Control(_, 2) => point.c2?,
            PointTarget::Control(..) => return None,
        };
        sink.path_selected(Some(&path.id));
        Some(Self {
            offset: path_override.and_then(|o| o.offset).unwrap_or(DVec2::ZERO),
            target,
            grab: pointer - at,
            resolved,
        })
    }

    fn moved(&self, pointer: DVec2) -> DrawnPath {
        let mut path = self.resolved.path.clone();
        let to = pointer - self.grab;
        match self.target {
            PointTarget::Vertex(i) => path.move_point(i, to),
            PointTarget::Control(i, which) => path.move_control(i, which, to),
        };
        path
    }

    pub fn drag(&self, pointer: DVec2) -> Node {
        let preview = ResolvedPath {
            path: self.moved(pointer),
            style: self.resolved.style.clone(),
        };
        path_group(&preview, true).0
    }

    /// Commit the edited point list in the path's own coordinates
    pub fn end(self, pointer: DVec2, sink: &mut impl EditSink) -> Vec<PathPoint> {
        let mut path = self.moved(pointer);
        path.translate(-self.offset);
        sink.path_points_changed(&path.id, &path.points);
        path.points
    }
}

fn target_index(target: PointTarget) -> usize {
    match target {
        PointTarget::Vertex(i) | PointTarget::Control(i, _) => i,
    }
}

/// An [`EditSink`] that writes edits straight into the styling overrides and
/// the drawn paths
#[derive(Debug)]
pub struct StylingEditor<'a> {
    pub styling: &'a mut Styling,
    pub paths: &'a mut Vec<DrawnPath>,
    pub selected_label: Option<String>,
    pub selected_path: Option<String>,
}

impl<'a> StylingEditor<'a> {
    pub fn new(styling: &'a mut Styling, paths: &'a mut Vec<DrawnPath>) -> Self {
        Self {
            styling,
            paths,
            selected_label: None,
            selected_path: None,
        }
    }

    /// Give every other path the rendered style of `source_id`
    pub fn apply_style_to_all(&mut self, source_id: &str) -> bool {
        apply_style_to_all(
            source_id,
            self.paths.as_mut_slice(),
            &mut self.styling.path_overrides,
        )
    }

    fn path_mut(&mut self, id: &str) -> Option<&mut DrawnPath> {
        self.paths.iter_mut().find(|p| p.id == id)
    }
}

impl EditSink for StylingEditor<'_> {
    fn label_moved(&mut self, id: &str, position: DVec2) {
        self.styling
            .label_overrides
            .entry(id.to_string())
            .or_default()
            .position = Some(position);
    }

    fn path_moved(&mut self, id: &str, delta: DVec2) {
        match self.path_mut(id) {
            Some(path) => path.translate(delta),
            None => {
                crate::log::warn!(id, "moved path is not in the path list");
            }
        }
    }

    fn path_points_changed(&mut self, id: &str, points: &[PathPoint]) {
        match self.path_mut(id) {
            Some(path) => path.points = points.to_vec(),
            None => {
                crate::log::warn!(id, "edited path is not in the path list");
            }
        }
    }

    fn label_selected(&mut self, id: Option<&str>) {
        self.selected_label = id.map(str::to_string);
    }

    fn path_selected(&mut self, id: Option<&str>) {
        self.selected_path = id.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathOverride;
    use crate::render::scene::{Font, Group, TextLine};
    use crate::settings::{FontStyle, FontWeight, TextDecoration};
    use glam::dvec2;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl EditSink for Recorder {
        fn label_moved(&mut self, id: &str, position: DVec2) {
            self.events.push(format!("label moved {id} {position}"));
        }
        fn path_moved(&mut self, id: &str, delta: DVec2) {
            self.events.push(format!("path moved {id} {delta}"));
        }
        fn path_points_changed(&mut self, id: &str, points: &[PathPoint]) {
            self.events.push(format!("points changed {id} {}", points.len()));
        }
        fn label_selected(&mut self, id: Option<&str>) {
            self.events.push(format!("label selected {}", id.unwrap_or("-")));
        }
        fn path_selected(&mut self, id: Option<&str>) {
            self.events.push(format!("path selected {}", id.unwrap_or("-")));
        }
    }

    fn path() -> DrawnPath {
        DrawnPath::new(
            "route",
            vec![
                PathPoint::line(dvec2(0.0, 0.0)),
                PathPoint::quad(dvec2(5.0, -5.0), dvec2(10.0, 0.0)),
                PathPoint::line(dvec2(20.0, 0.0)),
            ],
        )
    }

    fn label_scene() -> Scene {
        let mut scene = Scene::new(100.0, 100.0);
        let text = TextNode {
            id: Some("symbol-0".into()),
            class: Some("label".into()),
            anchor: Default::default(),
            font: Font {
                family: "sans-serif".into(),
                size: 12.0,
                weight: FontWeight::Normal,
                style: FontStyle::Normal,
                decoration: TextDecoration::None,
            },
            fill: crate::color::Color::BLACK,
            lines: vec![
                TextLine {
                    position: dvec2(10.0, 20.0),
                    spans: Vec::new(),
                },
                TextLine {
                    position: dvec2(10.0, 30.0),
                    spans: Vec::new(),
                },
            ],
        };
        scene.children.push(Node::Group(Group {
            children: vec![Node::Text(text)],
            ..Group::new("symbol-labels")
        }));
        scene
    }

    #[test]
    fn label_drag_commits_position_override() {
        let scene = label_scene();
        let mut styling = Styling::default();
        let mut paths = Vec::new();
        let mut editor = StylingEditor::new(&mut styling, &mut paths);

        let drag = LabelDrag::start(&scene, "symbol-0", dvec2(12.0, 24.0), &mut editor).unwrap();
        assert_eq!(editor.selected_label.as_deref(), Some("symbol-0"));
        let Node::Text(preview) = drag.drag(dvec2(22.0, 34.0)) else { panic!("expected text") };
        assert_eq!(preview.lines[0].position, dvec2(20.0, 30.0));
        assert_eq!(drag.end(dvec2(22.0, 34.0), &mut editor), dvec2(20.0, 35.0));
        assert_eq!(
            styling.label_overrides["symbol-0"].position,
            Some(dvec2(20.0, 35.0))
        );
    }

    #[test]
    fn label_drag_needs_a_label() {
        let mut styling = Styling::default();
        let mut paths = Vec::new();
        let mut editor = StylingEditor::new(&mut styling, &mut paths);
        assert!(LabelDrag::start(&label_scene(), "symbol-labels", DVec2::ZERO, &mut editor).is_none());
        assert!(editor.selected_label.is_none());
    }

    #[test]
    fn path_drag_translates_every_point() {
        let mut styling = Styling::default();
        let before = path();
        let mut recorder = Recorder::default();
        let drag = PathDrag::start(&before, &styling, dvec2(1.0, 1.0), &mut recorder);
        assert_eq!(recorder.events, ["path selected route"]);

        let mut paths = vec![before.clone()];
        let mut editor = StylingEditor::new(&mut styling, &mut paths);
        assert_eq!(drag.end(dvec2(4.0, -1.0), &mut editor), dvec2(3.0, -2.0));
        for (a, b) in before.points.iter().zip(&paths[0].points) {
            assert_eq!(b.at - a.at, dvec2(3.0, -2.0));
            for (ca, cb) in a.controls().zip(b.controls()) {
                assert_eq!(cb - ca, dvec2(3.0, -2.0));
            }
        }
    }

    #[test]
    fn point_drag_moves_only_its_vertex() {
        let mut styling = Styling::default();
        styling.path_overrides.insert(
            "route".into(),
            PathOverride {
                offset: Some(dvec2(100.0, 0.0)),
                ..Default::default()
            },
        );
        let before = path();
        // vertex 1 is drawn at (110, 0); grab it 1px off
        let drag = PointDrag::start(
            &before,
            &styling,
            PointTarget::Vertex(1),
            dvec2(111.0, 0.0),
            &mut Recorder::default(),
        )
        .unwrap();

        let mut paths = vec![before.clone()];
        let mut editor = StylingEditor::new(&mut styling, &mut paths);
        let points = drag.end(dvec2(111.0, 10.0), &mut editor);
        assert_eq!(points[1].at, dvec2(10.0, 10.0));
        assert_eq!(points[1].c1, Some(dvec2(5.0, 5.0)));
        assert_eq!(points[0], before.points[0]);
        assert_eq!(points[2], before.points[2]);
        assert_eq!(paths[0].points, points);
    }

    #[test]
    fn point_drag_preview_leaves_data_alone() {
        let styling = Styling::default();
        let before = path();
        let drag = PointDrag::start(
            &before,
            &styling,
            PointTarget::Control(1, 1),
            dvec2(5.0, -5.0),
            &mut Recorder::default(),
        )
        .unwrap();
        let Node::Group(preview) = drag.drag(dvec2(5.0, -9.0)) else { panic!("expected group") };
        assert_eq!(preview.id.as_deref(), Some("route"));
        assert_eq!(before, path());
    }

    #[test]
    fn point_drag_rejects_missing_control() {
        let styling = Styling::default();
        let mut recorder = Recorder::default();
        assert!(PointDrag::start(&path(), &styling, PointTarget::Control(0, 1), DVec2::ZERO, &mut recorder).is_none());
        assert!(PointDrag::start(&path(), &styling, PointTarget::Vertex(7), DVec2::ZERO, &mut recorder).is_none());
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn edits_to_unknown_paths_are_ignored() {
        let mut styling = Styling::default();
        let mut paths = vec![path()];
        let mut editor = StylingEditor::new(&mut styling, &mut paths);
        editor.path_moved("missing", dvec2(5.0, 5.0));
        editor.path_points_changed("missing", &[]);
        assert_eq!(paths, vec![path()]);
    }

    #[test]
    fn handle_ids_name_targets() {
        assert_eq!(PointTarget::from_handle_id("route", "route-point-2"), Some(PointTarget::Vertex(2)));
        assert_eq!(
            PointTarget::from_handle_id("route", "route-control-1-2"),
            Some(PointTarget::Control(1, 2))
        );
        assert_eq!(PointTarget::from_handle_id("route", "route-control-1-3"), None);
        assert_eq!(PointTarget::from_handle_id("route", "other-point-1"), None);
    }
}
