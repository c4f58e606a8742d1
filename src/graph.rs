//! Circular dependency-graph layout.
//!
//! Tasks are placed evenly around a circle centred on the canvas, one per
//! task in store order. Every dependency becomes a directed edge from the task
//! to the task it depends on, provided both ends are known. Nodes and edges
//! touching any reported cycle are styled as [`LinkStyle::Cycle`].

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use crate::fields::LinkStyle;
use crate::task::Task;

/// Radius is the smaller canvas dimension divided by this.
pub const RADIUS_DIVISOR: f64 = 2.5;

/// Characters kept from the first word of a title for the node label.
pub const LABEL_LEN: usize = 4;

/// Drawing surface the layout is computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas { width: 600.0, height: 400.0 }
    }
}

impl Canvas {
    pub fn center(&self) -> Point {
        Point { x: self.width / 2.0, y: self.height / 2.0 }
    }

    pub fn radius(&self) -> f64 {
        self.width.min(self.height) / RADIUS_DIVISOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Arrowhead drawn at the dependency end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowMarker {
    Default,
    Cycle,
}

impl From<LinkStyle> for ArrowMarker {
    fn from(style: LinkStyle) -> Self {
        match style {
            LinkStyle::Normal => ArrowMarker::Default,
            LinkStyle::Cycle => ArrowMarker::Cycle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub position: Point,
    pub style: LinkStyle,
}

/// Directed edge from a task to one of its dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub start: Point,
    pub end: Point,
    pub style: LinkStyle,
}

impl Edge {
    pub fn marker(&self) -> ArrowMarker {
        self.style.into()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphLayout {
    pub positions: HashMap<String, Point>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphLayout {
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn node_style(&self, id: &str) -> Option<LinkStyle> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.style)
    }

    /// Style of the first edge `from -> to`, if such an edge was emitted.
    pub fn edge_style(&self, from: &str, to: &str) -> Option<LinkStyle> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.style)
    }
}

/// Tip and two wing points of an arrowhead for the edge `start -> end`.
///
/// The tip sits `inset` short of `end` so it touches the node outline rather
/// than its centre. Returns `None` when the edge is shorter than the inset.
pub fn arrow_head(start: Point, end: Point, inset: f64, size: f64) -> Option<(Point, [Point; 2])> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len <= inset {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    let tip = Point { x: end.x - ux * inset, y: end.y - uy * inset };
    let spread = PI / 7.0;
    let wing = |theta: f64| {
        let (s, c) = theta.sin_cos();
        // Rotate the backwards unit vector by theta.
        let (bx, by) = (-ux * c + uy * s, -ux * s - uy * c);
        Point { x: tip.x + bx * size, y: tip.y + by * size }
    };
    Some((tip, [wing(spread), wing(-spread)]))
}

/// Union of every id named in any cycle.
pub fn cycle_membership(cycles: &[Vec<String>]) -> HashSet<&str> {
    cycles.iter().flatten().map(String::as_str).collect()
}

/// First word of the title, cut to [`LABEL_LEN`] characters.
pub fn node_label(title: &str) -> String {
    title
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .take(LABEL_LEN)
        .collect()
}

/// Lay out `tasks` on a circle and classify nodes and edges against `cycles`.
///
/// Dependencies naming an unknown id are skipped. When two tasks share an id
/// the later one owns the position, and both nodes are drawn there.
pub fn layout(tasks: &[Task], cycles: &[Vec<String>], canvas: &Canvas) -> GraphLayout {
    if tasks.is_empty() {
        return GraphLayout::default();
    }

    let center = canvas.center();
    let radius = canvas.radius();
    let slice = 2.0 * PI / tasks.len() as f64;

    let mut positions = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        let angle = slice * i as f64;
        positions.insert(
            task.id.clone(),
            Point {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            },
        );
    }

    let in_cycle = cycle_membership(cycles);
    let style_of = |id: &str| {
        if in_cycle.contains(id) {
            LinkStyle::Cycle
        } else {
            LinkStyle::Normal
        }
    };

    let mut edges = Vec::new();
    for task in tasks {
        for dep in &task.dependencies {
            let (Some(&start), Some(&end)) = (positions.get(&task.id), positions.get(dep)) else {
                continue;
            };
            let style = if in_cycle.contains(task.id.as_str()) || in_cycle.contains(dep.as_str()) {
                LinkStyle::Cycle
            } else {
                LinkStyle::Normal
            };
            edges.push(Edge {
                from: task.id.clone(),
                to: dep.clone(),
                start,
                end,
                style,
            });
        }
    }

    let nodes = tasks
        .iter()
        .map(|task| Node {
            id: task.id.clone(),
            label: node_label(&task.title),
            position: positions[&task.id],
            style: style_of(&task.id),
        })
        .collect();

    GraphLayout { positions, nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            priority: 5,
            effort: 5,
            due_date: None,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn angle_of(p: Point, canvas: &Canvas) -> f64 {
        let c = canvas.center();
        (p.y - c.y).atan2(p.x - c.x).rem_euclid(2.0 * PI)
    }

    #[test]
    fn four_tasks_sit_ninety_degrees_apart() {
        let canvas = Canvas::default();
        let tasks: Vec<Task> = ["A", "B", "C", "D"].iter().map(|id| task(id, &[])).collect();
        let graph = layout(&tasks, &[], &canvas);

        for (i, id) in ["A", "B", "C", "D"].iter().enumerate() {
            let p = graph.position(id).unwrap();
            let expected = PI / 2.0 * i as f64;
            assert!((angle_of(p, &canvas) - expected).abs() < EPS, "{id} at wrong angle");
            let c = canvas.center();
            let r = ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt();
            assert!((r - canvas.radius()).abs() < EPS);
        }
    }

    #[test]
    fn radius_uses_smaller_dimension() {
        let canvas = Canvas { width: 600.0, height: 400.0 };
        assert!((canvas.radius() - 160.0).abs() < EPS);
        let tall = Canvas { width: 300.0, height: 900.0 };
        assert!((tall.radius() - 120.0).abs() < EPS);
    }

    #[test]
    fn single_task_sits_at_angle_zero() {
        let canvas = Canvas::default();
        let graph = layout(&[task("solo", &[])], &[], &canvas);
        let p = graph.position("solo").unwrap();
        assert!((p.x - (canvas.center().x + canvas.radius())).abs() < EPS);
        assert!((p.y - canvas.center().y).abs() < EPS);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn empty_input_produces_nothing() {
        let graph = layout(&[], &[vec!["A".into()]], &Canvas::default());
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert!(graph.positions.is_empty());
    }

    #[test]
    fn dangling_dependencies_are_skipped() {
        let tasks = vec![task("A", &["B", "ghost"]), task("B", &["nobody"])];
        let graph = layout(&tasks, &[], &Canvas::default());
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "A");
        assert_eq!(graph.edges[0].to, "B");
        assert_eq!(graph.edge_style("A", "ghost"), None);
    }

    #[test]
    fn cycle_members_and_touching_edges_are_highlighted() {
        let tasks = vec![
            task("A", &["B"]),
            task("B", &["C"]),
            task("C", &["A"]),
            task("D", &["A"]),
            task("E", &["D"]),
        ];
        let cycles = vec![vec!["A".to_string(), "B".to_string(), "C".to_string()]];
        let graph = layout(&tasks, &cycles, &Canvas::default());

        for id in ["A", "B", "C"] {
            assert_eq!(graph.node_style(id), Some(LinkStyle::Cycle));
        }
        assert_eq!(graph.node_style("D"), Some(LinkStyle::Normal));
        assert_eq!(graph.edge_style("A", "B"), Some(LinkStyle::Cycle));
        assert_eq!(graph.edge_style("D", "A"), Some(LinkStyle::Cycle));
        assert_eq!(graph.edge_style("E", "D"), Some(LinkStyle::Normal));

        let touching = graph.edges.iter().find(|e| e.from == "D").unwrap();
        assert_eq!(touching.marker(), ArrowMarker::Cycle);
        let plain = graph.edges.iter().find(|e| e.from == "E").unwrap();
        assert_eq!(plain.marker(), ArrowMarker::Default);
    }

    #[test]
    fn edge_between_different_cycles_counts_as_cycle() {
        let tasks = vec![task("A", &["X"]), task("X", &[])];
        let cycles = vec![vec!["A".to_string(), "B".to_string()], vec!["X".to_string(), "Y".to_string()]];
        let graph = layout(&tasks, &cycles, &Canvas::default());
        assert_eq!(graph.edge_style("A", "X"), Some(LinkStyle::Cycle));
    }

    #[test]
    fn duplicate_ids_share_the_last_position() {
        let tasks = vec![task("dup", &[]), task("other", &[]), task("dup", &[])];
        let graph = layout(&tasks, &[], &Canvas::default());
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[0].position, graph.nodes[2].position);
        assert_eq!(graph.positions.len(), 2);
    }

    #[test]
    fn arrow_head_points_back_along_the_edge() {
        let (tip, [a, b]) =
            arrow_head(Point { x: 0.0, y: 0.0 }, Point { x: 10.0, y: 0.0 }, 2.0, 1.0).unwrap();
        assert!((tip.x - 8.0).abs() < EPS && tip.y.abs() < EPS);
        assert!(a.x < tip.x && b.x < tip.x);
        assert!((a.y + b.y).abs() < EPS);
        assert!(a.y.abs() > 0.1);
        assert!(arrow_head(Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 0.0 }, 2.0, 1.0).is_none());
    }

    #[test]
    fn labels_take_first_word_prefix() {
        assert_eq!(node_label("Implement login flow"), "Impl");
        assert_eq!(node_label("Fix"), "Fix");
        assert_eq!(node_label("  padded  title"), "padd");
        assert_eq!(node_label(""), "");
        assert_eq!(node_label("Ünïcödé words"), "Ünïc");
    }
}
