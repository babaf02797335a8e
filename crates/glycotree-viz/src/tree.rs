//! Diagram of the top levels of a fitted decision tree.

use std::path::Path;

use glycotree_tree::{DecisionTree, Node, NodeIndex};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, info, instrument};

use crate::VizError;
use crate::style::{CLASS_COLORS, DrawResult, FONT, render_err, tint};

const SLOT_WIDTH: u32 = 190;
const LEVEL_HEIGHT: u32 = 150;
const BOX_WIDTH: i32 = 176;
const BOX_HEIGHT: i32 = 92;
const MARGIN: u32 = 40;
const LINE_HEIGHT: i32 = 16;

/// A node placed on the canvas grid.
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    node: NodeIndex,
    depth: usize,
    /// Horizontal position in slot units.
    x: f64,
    /// Split node whose children fall below the drawn depth.
    truncated: bool,
}

#[derive(Debug, Default)]
struct Layout {
    nodes: Vec<Placed>,
    /// Parent/child pairs as positions in `nodes`.
    edges: Vec<(usize, usize)>,
    n_slots: usize,
    max_depth: usize,
}

/// Draw nodes down to depth `max_depth` (root is depth 0).
///
/// Split nodes show `feature <= threshold`, impurity, sample count, weighted
/// class totals and majority class. Fill colour is the majority class hue,
/// stronger the purer the node. Split nodes cut off at `max_depth` are
/// marked with `(...)`.
///
/// Names missing from `feature_names` or `class_names` fall back to indices.
///
/// # Errors
///
/// Returns [`VizError::Render`] if the diagram cannot be drawn or written.
#[instrument(skip_all, fields(path = %path.display(), max_depth, n_nodes = tree.n_nodes()))]
pub fn render_tree(
    path: &Path,
    tree: &DecisionTree,
    feature_names: &[String],
    class_names: &[&str],
    max_depth: usize,
) -> Result<(), VizError> {
    let layout = layout(tree, max_depth);
    debug!(
        n_drawn = layout.nodes.len(),
        n_slots = layout.n_slots,
        "tree layout"
    );

    let width = layout.n_slots.max(1) as u32 * SLOT_WIDTH + 2 * MARGIN;
    let height = (layout.max_depth as u32 + 1) * LEVEL_HEIGHT + 2 * MARGIN + 40;
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();

    draw(&root, tree, &layout, feature_names, class_names)
        .and_then(|()| root.present())
        .map_err(|e| render_err(path, &e))?;
    info!(n_drawn = layout.nodes.len(), "decision tree rendered");
    Ok(())
}

fn layout(tree: &DecisionTree, max_depth: usize) -> Layout {
    let mut out = Layout::default();
    place(tree, tree.root(), 0, max_depth, &mut out);
    out
}

/// Leaves of the drawn subtree take consecutive slots; parents sit centred
/// over their children. Returns the node's position in `out.nodes`.
fn place(
    tree: &DecisionTree,
    idx: NodeIndex,
    depth: usize,
    max_depth: usize,
    out: &mut Layout,
) -> usize {
    out.max_depth = out.max_depth.max(depth);
    let pos = out.nodes.len();
    out.nodes.push(Placed {
        node: idx,
        depth,
        x: 0.0,
        truncated: false,
    });

    match tree.node(idx) {
        Node::Split { left, right, .. } if depth < max_depth => {
            let l = place(tree, *left, depth + 1, max_depth, out);
            let r = place(tree, *right, depth + 1, max_depth, out);
            out.nodes[pos].x = (out.nodes[l].x + out.nodes[r].x) / 2.0;
            out.edges.push((pos, l));
            out.edges.push((pos, r));
        }
        node => {
            out.nodes[pos].x = out.n_slots as f64 + 0.5;
            out.nodes[pos].truncated = !node.is_leaf();
            out.n_slots += 1;
        }
    }
    pos
}

fn draw(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    tree: &DecisionTree,
    layout: &Layout,
    feature_names: &[String],
    class_names: &[&str],
) -> DrawResult {
    root.fill(&WHITE)?;

    let centre = |p: &Placed| -> (i32, i32) {
        (
            MARGIN as i32 + (p.x * f64::from(SLOT_WIDTH)) as i32,
            (MARGIN + 40) as i32 + p.depth as i32 * LEVEL_HEIGHT as i32 + BOX_HEIGHT / 2,
        )
    };

    let title = TextStyle::from((FONT, 20).into_font()).pos(Pos::new(HPos::Left, VPos::Top));
    root.draw(&Text::new(
        format!(
            "Decision tree ({}, depth {}, {} leaves), top {} levels",
            tree.criterion().name(),
            tree.depth(),
            tree.n_leaves(),
            layout.max_depth + 1
        ),
        (MARGIN as i32, 12),
        title,
    ))?;

    for &(parent, child) in &layout.edges {
        let (px, py) = centre(&layout.nodes[parent]);
        let (cx, cy) = centre(&layout.nodes[child]);
        root.draw(&PathElement::new(
            vec![(px, py + BOX_HEIGHT / 2), (cx, cy - BOX_HEIGHT / 2)],
            BLACK.stroke_width(1),
        ))?;
    }

    let text = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    for placed in &layout.nodes {
        let node = tree.node(placed.node);
        let stats = node.stats();
        let (cx, cy) = centre(placed);
        let majority = stats.majority_class();
        let fill = tint(
            CLASS_COLORS[majority % CLASS_COLORS.len()],
            purity_alpha(stats.purity(), stats.class_weights.len()),
        );

        let top_left = (cx - BOX_WIDTH / 2, cy - BOX_HEIGHT / 2);
        let bottom_right = (cx + BOX_WIDTH / 2, cy + BOX_HEIGHT / 2);
        root.draw(&Rectangle::new([top_left, bottom_right], fill.filled()))?;
        root.draw(&Rectangle::new([top_left, bottom_right], BLACK.stroke_width(1)))?;

        let lines = node_lines(tree, node, feature_names, class_names);
        let first_y = cy - (lines.len() as i32 - 1) * LINE_HEIGHT / 2;
        for (i, line) in lines.into_iter().enumerate() {
            root.draw(&Text::new(line, (cx, first_y + i as i32 * LINE_HEIGHT), text.clone()))?;
        }

        if placed.truncated {
            root.draw(&Text::new(
                "(...)".to_string(),
                (cx, cy + BOX_HEIGHT / 2 + 14),
                text.clone(),
            ))?;
        }
    }

    Ok(())
}

/// 0 for an even class mix, 1 for a pure node.
fn purity_alpha(purity: f64, n_classes: usize) -> f64 {
    if n_classes < 2 {
        return 1.0;
    }
    let floor = 1.0 / n_classes as f64;
    (purity - floor) / (1.0 - floor)
}

fn node_lines(
    tree: &DecisionTree,
    node: &Node,
    feature_names: &[String],
    class_names: &[&str],
) -> Vec<String> {
    let stats = node.stats();
    let mut lines = Vec::with_capacity(5);
    if let Node::Split {
        feature, threshold, ..
    } = node
    {
        let name = feature_names
            .get(feature.index())
            .map_or_else(|| format!("X[{}]", feature.index()), Clone::clone);
        lines.push(format!("{name} <= {threshold:.3}"));
    }
    lines.push(format!("{} = {}", tree.criterion().name(), stats.impurity));
    lines.push(format!("samples = {}", stats.n_samples));
    let value: Vec<String> = stats.class_weights.iter().map(|w| format!("{w:.1}")).collect();
    lines.push(format!("value = [{}]", value.join(", ")));
    let majority = stats.majority_class();
    let class = class_names
        .get(majority)
        .map_or_else(|| majority.to_string(), |s| (*s).to_string());
    lines.push(format!("class = {class}"));
    lines
}

#[cfg(test)]
mod tests {
    use glycotree_tree::DecisionTreeConfig;

    use super::*;

    fn staircase() -> DecisionTree {
        // Labels alternate in blocks so the tree needs several levels.
        let features: Vec<Vec<f64>> = (0..32).map(|i| vec![f64::from(i)]).collect();
        let labels: Vec<usize> = (0..32).map(|i| (i / 4) % 2).collect();
        DecisionTreeConfig::new().fit(&features, &labels).unwrap()
    }

    #[test]
    fn layout_respects_depth_limit() {
        let tree = staircase();
        assert!(tree.depth() > 2);
        let layout = layout(&tree, 2);
        assert_eq!(layout.max_depth, 2);
        assert!(layout.nodes.iter().all(|p| p.depth <= 2));
        assert!(layout.nodes.iter().any(|p| p.truncated));
        assert_eq!(layout.edges.len(), layout.nodes.len() - 1);
    }

    #[test]
    fn parents_centred_over_children() {
        let layout = layout(&staircase(), 3);
        for &(parent, child) in &layout.edges {
            assert!(layout.nodes[child].depth == layout.nodes[parent].depth + 1);
        }
        let root = &layout.nodes[0];
        let kids: Vec<f64> = layout
            .edges
            .iter()
            .filter(|(p, _)| *p == 0)
            .map(|&(_, c)| layout.nodes[c].x)
            .collect();
        assert_eq!(kids.len(), 2);
        assert!((root.x - (kids[0] + kids[1]) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn depth_zero_draws_root_only() {
        let layout = layout(&staircase(), 0);
        assert_eq!(layout.nodes.len(), 1);
        assert!(layout.nodes[0].truncated);
        assert_eq!(layout.n_slots, 1);
    }

    #[test]
    fn split_lines_name_the_feature() {
        let tree = staircase();
        let lines = node_lines(&tree, tree.node(tree.root()), &["Glucose".to_string()], &["no", "yes"]);
        assert!(lines[0].starts_with("Glucose <= "));
        assert_eq!(lines[2], "samples = 32");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn purity_alpha_range() {
        assert!((purity_alpha(0.5, 2)).abs() < 1e-12);
        assert!((purity_alpha(1.0, 2) - 1.0).abs() < 1e-12);
    }
}
