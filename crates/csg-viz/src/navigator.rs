//! BSP tree navigation for interactive visualization.

use bsp_csg::bsp::{CollectingVisitor, PartitionNode};
use bsp_csg::{BspTree, NodeIndex, Side};
use macroquad::prelude::*;
use nalgebra::Point3;

use crate::RenderVisitor;

/// Interactive navigator for exploring the tree one subtree at a time.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    path: Vec<(Side, NodeIndex)>,
}

impl TreeNavigator {
    /// Creates a new navigator starting at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current depth below the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Index of the node at the top of the shown subtree.
    pub fn current(&self, tree: &BspTree) -> Option<NodeIndex> {
        match self.path.last() {
            Some(&(_, index)) => Some(index),
            None => tree.root(),
        }
    }

    fn current_node<'a>(&self, tree: &'a BspTree) -> Option<&'a PartitionNode> {
        self.current(tree).and_then(|index| tree.node(index))
    }

    /// Moves to the child on `side`. Returns true if that child exists.
    pub fn descend(&mut self, tree: &BspTree, side: Side) -> bool {
        let Some(child) = self.current_node(tree).and_then(|node| node.child(side)) else {
            return false;
        };
        self.path.push((side, child));
        true
    }

    /// Navigates to the parent node. Returns true if not already at root.
    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    /// Returns to the root node.
    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles F/B/P/R. Returns true if navigation state changed.
    pub fn update(&mut self, tree: &BspTree) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed |= self.descend(tree, Side::Front);
        }
        if is_key_pressed(KeyCode::B) {
            changed |= self.descend(tree, Side::Back);
        }
        if is_key_pressed(KeyCode::P) {
            changed |= self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// Renders the triangles of the current subtree, farthest first.
    pub fn render(&self, tree: &BspTree, eye: Point3<f32>, epsilon: f32) {
        if let Some(start) = self.current(tree) {
            tree.traverse_back_to_front_from(start, eye, epsilon, &mut RenderVisitor);
        }
    }

    /// Draws the navigation overlay.
    pub fn draw_ui(&self, tree: &BspTree, eye: Point3<f32>, epsilon: f32, y_offset: f32) {
        let Some(start) = self.current(tree) else {
            draw_text("Tree is empty", 10.0, y_offset, 18.0, ORANGE);
            return;
        };
        let Some(node) = tree.node(start) else {
            return;
        };

        let mut subtree = CollectingVisitor::new();
        tree.traverse_back_to_front_from(start, eye, epsilon, &mut subtree);

        let path = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|(side, _)| match side {
                    Side::Front => "F",
                    Side::Back => "B",
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        draw_text(
            &format!(
                "Node {}: {} on plane, {} in subtree",
                start.index(),
                node.coplanar().len(),
                subtree.triangles().len()
            ),
            10.0,
            y_offset,
            18.0,
            WHITE,
        );
        draw_text(
            &format!("Path: {} (depth {})", path, self.depth()),
            10.0,
            y_offset + 20.0,
            18.0,
            YELLOW,
        );
        draw_text(
            &format!(
                "Children: {}{}{}",
                if node.front().is_some() { "[F]ront " } else { "" },
                if node.back().is_some() { "[B]ack " } else { "" },
                if node.is_leaf() { "(leaf)" } else { "" }
            ),
            10.0,
            y_offset + 40.0,
            18.0,
            if node.is_leaf() { ORANGE } else { GREEN },
        );
        draw_text("[P]arent | [R]oot", 10.0, y_offset + 60.0, 16.0, DARKGRAY);
    }
}
