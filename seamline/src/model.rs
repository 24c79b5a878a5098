use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type NodeId = String;
pub type EdgeId = String;
pub type FigureId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeMode {
    #[default]
    Corner,
    Smooth,
}

/// A vertex in figure-local coordinates. Handles are absolute local-space
/// control points: `in_handle` serves the edge arriving at this node,
/// `out_handle` the edge leaving it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub mode: NodeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_handle: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_handle: Option<Vec2>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, x: f64, y: f64) -> Self {
        Node {
            id: id.into(),
            x,
            y,
            mode: NodeMode::Corner,
            in_handle: None,
            out_handle: None,
        }
    }
    pub fn pos(&self) -> Vec2 {
        Vec2 { x: self.x, y: self.y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Line,
    Cubic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn line(id: impl Into<EdgeId>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Edge {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Line,
        }
    }
    pub fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }
    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other(&self, node: &str) -> Option<&str> {
        if self.from == node {
            Some(&self.to)
        } else if self.to == node {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Drawing tool a figure originated from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Rectangle,
    Circle,
    Line,
    Curve,
    #[default]
    Polyline,
    Pen,
    #[serde(other)]
    Other,
}

/// What a figure is within the pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FigureRole {
    #[default]
    Plain,
    /// Finished pattern piece, eligible for seam generation.
    Mold,
    /// Seam allowance derived from `parent_id`.
    Seam { parent_id: FigureId },
}

/// Seam allowance in centimeters: one value for the whole outer loop, or
/// one value per contributing edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OffsetSpec {
    Uniform(f64),
    PerEdge(BTreeMap<EdgeId, f64>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dart {
    /// Left base node.
    pub a_node_id: NodeId,
    /// Right base node.
    pub b_node_id: NodeId,
    /// Apex node.
    pub c_node_id: NodeId,
    pub depth_cm: f64,
    pub opening_cm: f64,
    pub position_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pique {
    pub edge_id: EdgeId,
    pub t01: f64,
    pub length_cm: f64,
    /// 1 or -1: which side of the edge the notch points to.
    pub side: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::json::FigureDoc", into = "crate::json::FigureDoc")]
pub struct Figure {
    pub id: FigureId,
    pub tool: Tool,
    pub x: f64,
    pub y: f64,
    pub rotation: f64, // degrees
    pub closed: bool,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub role: FigureRole,
    pub offset_cm: Option<OffsetSpec>,
    pub seam_segments: Vec<Vec<Vec2>>,
    pub seam_segment_edge_ids: Vec<EdgeId>,
    pub darts: Vec<Dart>,
    pub piques: Vec<Pique>,
    pub dashed: bool,
}

impl Figure {
    pub fn new(id: impl Into<FigureId>, tool: Tool) -> Self {
        Figure {
            id: id.into(),
            tool,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            closed: false,
            nodes: Vec::new(),
            edges: Vec::new(),
            role: FigureRole::Plain,
            offset_cm: None,
            seam_segments: Vec::new(),
            seam_segment_edge_ids: Vec::new(),
            darts: Vec::new(),
            piques: Vec::new(),
            dashed: false,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }
    pub fn node_pos(&self, id: &str) -> Option<Vec2> {
        self.node(id).map(Node::pos)
    }

    pub fn parent_id(&self) -> Option<&str> {
        match &self.role {
            FigureRole::Seam { parent_id } => Some(parent_id),
            FigureRole::Plain | FigureRole::Mold => None,
        }
    }
    pub fn is_seam(&self) -> bool {
        matches!(self.role, FigureRole::Seam { .. })
    }

    pub fn origin(&self) -> Vec2 {
        Vec2 { x: self.x, y: self.y }
    }

    /// Local figure coordinates to world coordinates.
    pub fn to_world(&self, p: Vec2) -> Vec2 {
        p.rotate_deg(self.rotation) + self.origin()
    }

    /// World coordinates to local figure coordinates.
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        (p - self.origin()).rotate_deg(-self.rotation)
    }
}
