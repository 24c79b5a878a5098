//! Project document (de)serialization. The JSON shape keeps the editor's
//! field names (`kind`, `parentId`, `offsetCm`, ...); the in-memory model
//! uses sum types instead of optional-field combinations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::geometry::limits;
use crate::model::{
    Dart, Edge, EdgeId, Figure, FigureRole, Node, OffsetSpec, Pique, Tool, Vec2,
};

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureKindTag {
    Mold,
    Seam,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Wire form of a [`Figure`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureDoc {
    id: String,
    #[serde(default)]
    tool: Tool,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<FigureKindTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset_cm: Option<OffsetSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seam_segments: Option<Vec<Vec<Vec2>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seam_segment_edge_ids: Option<Vec<EdgeId>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    darts: Vec<Dart>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    piques: Vec<Pique>,
    #[serde(default, skip_serializing_if = "is_false")]
    dashed: bool,
}

impl TryFrom<FigureDoc> for Figure {
    type Error = DocumentError;

    fn try_from(d: FigureDoc) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| DocumentError::InvalidFigure {
            figure: d.id.clone(),
            reason: reason.to_string(),
        };
        let role = match (d.kind, &d.parent_id) {
            (Some(FigureKindTag::Seam), Some(p)) => FigureRole::Seam {
                parent_id: p.clone(),
            },
            (Some(FigureKindTag::Seam), None) => {
                return Err(invalid("seam figure without parentId"));
            }
            (Some(FigureKindTag::Mold), _) => FigureRole::Mold,
            (None, _) => FigureRole::Plain,
        };
        let seam_segments = d.seam_segments.unwrap_or_default();
        let seam_segment_edge_ids = d.seam_segment_edge_ids.unwrap_or_default();
        if seam_segments.len() != seam_segment_edge_ids.len() {
            return Err(invalid("seamSegments and seamSegmentEdgeIds differ in length"));
        }
        if d.piques.iter().any(|p| p.side != 1 && p.side != -1) {
            return Err(invalid("pique side must be 1 or -1"));
        }
        Ok(Figure {
            id: d.id,
            tool: d.tool,
            x: d.x,
            y: d.y,
            rotation: d.rotation,
            closed: d.closed,
            nodes: d.nodes,
            edges: d.edges,
            role,
            offset_cm: d.offset_cm,
            seam_segments,
            seam_segment_edge_ids,
            darts: d.darts,
            piques: d.piques,
            dashed: d.dashed,
        })
    }
}

impl From<Figure> for FigureDoc {
    fn from(f: Figure) -> Self {
        let (kind, parent_id) = match f.role {
            FigureRole::Plain => (None, None),
            FigureRole::Mold => (Some(FigureKindTag::Mold), None),
            FigureRole::Seam { parent_id } => (Some(FigureKindTag::Seam), Some(parent_id)),
        };
        let has_segments = !f.seam_segments.is_empty();
        FigureDoc {
            id: f.id,
            tool: f.tool,
            x: f.x,
            y: f.y,
            rotation: f.rotation,
            closed: f.closed,
            nodes: f.nodes,
            edges: f.edges,
            kind,
            parent_id,
            offset_cm: f.offset_cm,
            seam_segments: has_segments.then_some(f.seam_segments),
            seam_segment_edge_ids: has_segments.then_some(f.seam_segment_edge_ids),
            darts: f.darts,
            piques: f.piques,
            dashed: f.dashed,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Doc {
    version: u32,
    figures: Vec<Figure>,
}

pub fn load_document(s: &str) -> Result<Vec<Figure>, DocumentError> {
    let v: Value = serde_json::from_str(s)?;
    load_document_value(v)
}

pub fn load_document_value(v: Value) -> Result<Vec<Figure>, DocumentError> {
    // Cap before materializing figures.
    if let Some(arr) = v.get("figures").and_then(Value::as_array) {
        if arr.len() > limits::MAX_FIGURES {
            return Err(DocumentError::TooMany {
                what: "figures",
                limit: limits::MAX_FIGURES,
            });
        }
    }
    let doc: Doc = serde_json::from_value(v)?;
    if doc.version != DOCUMENT_VERSION {
        return Err(DocumentError::Version(doc.version));
    }
    validate_figures(&doc.figures)?;
    Ok(doc.figures)
}

pub fn save_document(figures: &[Figure]) -> Result<String, DocumentError> {
    let doc = Doc {
        version: DOCUMENT_VERSION,
        figures: figures.to_vec(),
    };
    Ok(serde_json::to_string(&doc)?)
}

/// Whole-document checks: per-figure structure, unique figure ids, seam parents.
pub fn validate_figures(figures: &[Figure]) -> Result<(), DocumentError> {
    if figures.len() > limits::MAX_FIGURES {
        return Err(DocumentError::TooMany {
            what: "figures",
            limit: limits::MAX_FIGURES,
        });
    }
    let mut ids = HashSet::new();
    for f in figures {
        if !ids.insert(f.id.as_str()) {
            return Err(DocumentError::DuplicateId {
                what: "figure",
                id: f.id.clone(),
            });
        }
    }
    for f in figures {
        validate_figure(f)?;
        if let Some(parent) = f.parent_id() {
            if !ids.contains(parent) {
                return Err(DocumentError::OrphanSeam {
                    figure: f.id.clone(),
                    parent: parent.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Structural checks for a single figure.
pub fn validate_figure(f: &Figure) -> Result<(), DocumentError> {
    if f.nodes.len() > limits::MAX_NODES_PER_FIGURE {
        return Err(DocumentError::TooMany {
            what: "nodes",
            limit: limits::MAX_NODES_PER_FIGURE,
        });
    }
    if f.edges.len() > limits::MAX_EDGES_PER_FIGURE {
        return Err(DocumentError::TooMany {
            what: "edges",
            limit: limits::MAX_EDGES_PER_FIGURE,
        });
    }
    let seam_points: usize = f.seam_segments.iter().map(Vec::len).sum();
    if seam_points > limits::MAX_SEAM_POINTS_PER_FIGURE {
        return Err(DocumentError::TooMany {
            what: "seam points",
            limit: limits::MAX_SEAM_POINTS_PER_FIGURE,
        });
    }

    let ok = |v: f64| limits::in_coord_bounds(v);
    let ok_pt = |p: &Vec2| ok(p.x) && ok(p.y);
    let coords_ok = ok(f.x)
        && ok(f.y)
        && f.rotation.is_finite()
        && f.nodes.iter().all(|n| {
            ok(n.x) && ok(n.y) && n.in_handle.iter().chain(n.out_handle.iter()).all(ok_pt)
        })
        && f.seam_segments.iter().flatten().all(ok_pt);
    let values_ok = match &f.offset_cm {
        None => true,
        Some(OffsetSpec::Uniform(v)) => v.is_finite(),
        Some(OffsetSpec::PerEdge(m)) => m.values().all(|v| v.is_finite()),
    } && f.darts.iter().all(|d| {
        d.depth_cm.is_finite() && d.opening_cm.is_finite() && d.position_ratio.is_finite()
    }) && f
        .piques
        .iter()
        .all(|p| p.t01.is_finite() && p.length_cm.is_finite());
    if !coords_ok || !values_ok {
        return Err(DocumentError::NonFinite {
            figure: f.id.clone(),
        });
    }

    let mut node_ids = HashSet::new();
    for n in &f.nodes {
        if !node_ids.insert(n.id.as_str()) {
            return Err(DocumentError::DuplicateId {
                what: "node",
                id: n.id.clone(),
            });
        }
    }
    let mut edge_ids = HashSet::new();
    for e in &f.edges {
        if !edge_ids.insert(e.id.as_str()) {
            return Err(DocumentError::DuplicateId {
                what: "edge",
                id: e.id.clone(),
            });
        }
        if !node_ids.contains(e.from.as_str()) || !node_ids.contains(e.to.as_str()) {
            return Err(DocumentError::DanglingEdge {
                figure: f.id.clone(),
                edge: e.id.clone(),
            });
        }
    }
    for d in &f.darts {
        for id in [&d.a_node_id, &d.b_node_id, &d.c_node_id] {
            if !node_ids.contains(id.as_str()) {
                return Err(DocumentError::InvalidFigure {
                    figure: f.id.clone(),
                    reason: format!("dart references missing node '{id}'"),
                });
            }
        }
    }
    for p in &f.piques {
        if !edge_ids.contains(p.edge_id.as_str()) {
            return Err(DocumentError::InvalidFigure {
                figure: f.id.clone(),
                reason: format!("pique references missing edge '{}'", p.edge_id),
            });
        }
    }
    Ok(())
}
