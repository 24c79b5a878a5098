pub mod model;
pub mod geometry {
    pub mod cubic;
    pub mod flatten;
    pub mod intersect;
    pub mod limits;
    pub mod math;
    pub mod path_length;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod boundary;
    pub mod dart;
    pub mod merge;
    pub mod mirror;
    pub mod offset;
    pub mod pique;
    pub mod snapping;
}
pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod ids;
pub mod json;

pub use algorithms::boundary::{trace_outer_boundary, OuterBoundary};
pub use algorithms::dart::{insert_dart, insert_dart_into_figure, update_dart, DartParams, DartShape, DartTarget};
pub use algorithms::merge::{magnet_join, split_edge_at};
pub use algorithms::mirror::{mirror_figure, mirror_point, unfold_figure, Axis};
pub use algorithms::offset::{
    compute_offset, compute_offset_with, rebuild_seam, set_edge_offset, toggle_edge_offset, OffsetSelector, SeamEdit,
    SeamOptions,
};
pub use algorithms::pique::{add_pique, pique_segment};
pub use algorithms::snapping::{find_nearest_snap_point, get_all_snap_points, SnapKind, SnapPoint};
pub use config::EngineConfig;
pub use editor::{apply_command, Command, EditorState, EngineContext};
pub use error::{ConfigError, DocumentError};
pub use graph::{EdgeGeom, FigureGraph};
pub use ids::{IdSource, SequentialIds};
pub use json::{load_document, save_document};
pub use model::{Dart, Edge, EdgeKind, Figure, FigureRole, Node, NodeMode, OffsetSpec, Pique, Tool, Vec2};
