//! Editor state as a value: the figure list plus undo/redo snapshots, moved
//! forward by `apply_command`. The previous state is never mutated.
//!
//! Seams follow their parents: whenever a command changes a figure, every
//! seam derived from it is rebuilt, and seams whose parent is gone are
//! dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithms::{
    dart::{insert_dart_into_figure, DartParams},
    merge::magnet_join,
    mirror::{mirror_figure, unfold_figure, Axis},
    offset::{compute_offset_with, rebuild_seam, set_edge_offset, toggle_edge_offset, OffsetSelector, SeamEdit, SeamOptions},
    pique::add_pique,
    snapping::SnapPoint,
};
use crate::config::EngineConfig;
use crate::ids::{IdSource, SequentialIds};
use crate::json::{validate_figure, validate_figures};
use crate::model::{EdgeId, Figure, FigureId, NodeId};

/// Collaborators injected into every transition.
pub struct EngineContext {
    pub config: EngineConfig,
    pub ids: Box<dyn IdSource>,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        EngineContext {
            config,
            ids: Box::new(SequentialIds::new()),
        }
    }
    /// Context whose id counter starts above every id used by `figures`.
    pub fn for_figures(config: EngineConfig, figures: &[Figure]) -> Self {
        EngineContext {
            config,
            ids: Box::new(SequentialIds::after(figures)),
        }
    }
    pub fn with_ids(config: EngineConfig, ids: Box<dyn IdSource>) -> Self {
        EngineContext { config, ids }
    }
    fn seam_options(&self) -> SeamOptions {
        SeamOptions::from_config(&self.config)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorState {
    pub figures: Vec<Figure>,
    pub undo: Vec<Vec<Figure>>,
    pub redo: Vec<Vec<Figure>>,
}

impl EditorState {
    pub fn new(figures: Vec<Figure>) -> Self {
        EditorState {
            figures,
            ..Default::default()
        }
    }
    pub fn figure(&self, id: &str) -> Option<&Figure> {
        self.figures.iter().find(|f| f.id == id)
    }
    /// First seam derived from `parent_id`.
    pub fn seam_of(&self, parent_id: &str) -> Option<&Figure> {
        seam_of(&self.figures, parent_id)
    }
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    AddFigure {
        figure: Figure,
    },
    /// Replaces the figure with the same id.
    ReplaceFigure {
        figure: Figure,
    },
    RemoveFigure {
        id: FigureId,
    },
    SetFigures {
        figures: Vec<Figure>,
    },
    ApplyOffset {
        figure_id: FigureId,
        selector: OffsetSelector,
        value_cm: f64,
    },
    ToggleEdgeOffset {
        figure_id: FigureId,
        edge_id: EdgeId,
        value_cm: f64,
    },
    SetEdgeOffset {
        figure_id: FigureId,
        edge_id: EdgeId,
        value_cm: f64,
    },
    InsertDart {
        figure_id: FigureId,
        edge_id: EdgeId,
        params: DartParams,
    },
    AddPique {
        figure_id: FigureId,
        edge_id: EdgeId,
        t01: f64,
        length_cm: f64,
        side: i8,
    },
    /// Reflects a figure in place, or adds a reflected copy when `copy` is set.
    Mirror {
        figure_id: FigureId,
        axis: Axis,
        position: f64,
        #[serde(default)]
        copy: bool,
    },
    Unfold {
        figure_id: FigureId,
        axis: Axis,
        position: f64,
    },
    MagnetJoin {
        moving_id: FigureId,
        moving_node: NodeId,
        snap: SnapPoint,
    },
    Undo,
    Redo,
}

/// Next state after `command`. Commands that change nothing (unknown ids,
/// rejected input, results equal to the current figures) return a state
/// equal to `state` and leave the history alone.
pub fn apply_command(state: &EditorState, command: Command, ctx: &mut EngineContext) -> EditorState {
    match command {
        Command::Undo => {
            let mut next = state.clone();
            if let Some(prev) = next.undo.pop() {
                next.redo.push(std::mem::replace(&mut next.figures, prev));
            }
            next
        }
        Command::Redo => {
            let mut next = state.clone();
            if let Some(fwd) = next.redo.pop() {
                next.undo.push(std::mem::replace(&mut next.figures, fwd));
            }
            next
        }
        cmd => {
            let Some(figures) = transition(&state.figures, cmd, ctx) else {
                return state.clone();
            };
            let figures = refresh_seams(&state.figures, figures, ctx);
            if figures == state.figures {
                return state.clone();
            }
            let mut undo = state.undo.clone();
            undo.push(state.figures.clone());
            let limit = ctx.config.history_limit;
            if undo.len() > limit {
                undo.drain(..undo.len() - limit);
            }
            EditorState {
                figures,
                undo,
                redo: Vec::new(),
            }
        }
    }
}

fn seam_of<'f>(figures: &'f [Figure], parent_id: &str) -> Option<&'f Figure> {
    figures.iter().find(|f| f.parent_id() == Some(parent_id))
}

fn find<'f>(figures: &'f [Figure], id: &str) -> Option<&'f Figure> {
    let f = figures.iter().find(|f| f.id == id);
    if f.is_none() {
        debug!(figure = id, "unknown figure");
    }
    f
}

fn replaced(figures: &[Figure], figure: Figure) -> Vec<Figure> {
    figures
        .iter()
        .map(|f| if f.id == figure.id { figure.clone() } else { f.clone() })
        .collect()
}

/// Writes a seam edit for `parent_id` into a new figure list.
fn apply_seam_edit(figures: &[Figure], parent_id: &str, edit: SeamEdit) -> Option<Vec<Figure>> {
    let existing = seam_of(figures, parent_id).map(|s| s.id.clone());
    match (edit, existing) {
        (SeamEdit::Unchanged, _) | (SeamEdit::Remove, None) => None,
        (SeamEdit::Remove, Some(id)) => Some(figures.iter().filter(|f| f.id != id).cloned().collect()),
        (SeamEdit::Replace(seam), Some(_)) => Some(replaced(figures, seam)),
        (SeamEdit::Replace(seam), None) => {
            let mut out = figures.to_vec();
            out.push(seam);
            Some(out)
        }
    }
}

fn transition(figures: &[Figure], command: Command, ctx: &mut EngineContext) -> Option<Vec<Figure>> {
    let samples = ctx.config.cubic_samples;
    let px_per_cm = ctx.config.px_per_cm;
    match command {
        Command::AddFigure { figure } => {
            if figures.iter().any(|f| f.id == figure.id) {
                debug!(figure = %figure.id, "figure id already in use");
                return None;
            }
            if let Err(err) = validate_figure(&figure) {
                debug!(%err, "figure rejected");
                return None;
            }
            let mut out = figures.to_vec();
            out.push(figure);
            Some(out)
        }
        Command::ReplaceFigure { figure } => {
            find(figures, &figure.id)?;
            if let Err(err) = validate_figure(&figure) {
                debug!(%err, "figure rejected");
                return None;
            }
            Some(replaced(figures, figure))
        }
        Command::RemoveFigure { id } => {
            find(figures, &id)?;
            Some(
                figures
                    .iter()
                    .filter(|f| f.id != id && f.parent_id() != Some(id.as_str()))
                    .cloned()
                    .collect(),
            )
        }
        Command::SetFigures { figures } => {
            if let Err(err) = validate_figures(&figures) {
                debug!(%err, "figure set rejected");
                return None;
            }
            Some(figures)
        }
        Command::ApplyOffset {
            figure_id,
            selector,
            value_cm,
        } => {
            let base = find(figures, &figure_id)?;
            if base.is_seam() {
                return None;
            }
            let opts = ctx.seam_options();
            let mut seam = compute_offset_with(base, &selector, value_cm, &opts, ctx.ids.as_mut())?;
            if let Some(existing) = seam_of(figures, &figure_id) {
                seam.id = existing.id.clone();
            }
            apply_seam_edit(figures, &figure_id, SeamEdit::Replace(seam))
        }
        Command::ToggleEdgeOffset {
            figure_id,
            edge_id,
            value_cm,
        } => {
            let base = find(figures, &figure_id)?;
            if base.is_seam() {
                return None;
            }
            let opts = ctx.seam_options();
            let edit = toggle_edge_offset(
                base,
                seam_of(figures, &figure_id),
                &edge_id,
                value_cm,
                &opts,
                ctx.ids.as_mut(),
            );
            apply_seam_edit(figures, &figure_id, edit)
        }
        Command::SetEdgeOffset {
            figure_id,
            edge_id,
            value_cm,
        } => {
            let base = find(figures, &figure_id)?;
            if base.is_seam() {
                return None;
            }
            let opts = ctx.seam_options();
            let edit = set_edge_offset(
                base,
                seam_of(figures, &figure_id),
                &edge_id,
                value_cm,
                &opts,
                ctx.ids.as_mut(),
            );
            apply_seam_edit(figures, &figure_id, edit)
        }
        Command::InsertDart {
            figure_id,
            edge_id,
            params,
        } => {
            let base = find(figures, &figure_id)?;
            let out = insert_dart_into_figure(base, &edge_id, params, px_per_cm, samples, ctx.ids.as_mut())?;
            Some(replaced(figures, out))
        }
        Command::AddPique {
            figure_id,
            edge_id,
            t01,
            length_cm,
            side,
        } => {
            let base = find(figures, &figure_id)?;
            Some(replaced(figures, add_pique(base, &edge_id, t01, length_cm, side)?))
        }
        Command::Mirror {
            figure_id,
            axis,
            position,
            copy,
        } => {
            let base = find(figures, &figure_id)?;
            if base.is_seam() || !position.is_finite() {
                return None;
            }
            let mut m = mirror_figure(base, axis, position);
            if copy {
                m.id = ctx.ids.next_id("fig");
                let mut out = figures.to_vec();
                out.push(m);
                Some(out)
            } else {
                Some(replaced(figures, m))
            }
        }
        Command::Unfold {
            figure_id,
            axis,
            position,
        } => {
            let base = find(figures, &figure_id)?;
            if base.is_seam() || !position.is_finite() {
                return None;
            }
            Some(replaced(figures, unfold_figure(base, axis, position, ctx.ids.as_mut())?))
        }
        Command::MagnetJoin {
            moving_id,
            moving_node,
            snap,
        } => magnet_join(figures, &moving_id, &moving_node, &snap, samples, ctx.ids.as_mut()),
        Command::Undo | Command::Redo => None,
    }
}

/// Drops orphaned seams and rebuilds the seams of every parent that differs
/// from its previous version.
fn refresh_seams(before: &[Figure], after: Vec<Figure>, ctx: &mut EngineContext) -> Vec<Figure> {
    let opts = ctx.seam_options();
    let mut out = Vec::with_capacity(after.len());
    for fig in &after {
        let Some(parent_id) = fig.parent_id() else {
            out.push(fig.clone());
            continue;
        };
        let Some(parent) = after.iter().find(|f| f.id == parent_id) else {
            debug!(seam = %fig.id, parent = parent_id, "dropping orphaned seam");
            continue;
        };
        let unchanged = before.iter().any(|f| f == parent);
        if unchanged {
            out.push(fig.clone());
            continue;
        }
        match rebuild_seam(parent, fig, &opts, ctx.ids.as_mut()) {
            SeamEdit::Replace(seam) => out.push(seam),
            SeamEdit::Remove => debug!(seam = %fig.id, "seam has no contributing edge left"),
            SeamEdit::Unchanged => out.push(fig.clone()),
        }
    }
    out
}
