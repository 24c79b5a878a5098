use seamline::{
    algorithms::snapping, Axis, Command, ConfigError, DartTarget, EditorState, EngineConfig, EngineContext, Figure, FigureGraph, IdSource,
    OffsetSelector, SequentialIds, SnapPoint, Vec2,
};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;

use crate::error;
use crate::interop::{from_js, point, to_js};
use crate::Editor;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

type Res = Result<JsValue, JsValue>;

fn respond(r: Res) -> JsValue {
    r.unwrap_or_else(|e| e)
}

fn parse<T: DeserializeOwned>(param: &str, v: JsValue) -> Result<T, JsValue> {
    from_js(v).map_err(|e| error::invalid_figure(param, e))
}

fn reply<T: Serialize + ?Sized>(v: &T) -> Res {
    to_js(v)
        .map(error::ok)
        .map_err(|e| error::err("invalid_document", e.to_string(), None))
}

fn reply_opt<T: Serialize>(v: Option<&T>) -> Res {
    match v {
        Some(v) => reply(v),
        None => Ok(error::ok(JsValue::NULL)),
    }
}

fn finite(param: &str, v: f64) -> Result<(), JsValue> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(error::non_finite(param))
    }
}

fn positive(param: &str, v: f64) -> Result<(), JsValue> {
    finite(param, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(error::out_of_range(param, 0.0, f64::MAX, v))
    }
}

fn axis(v: &str) -> Result<Axis, JsValue> {
    match v {
        "vertical" | "x" => Ok(Axis::Vertical),
        "horizontal" | "y" => Ok(Axis::Horizontal),
        _ => Err(error::not_applicable("axis must be 'vertical' or 'horizontal'")),
    }
}

/// Id source seeded past every id in `figures`.
fn ids_for(figures: &[Figure]) -> SequentialIds {
    SequentialIds::after(figures)
}

#[wasm_bindgen]
pub fn trace_outer_boundary(figure: JsValue) -> JsValue {
    respond((|| {
        let f: Figure = parse("figure", figure)?;
        if !f.closed {
            return Err(error::not_closed(&f.id));
        }
        match seamline::trace_outer_boundary(&f) {
            Some(b) => reply(&b),
            None => Err(error::no_boundary(&f.id)),
        }
    })())
}

/// Seam for the whole outer loop, or for one edge when `edge_id` is given.
#[wasm_bindgen]
pub fn compute_offset(figure: JsValue, edge_id: Option<String>, value_cm: f64, px_per_cm: f64) -> JsValue {
    respond((|| {
        positive("value_cm", value_cm)?;
        positive("px_per_cm", px_per_cm)?;
        let f: Figure = parse("figure", figure)?;
        if !f.closed {
            return Err(error::not_closed(&f.id));
        }
        if let Some(id) = &edge_id {
            if f.edge(id).is_none() {
                return Err(error::invalid_id("edge", id));
            }
        }
        let selector = edge_id.map_or(OffsetSelector::Whole, OffsetSelector::Edge);
        let mut ids = ids_for(std::slice::from_ref(&f));
        match seamline::compute_offset(&f, &selector, value_cm, px_per_cm, &mut ids) {
            Some(seam) => reply(&seam),
            None => Err(error::no_boundary(&f.id)),
        }
    })())
}

/// `value` is `null` when the target is left unchanged (degenerate edge,
/// opening wider than the edge).
#[wasm_bindgen]
pub fn insert_dart(target: JsValue, position_ratio: f64, depth_px: f64, opening_px: f64) -> JsValue {
    respond((|| {
        finite("position_ratio", position_ratio)?;
        if !(0.0..=1.0).contains(&position_ratio) {
            return Err(error::out_of_range("position_ratio", 0.0, 1.0, position_ratio));
        }
        positive("depth_px", depth_px)?;
        positive("opening_px", opening_px)?;
        let t: DartTarget = parse("target", target)?;
        reply_opt(seamline::insert_dart(&t, position_ratio, depth_px, opening_px).as_ref())
    })())
}

#[wasm_bindgen]
pub fn mirror_point(x: f64, y: f64, axis_name: &str, position: f64) -> JsValue {
    respond((|| {
        finite("x", x)?;
        finite("y", y)?;
        finite("position", position)?;
        let p = seamline::mirror_point(Vec2::new(x, y), axis(axis_name)?, position);
        Ok(error::ok(point(p.x, p.y)))
    })())
}

/// Rotation in degrees for a seam or notch label, folded so text stays upright.
#[wasm_bindgen]
pub fn label_angle(deg: f64) -> f64 {
    seamline::geometry::math::upright_label_angle(deg)
}

#[wasm_bindgen]
pub fn mirror_figure(figure: JsValue, axis_name: &str, position: f64) -> JsValue {
    respond((|| {
        finite("position", position)?;
        let a = axis(axis_name)?;
        let f: Figure = parse("figure", figure)?;
        reply(&seamline::mirror_figure(&f, a, position))
    })())
}

#[wasm_bindgen]
pub fn unfold_figure(figure: JsValue, axis_name: &str, position: f64) -> JsValue {
    respond((|| {
        finite("position", position)?;
        let a = axis(axis_name)?;
        let f: Figure = parse("figure", figure)?;
        if f.closed {
            return Err(error::not_applicable("unfold needs an open figure"));
        }
        let mut ids = ids_for(std::slice::from_ref(&f));
        match seamline::unfold_figure(&f, a, position, &mut ids) {
            Some(u) => reply(&u),
            None => Err(error::not_applicable("unfold needs a single open stroke with at least two points")),
        }
    })())
}

/// Flattened chains of `figure` in local coordinates, outer loop first.
#[wasm_bindgen]
pub fn flatten_figure(figure: JsValue, samples: u32) -> JsValue {
    respond((|| {
        if samples == 0 {
            return Err(error::out_of_range("samples", 1.0, f64::from(u32::MAX), 0.0));
        }
        let f: Figure = parse("figure", figure)?;
        reply(&FigureGraph::new(&f).flatten_all(samples as usize))
    })())
}

#[wasm_bindgen]
pub fn get_all_snap_points(figures: JsValue, exclude: Option<String>) -> JsValue {
    respond((|| {
        let figs: Vec<Figure> = parse("figures", figures)?;
        let samples = EngineConfig::default().cubic_samples;
        reply(&snapping::get_all_snap_points(&figs, exclude.as_deref(), samples))
    })())
}

/// `value` is the closest snap point strictly within `threshold_px`, or `null`.
#[wasm_bindgen]
pub fn find_nearest_snap_point(x: f64, y: f64, points: JsValue, threshold_px: f64) -> JsValue {
    respond((|| {
        finite("x", x)?;
        finite("y", y)?;
        finite("threshold_px", threshold_px)?;
        let pts: Vec<SnapPoint> = parse("points", points)?;
        reply_opt(snapping::find_nearest_snap_point(Vec2::new(x, y), &pts, threshold_px))
    })())
}

#[wasm_bindgen]
pub fn magnet_join(figures: JsValue, moving_id: &str, moving_node: &str, snap: JsValue) -> JsValue {
    respond((|| {
        let figs: Vec<Figure> = parse("figures", figures)?;
        let sp: SnapPoint = parse("snap", snap)?;
        let Some(moving) = figs.iter().find(|f| f.id == moving_id) else {
            return Err(error::invalid_id("figure", moving_id));
        };
        if moving.node(moving_node).is_none() {
            return Err(error::invalid_id("node", moving_node));
        }
        let mut ids = ids_for(&figs);
        let samples = EngineConfig::default().cubic_samples;
        match seamline::magnet_join(&figs, moving_id, moving_node, &sp, samples, &mut ids) {
            Some(out) => reply(&out),
            None => Err(error::not_applicable("snap does not designate another figure")),
        }
    })())
}

#[wasm_bindgen]
impl Editor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Editor {
        crate::Editor::rs_new(EngineConfig::default())
    }

    /// Replaces the engine settings from a (partial) JSON object.
    pub fn set_config(&mut self, json: &str) -> JsValue {
        match EngineConfig::from_json_str(json) {
            Ok(cfg) => {
                self.ctx.config = cfg;
                error::ok(JsValue::TRUE)
            }
            Err(e @ ConfigError::Json(_)) => error::err("invalid_document", e.to_string(), None),
            Err(e @ ConfigError::Invalid { .. }) => error::err("out_of_range", e.to_string(), None),
        }
    }

    /// Loads a project document, dropping the history.
    pub fn load_document(&mut self, text: &str) -> JsValue {
        match seamline::load_document(text) {
            Ok(figs) => {
                let count = figs.len();
                self.ctx = EngineContext::for_figures(self.ctx.config.clone(), &figs);
                self.state = EditorState::new(figs);
                error::ok(JsValue::from_f64(count as f64))
            }
            Err(e) => error::invalid_document(&e),
        }
    }

    pub fn save_document(&self) -> JsValue {
        match seamline::save_document(self.rs_figures()) {
            Ok(s) => error::ok(JsValue::from_str(&s)),
            Err(e) => error::invalid_document(&e),
        }
    }

    pub fn figures(&self) -> JsValue {
        respond(reply(self.rs_figures()))
    }

    pub fn figure_count(&self) -> u32 {
        self.state.figures.len() as u32
    }

    /// Applies one command object (`{"type": "addFigure", ...}`); `value`
    /// tells whether the figures changed.
    pub fn apply(&mut self, command: JsValue) -> JsValue {
        respond((|| {
            let cmd: Command = parse("command", command)?;
            let next = seamline::apply_command(&self.state, cmd, &mut self.ctx);
            let changed = next.figures != self.state.figures;
            self.state = next;
            Ok(error::ok(JsValue::from_bool(changed)))
        })())
    }

    pub fn undo(&mut self) -> bool {
        self.step(Command::Undo)
    }
    pub fn redo(&mut self) -> bool {
        self.step(Command::Redo)
    }
    pub fn can_undo(&self) -> bool {
        self.state.can_undo()
    }
    pub fn can_redo(&self) -> bool {
        self.state.can_redo()
    }

    pub fn snap_points(&self, exclude: Option<String>) -> JsValue {
        let pts = snapping::get_all_snap_points(self.rs_figures(), exclude.as_deref(), self.ctx.config.cubic_samples);
        respond(reply(&pts))
    }

    /// Nearest snap point within the configured threshold, or `null`.
    pub fn find_snap(&self, x: f64, y: f64, exclude: Option<String>) -> JsValue {
        respond((|| {
            finite("x", x)?;
            finite("y", y)?;
            let pts =
                snapping::get_all_snap_points(self.rs_figures(), exclude.as_deref(), self.ctx.config.cubic_samples);
            reply_opt(snapping::find_nearest_snap_point(
                Vec2::new(x, y),
                &pts,
                self.ctx.config.snap_threshold_px,
            ))
        })())
    }

    /// Mints an id from the session's id source.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.ctx.ids.next_id(prefix)
    }
}

impl Editor {
    fn step(&mut self, cmd: Command) -> bool {
        let next = seamline::apply_command(&self.state, cmd, &mut self.ctx);
        let changed = next.figures != self.state.figures;
        self.state = next;
        changed
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}
