use js_sys::Object;
use seamline::DocumentError;
use wasm_bindgen::prelude::*;

use crate::interop::{new_obj, set_kv};

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data {
        set_kv(&e, "data", &d);
    }
    set_kv(&root, "error", &e.into());
    root.into()
}

fn with_param(param: &str) -> Object {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    d
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    err(
        "non_finite",
        format!("parameter '{}' must be finite", param),
        Some(with_param(param).into()),
    )
}

#[inline]
pub fn out_of_range(param: &str, min: f64, max: f64, got: f64) -> JsValue {
    let d = with_param(param);
    set_kv(&d, "min", &JsValue::from_f64(min));
    set_kv(&d, "max", &JsValue::from_f64(max));
    set_kv(&d, "got", &JsValue::from_f64(got));
    err("out_of_range", format!("parameter '{}' out of range", param), Some(d.into()))
}

#[inline]
pub fn invalid_id(kind: &str, id: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_str(id));
    err("invalid_id", format!("invalid {} id", kind), Some(d.into()))
}

/// A figure or figure list that does not deserialize.
pub fn invalid_figure(param: &str, e: impl std::fmt::Display) -> JsValue {
    err("invalid_figure", e.to_string(), Some(with_param(param).into()))
}

pub fn invalid_document(e: &DocumentError) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&format!("rejected document: {e}")));
    err(e.code(), e.to_string(), None)
}

#[inline]
pub fn not_closed(figure: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "figure", &JsValue::from_str(figure));
    err("not_closed", "operation needs a closed figure", Some(d.into()))
}

#[inline]
pub fn no_boundary(figure: &str) -> JsValue {
    let d = new_obj();
    set_kv(&d, "figure", &JsValue::from_str(figure));
    err("no_boundary", "figure has no traceable outer loop", Some(d.into()))
}

#[inline]
pub fn not_applicable(message: &str) -> JsValue {
    err("not_applicable", message.to_string(), None)
}
