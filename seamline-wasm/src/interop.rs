use js_sys::{Object, Reflect};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object {
    Object::new()
}
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

/// Plain JS objects rather than `Map`s, so per-edge offset tables read like
/// the saved JSON.
pub fn to_js<T: Serialize + ?Sized>(v: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

pub fn from_js<T: DeserializeOwned>(v: JsValue) -> Result<T, serde_wasm_bindgen::Error> {
    serde_wasm_bindgen::from_value(v)
}

pub fn point(x: f64, y: f64) -> JsValue {
    let arr = js_sys::Float64Array::new_with_length(2);
    arr.copy_from(&[x, y]);
    arr.into()
}
