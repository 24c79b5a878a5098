use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;

pub use api::*;

/// Editor session: figures, undo/redo history and engine settings.
#[wasm_bindgen]
pub struct Editor {
    pub(crate) state: seamline::EditorState,
    pub(crate) ctx: seamline::EngineContext,
}

impl Editor {
    pub fn rs_new(config: seamline::EngineConfig) -> Editor {
        Editor {
            state: seamline::EditorState::default(),
            ctx: seamline::EngineContext::new(config),
        }
    }
    pub fn rs_figures(&self) -> &[seamline::Figure] {
        &self.state.figures
    }
}
