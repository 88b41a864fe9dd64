//! Bed leveling dashboard for OctoPrint leveling plugins
//!
//! Renders probed bed heights live on a 2D grid and keeps leveling profiles
//! in sync with the print server:
//! - `levelanything`: named profiles with a persisted probe matrix each
//! - `levelpcb`: a single grid sized by four flat settings
//!
//! The browser build (`wasm` feature) is an egui dashboard; the `cli` feature
//! adds a headless terminal client.

pub mod api;
pub mod config;
pub mod controller;
pub mod core;
pub mod grid;
pub mod ws_state;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub mod websocket_native;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod app;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod theme;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod websocket_wasm;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod web {
    use tracing::error;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::app::LevelApp;
    use crate::config::Config;

    const CANVAS_ID: &str = "level_canvas";

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();

        let config = match Config::from_window() {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Invalid dashboard configuration");
                return;
            }
        };

        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CANVAS_ID))
            .and_then(|el| el.dyn_into::<web_sys::HtmlCanvasElement>().ok());
        let Some(canvas) = canvas else {
            error!(id = CANVAS_ID, "Canvas element not found");
            return;
        };

        wasm_bindgen_futures::spawn_local(async move {
            let result = eframe::WebRunner::new()
                .start(
                    canvas,
                    eframe::WebOptions::default(),
                    Box::new(move |cc| Ok(Box::new(LevelApp::new(cc, config)))),
                )
                .await;
            if let Err(e) = result {
                error!(?e, "Failed to start eframe");
            }
        });
    }
}
