//! Leveling dashboard (browser)
//!
//! Settings are fetched once at startup; after that the controller is the
//! source of truth and every action flows through the effect runner.

mod canvas;
mod dialogs;
mod header;
mod panel;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use eframe::egui;
use tracing::{error, info, warn};

use crate::api::{run_effects, Backend, BrowserClient};
use crate::config::Config;
use crate::controller::{Effect, PluginController};
use crate::core::LevelError;
use crate::grid::CanvasGeometry;
use crate::theme::{colors, minimal_visuals};
use crate::websocket_wasm::{MessageBuffer, WsClient};
use crate::ws_state::WsState;

/// Result of the startup fetch, picked up by the next frame
enum Startup {
    Pending,
    Ready {
        controller: PluginController,
        auth: Option<String>,
    },
    Failed(LevelError),
}

pub struct LevelApp {
    config: Config,
    backend: BrowserClient,
    startup: Rc<RefCell<Startup>>,
    pub(crate) controller: Option<Rc<RefCell<PluginController>>>,
    ws_state: Rc<RefCell<WsState>>,
    ws_client: Option<WsClient>,
    msg_buffer: MessageBuffer,
    pub(crate) dialogs: dialogs::Dialogs,
}

impl LevelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        cc.egui_ctx.set_visuals(minimal_visuals());

        let backend = BrowserClient::new(&config);
        let startup = Rc::new(RefCell::new(Startup::Pending));

        let task_backend = backend.clone();
        let task_startup = startup.clone();
        let plugin = config.plugin;
        let ctx = cc.egui_ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = match task_backend.load_settings().await {
                Ok(doc) => PluginController::from_settings(plugin, &doc, CanvasGeometry::default()),
                Err(e) => Err(e),
            };
            let next = match result {
                Ok(controller) => {
                    let auth = match task_backend.login().await {
                        Ok(session) => Some(session.auth_message()),
                        Err(e) => {
                            warn!(error = %e, "Passive login failed, connecting unauthenticated");
                            None
                        }
                    };
                    Startup::Ready { controller, auth }
                }
                Err(e) => {
                    error!(error = %e, "Loading settings failed");
                    Startup::Failed(e)
                }
            };
            *task_startup.borrow_mut() = next;
            ctx.request_repaint();
        });

        Self {
            config,
            backend,
            startup,
            controller: None,
            ws_state: Rc::new(RefCell::new(WsState::Connecting)),
            ws_client: None,
            msg_buffer: Rc::new(RefCell::new(VecDeque::new())),
            dialogs: dialogs::Dialogs::default(),
        }
    }

    /// Move the startup result into the app once it arrives
    fn finish_startup(&mut self) {
        if self.controller.is_some() {
            return;
        }
        let ready = std::mem::replace(&mut *self.startup.borrow_mut(), Startup::Pending);
        match ready {
            Startup::Ready { controller, auth } => {
                info!(plugin = self.config.plugin.id(), "Dashboard ready");
                self.controller = Some(Rc::new(RefCell::new(controller)));
                self.ws_client = WsClient::connect(
                    &self.config.socket_url(),
                    auth,
                    self.msg_buffer.clone(),
                    self.ws_state.clone(),
                )
                .map_err(|e| error!(?e, "Failed to open push socket"))
                .ok();
            }
            other => *self.startup.borrow_mut() = other,
        }
    }

    /// Feed buffered socket frames to the controller
    fn drain_messages(&mut self) {
        let Some(controller) = &self.controller else {
            return;
        };
        let frames: Vec<String> = self.msg_buffer.borrow_mut().drain(..).collect();
        let mut controller = controller.borrow_mut();
        for frame in &frames {
            controller.handle_frame(frame);
        }
    }

    /// Run effects in the background; the controller is borrowed only between awaits
    pub(crate) fn dispatch(&self, ctx: &egui::Context, effects: Vec<Effect>) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if effects.is_empty() {
            return;
        }
        let backend = self.backend.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            run_effects(&controller, &backend, effects).await;
            ctx.request_repaint();
        });
    }

    fn render_startup(&self, ui: &mut egui::Ui) {
        let text = match &*self.startup.borrow() {
            Startup::Failed(e) => format!("Failed to load settings: {}", e),
            _ => "Loading settings...".to_string(),
        };
        ui.label(egui::RichText::new(text).color(colors::TEXT_SECONDARY));
    }
}

impl eframe::App for LevelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // push messages arrive outside of egui input events
        ctx.request_repaint();

        self.finish_startup();
        self.drain_messages();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| {
                self.render_header(ui);
                ui.add_space(8.0);

                if self.controller.is_none() {
                    self.render_startup(ui);
                    return;
                }

                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| self.render_panel(ui));
                    ui.add_space(16.0);
                    self.render_grid(ui);
                });
            });

        self.render_dialogs(ctx);
    }
}
