//! Browser client for the host push socket

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use crate::ws_state::WsState;

/// Socket callback pushes, the app drains once per frame
pub type MessageBuffer = Rc<RefCell<VecDeque<String>>>;

pub struct WsClient {
    // dropping the socket closes it
    #[allow(dead_code)]
    ws: WebSocket,
    state: Rc<RefCell<WsState>>,
}

impl WsClient {
    /// Connect and send `auth` once open, if given
    pub fn connect(
        url: &str,
        auth: Option<String>,
        msg_buffer: MessageBuffer,
        state: Rc<RefCell<WsState>>,
    ) -> Result<Self, JsValue> {
        info!(url, "Connecting to push socket");

        let ws = WebSocket::new(url)?;

        // On open: mark connected, then authenticate before any frame is read
        let ws_clone = ws.clone();
        let state_clone = state.clone();
        let on_open = Closure::wrap(Box::new(move |_| {
            info!("Push socket connected");
            *state_clone.borrow_mut() = WsState::Connected;
            if let Some(auth) = &auth {
                debug!("Authenticating push socket");
                if let Err(e) = ws_clone.send_with_str(auth) {
                    error!(?e, "Failed to send auth message");
                }
            }
        }) as Box<dyn Fn(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        // callbacks live as long as the socket
        on_open.forget();

        // On message: text frames only, parsing happens on the next app frame
        let on_msg = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                msg_buffer.borrow_mut().push_back(txt.into());
            }
        }) as Box<dyn Fn(MessageEvent)>);
        ws.set_onmessage(Some(on_msg.as_ref().unchecked_ref()));
        on_msg.forget();

        // On error
        let state_clone = state.clone();
        let on_err = Closure::wrap(Box::new(move |e: ErrorEvent| {
            let msg = e.message();
            error!(error = %msg, "Push socket error");
            *state_clone.borrow_mut() = WsState::Error(msg);
        }) as Box<dyn Fn(ErrorEvent)>);
        ws.set_onerror(Some(on_err.as_ref().unchecked_ref()));
        on_err.forget();

        // On close: no reconnect, the header shows the state
        let state_clone = state.clone();
        let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
            warn!(code = e.code(), reason = %e.reason(), "Push socket closed");
            *state_clone.borrow_mut() = WsState::Disconnected;
        }) as Box<dyn Fn(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        Ok(Self { ws, state })
    }

    pub fn state(&self) -> WsState {
        self.state.borrow().clone()
    }
}
