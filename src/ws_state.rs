//! Push socket connection state, shared by the browser and native clients

#[derive(Clone, Debug, PartialEq)]
pub enum WsState {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl WsState {
    pub fn is_connected(&self) -> bool {
        matches!(self, WsState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            WsState::Connecting => "Connecting...",
            WsState::Connected => "Connected",
            WsState::Disconnected => "Disconnected",
            WsState::Error(_) => "Error",
        }
    }
}

impl std::fmt::Display for WsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsState::Error(e) => write!(f, "{}: {}", self.label(), e),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert!(WsState::Connected.is_connected());
        assert_eq!(WsState::Disconnected.to_string(), "Disconnected");
        assert_eq!(WsState::Error("refused".into()).to_string(), "Error: refused");
    }
}
