//! Outbound plugin commands

use serde::Serialize;

/// Command body posted to the plugin's API endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename = "probe_start")]
    ProbeStart,
    #[serde(rename = "probe_cancel")]
    ProbeCancel,
    #[serde(rename = "profile_changed")]
    ProfileChanged,
    /// Single-grid probing run with explicit dimensions
    #[serde(rename = "probeStart", rename_all = "camelCase")]
    PcbProbeStart {
        probe_width: f64,
        probe_height: f64,
        points_x: u32,
        points_y: u32,
    },
    #[serde(rename = "probeCancel")]
    PcbProbeCancel,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ProbeStart => "probe_start",
            Command::ProbeCancel => "probe_cancel",
            Command::ProfileChanged => "profile_changed",
            Command::PcbProbeStart { .. } => "probeStart",
            Command::PcbProbeCancel => "probeCancel",
        }
    }

    pub fn to_json(&self) -> String {
        // unit and struct variants of an internally tagged enum always serialize
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"command":"{}"}}"#, self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body(cmd: &Command) -> Value {
        serde_json::from_str(&cmd.to_json()).unwrap()
    }

    #[test]
    fn test_unit_commands() {
        assert_eq!(body(&Command::ProbeStart), json!({"command": "probe_start"}));
        assert_eq!(body(&Command::ProbeCancel), json!({"command": "probe_cancel"}));
        assert_eq!(
            body(&Command::ProfileChanged),
            json!({"command": "profile_changed"})
        );
        assert_eq!(body(&Command::PcbProbeCancel), json!({"command": "probeCancel"}));
    }

    #[test]
    fn test_pcb_probe_start_payload() {
        let cmd = Command::PcbProbeStart {
            probe_width: 80.5,
            probe_height: 60.0,
            points_x: 4,
            points_y: 3,
        };
        assert_eq!(
            body(&cmd),
            json!({
                "command": "probeStart",
                "probeWidth": 80.5,
                "probeHeight": 60.0,
                "pointsX": 4,
                "pointsY": 3
            })
        );
        assert_eq!(cmd.name(), "probeStart");
    }
}
