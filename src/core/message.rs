//! Parser for plugin push messages delivered over the host socket
//!
//! Socket frames look like `{"plugin": {"plugin": "<id>", "data": {...}}}`.
//! Frames for other plugins and other frame types are ignored.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::buffer::ProbeSample;
use super::profile::Profile;

/// A push message addressed to this plugin
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Probing status; `text` is a human readable detail
    Status { status: String, text: Option<String> },
    /// One probed sample
    Point(ProbeSample),
    /// Server-side profile content changed; carries the new content when sent
    Profile(Option<Box<Profile>>),
}

/// Point payloads arrive as `[x, y, z]` or as `{x, y, z}`
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Triple([f64; 3]),
    Object { x: f64, y: f64, z: f64 },
}

impl From<PointRepr> for ProbeSample {
    fn from(p: PointRepr) -> Self {
        match p {
            PointRepr::Triple(t) => t.into(),
            PointRepr::Object { x, y, z } => ProbeSample::new(x, y, z),
        }
    }
}

/// Parse a raw socket frame
///
/// Returns None for anything that is not a message for `plugin_id`.
pub fn parse_frame(raw: &str, plugin_id: &str) -> Option<InboundMessage> {
    trace!(len = raw.len(), "Parsing frame");

    let json: Value = serde_json::from_str(raw)
        .map_err(|e| {
            warn!(error = %e, "Failed to parse frame JSON");
        })
        .ok()?;

    let envelope = json.get("plugin")?;
    let plugin = envelope.get("plugin")?.as_str()?;
    parse_plugin_message(plugin, envelope.get("data")?, plugin_id)
}

/// Interpret one plugin message; `plugin` is the sender's identifier
pub fn parse_plugin_message(plugin: &str, data: &Value, plugin_id: &str) -> Option<InboundMessage> {
    if plugin != plugin_id {
        trace!(plugin, "Message for another plugin ignored");
        return None;
    }

    if let Some(status) = truthy(data, "status") {
        let Some(status) = status.as_str() else {
            warn!(?status, "Non-text status ignored");
            return None;
        };
        let text = data.get("text").and_then(Value::as_str).map(str::to_string);
        debug!(status, text = ?text, "Status message");
        return Some(InboundMessage::Status {
            status: status.to_string(),
            text,
        });
    }

    if let Some(point) = truthy(data, "point") {
        let point: PointRepr = serde_json::from_value(point.clone())
            .map_err(|e| {
                warn!(error = %e, "Malformed point ignored");
            })
            .ok()?;
        let sample = ProbeSample::from(point);
        debug!(x = sample.x, y = sample.y, z = sample.z, "Point message");
        return Some(InboundMessage::Point(sample));
    }

    if let Some(profile) = truthy(data, "profile") {
        let content = if profile.is_object() {
            serde_json::from_value::<Profile>(profile.clone())
                .map_err(|e| {
                    warn!(error = %e, "Profile content unreadable, resyncing from store");
                })
                .ok()
                .map(Box::new)
        } else {
            None
        };
        debug!(with_content = content.is_some(), "Profile message");
        return Some(InboundMessage::Profile(content));
    }

    trace!("Message without known fields ignored");
    None
}

/// Field value if present and not null/false/empty
fn truthy<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    match data.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        v => Some(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "levelanything";

    #[test]
    fn test_parse_status_frame() {
        let msg = r#"{"plugin": {"plugin": "levelanything",
            "data": {"status": "PROBING", "text": "Probing point 1 of 25..."}}}"#;
        assert_eq!(
            parse_frame(msg, ID),
            Some(InboundMessage::Status {
                status: "PROBING".into(),
                text: Some("Probing point 1 of 25...".into()),
            })
        );
    }

    #[test]
    fn test_parse_point_triple_and_object() {
        let triple = r#"{"plugin": {"plugin": "levelanything", "data": {"point": [1, 2, 3.5]}}}"#;
        assert_eq!(
            parse_frame(triple, ID),
            Some(InboundMessage::Point(ProbeSample::new(1.0, 2.0, 3.5)))
        );

        let object = r#"{"plugin": {"plugin": "levelpcb", "data": {"point": {"x": 10, "y": 20, "z": -0.1}}}}"#;
        assert_eq!(
            parse_frame(object, "levelpcb"),
            Some(InboundMessage::Point(ProbeSample::new(10.0, 20.0, -0.1)))
        );
    }

    #[test]
    fn test_parse_profile_with_content() {
        let msg = r#"{"plugin": {"plugin": "levelanything",
            "data": {"profile": {"max_x": 120, "matrix": [[0, 0, 0.2]]}}}}"#;
        let Some(InboundMessage::Profile(Some(profile))) = parse_frame(msg, ID) else {
            panic!("expected profile content");
        };
        assert_eq!(profile.max_x, 120.0);
        assert_eq!(profile.matrix, vec![ProbeSample::new(0.0, 0.0, 0.2)]);
    }

    #[test]
    fn test_other_plugin_ignored() {
        let msg = r#"{"plugin": {"plugin": "otherplugin", "data": {"status": "PROBING"}}}"#;
        assert_eq!(parse_frame(msg, ID), None);
    }

    #[test]
    fn test_non_plugin_frames_ignored() {
        assert_eq!(parse_frame(r#"{"connected": {"version": "1.9"}}"#, ID), None);
        assert_eq!(parse_frame(r#"{"current": {"state": {}}}"#, ID), None);
        assert_eq!(parse_frame("garbage", ID), None);
    }

    #[test]
    fn test_malformed_fields_are_noops() {
        let data = serde_json::json!({"point": [1, 2]});
        assert_eq!(parse_plugin_message(ID, &data, ID), None);

        let data = serde_json::json!({"status": 5});
        assert_eq!(parse_plugin_message(ID, &data, ID), None);

        let data = serde_json::json!({"unexpected": true});
        assert_eq!(parse_plugin_message(ID, &data, ID), None);
    }

    #[test]
    fn test_status_takes_precedence() {
        let data = serde_json::json!({"status": "IDLE", "point": [1, 2, 3]});
        assert!(matches!(
            parse_plugin_message(ID, &data, ID),
            Some(InboundMessage::Status { .. })
        ));
    }
}
