//! API request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::shell::HostPlatform;

/// JSON body of every API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

/// Response for GET /api/meta.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub ok: bool,
    /// Operating system family, e.g. `linux` or `windows`.
    pub platform: HostPlatform,
    pub arch: &'static str,
    /// Human-readable OS name.
    pub os_label: &'static str,
}

/// Response for GET /api/status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Presence of each named prerequisite.
    #[serde(flatten)]
    pub checks: BTreeMap<String, bool>,
    /// All required prerequisites are present.
    pub ready: bool,
}

/// Query flags accepted by the build and bootstrap triggers.
///
/// `true`, `1`, `yes` and `on` switch a flag on; any other value leaves it
/// off.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RunQuery {
    /// Request live delivery without an `Accept` header.
    #[serde(deserialize_with = "query_flag")]
    pub stream: bool,
    /// Interleave stage records into the live stream.
    #[serde(deserialize_with = "query_flag")]
    pub stages: bool,
}

fn query_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_is_flat() {
        let response = StatusResponse {
            checks: BTreeMap::from([("toolchain".to_string(), true), ("runtime".to_string(), false)]),
            ready: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"toolchain": true, "runtime": false, "ready": false})
        );
    }

    #[test]
    fn test_meta_response_camel_case() {
        let json = serde_json::to_value(MetaResponse {
            ok: true,
            platform: HostPlatform::Linux,
            arch: "x86_64",
            os_label: "Linux/Unix",
        })
        .unwrap();
        assert_eq!(json["platform"], "linux");
        assert_eq!(json["osLabel"], "Linux/Unix");
    }

    #[test]
    fn test_error_body_omits_missing_hint() {
        let json = serde_json::to_value(ErrorBody {
            ok: false,
            error: "Method not allowed".to_string(),
            kind: "MethodNotAllowed",
            hint: None,
        })
        .unwrap();
        assert!(json.get("hint").is_none());
        assert_eq!(json["ok"], false);
    }

    #[test]
    fn test_run_query_defaults() {
        let query = RunQuery::default();
        assert!(!query.stream);
        assert!(!query.stages);
    }

    #[test]
    fn test_run_query_flags_are_lenient() {
        let query: RunQuery =
            serde_json::from_value(serde_json::json!({"stream": "1", "stages": "TRUE"})).unwrap();
        assert!(query.stream);
        assert!(query.stages);

        let query: RunQuery =
            serde_json::from_value(serde_json::json!({"stream": "nope", "stages": ""})).unwrap();
        assert!(!query.stream);
        assert!(!query.stages);
    }
}
