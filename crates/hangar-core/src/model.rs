//! Shared domain types for the squadron maintenance backend.
//!
//! Wire casing is camelCase throughout: the documents are authored by hand and
//! consumed by the browser client, so the Rust side adapts to them, not the
//! other way around.

use serde::{Deserialize, Serialize};

/// Component status with a total severity order: Good < Warning < Critical.
///
/// Unrecognized status strings are preserved verbatim and rank as
/// Warning-equivalent severity. Unknown states stay visible without being
/// treated as safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentStatus {
    Good,
    Warning,
    Critical,
    Unknown(String),
}

impl ComponentStatus {
    pub const SEVERITY_GOOD: u8 = 0;
    pub const SEVERITY_WARNING: u8 = 1;
    pub const SEVERITY_CRITICAL: u8 = 2;

    /// Severity rank used by the aggregator. Unknown ranks as Warning.
    pub fn severity(&self) -> u8 {
        match self {
            ComponentStatus::Good => Self::SEVERITY_GOOD,
            ComponentStatus::Warning | ComponentStatus::Unknown(_) => Self::SEVERITY_WARNING,
            ComponentStatus::Critical => Self::SEVERITY_CRITICAL,
        }
    }

    /// The canonical label for a severity rank (ranks above Critical clamp).
    pub fn from_severity(rank: u8) -> ComponentStatus {
        match rank {
            0 => ComponentStatus::Good,
            1 => ComponentStatus::Warning,
            _ => ComponentStatus::Critical,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComponentStatus::Good => "Good",
            ComponentStatus::Warning => "Warning",
            ComponentStatus::Critical => "Critical",
            ComponentStatus::Unknown(s) => s,
        }
    }

    /// Case-insensitive label check, matching how hand-authored files mix
    /// casing ("critical" vs "Critical").
    pub fn matches_label(&self, label: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(label)
    }
}

impl From<String> for ComponentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Good" => ComponentStatus::Good,
            "Warning" => ComponentStatus::Warning,
            "Critical" => ComponentStatus::Critical,
            _ => ComponentStatus::Unknown(s),
        }
    }
}

impl From<ComponentStatus> for String {
    fn from(s: ComponentStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A maintainable component owned by exactly one flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    /// Absent status ranks as Warning severity, same as an unrecognized one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ComponentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_due: Option<String>,
}

impl Component {
    pub fn severity(&self) -> u8 {
        self.status
            .as_ref()
            .map(ComponentStatus::severity)
            .unwrap_or(ComponentStatus::SEVERITY_WARNING)
    }

    /// Best human-readable name for summary lines.
    pub fn name(&self) -> &str {
        self.component_name
            .as_deref()
            .or(self.display_name.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("unnamed component")
    }
}

/// One aircraft record. Operator-authored extra fields survive round-trips
/// through the override file via the flattened map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Flight {
    /// Display name with the id as fallback.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// Shape of the master flights file: `{ "flights": [...] }`. A missing
/// `flights` key reads as an empty squadron.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightsDocument {
    #[serde(default)]
    pub flights: Vec<Flight>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One turn of a chat conversation, both for request history and the upstream
/// completion payload. Role and content are both required; bodies with
/// malformed turns are rejected at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_status_ranks_as_warning_and_round_trips() {
        let status: ComponentStatus = serde_json::from_value(serde_json::json!("Degraded")).unwrap();
        assert_eq!(status.severity(), ComponentStatus::SEVERITY_WARNING);
        assert_eq!(serde_json::to_value(&status).unwrap(), serde_json::json!("Degraded"));
    }

    #[test]
    fn missing_status_ranks_as_warning() {
        let component: Component = serde_json::from_value(serde_json::json!({ "id": "eng-1" })).unwrap();
        assert_eq!(component.severity(), ComponentStatus::SEVERITY_WARNING);
    }

    #[test]
    fn flight_extra_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "id": "A400-01",
            "displayName": "Atlas 01",
            "components": [],
            "tailNumber": "ZM401"
        });
        let flight: Flight = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&flight).unwrap(), raw);
    }

    #[test]
    fn flights_document_tolerates_missing_list() {
        let doc: FlightsDocument = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(doc.flights.is_empty());
    }
}
