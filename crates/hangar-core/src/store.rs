//! JSON file data access.
//!
//! The on-disk files are the single source of truth and are re-read on every
//! request. Concurrent override writes are last-writer-wins; the append-only
//! logs rely on atomic append semantics. No locking.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::HangarError;
use crate::model::{Flight, FlightsDocument};

/// Reads and writes the flights master file, per-flight override files, and
/// the tuner settings blob under a single data directory.
#[derive(Debug, Clone)]
pub struct FlightStore {
    data_dir: PathBuf,
}

impl FlightStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn flights_file(&self) -> PathBuf {
        self.data_dir.join("flights.json")
    }

    fn override_dir(&self) -> PathBuf {
        self.data_dir.join("flights")
    }

    fn tuner_file(&self) -> PathBuf {
        self.data_dir.join("tuner.json")
    }

    /// Flight ids become file names; reject anything that could escape the
    /// override directory.
    fn override_file(&self, id: &str) -> Result<PathBuf, HangarError> {
        let safe = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.contains("..");
        if !safe {
            return Err(HangarError::BadRequest(format!("invalid flight id: {id}")));
        }
        Ok(self.override_dir().join(format!("{id}.json")))
    }

    /// Master document as raw JSON, exactly as stored on disk.
    pub async fn load_flights_raw(&self) -> Result<Value, HangarError> {
        let path = self.flights_file();
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HangarError::Storage(format!("failed to read flights: {e}")))?;
        serde_json::from_str(&data)
            .map_err(|e| HangarError::Storage(format!("invalid flights file: {e}")))
    }

    /// Master document parsed into domain types.
    pub async fn load_flights(&self) -> Result<FlightsDocument, HangarError> {
        let path = self.flights_file();
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HangarError::Storage(format!("failed to read flights: {e}")))?;
        serde_json::from_str(&data)
            .map_err(|e| HangarError::Storage(format!("invalid flights file: {e}")))
    }

    /// Single flight as raw JSON: the override file wins when it exists and
    /// parses; otherwise the master record. Absent from both is NotFound.
    pub async fn load_flight_raw(&self, id: &str) -> Result<Value, HangarError> {
        let per_file = self.override_file(id)?;
        if let Ok(data) = tokio::fs::read_to_string(&per_file).await {
            if let Ok(value) = serde_json::from_str::<Value>(&data) {
                return Ok(value);
            }
            // corrupt override falls through to the master record
        }
        let doc = self.load_flights().await?;
        let flight = doc
            .flights
            .into_iter()
            .find(|f| f.id == id)
            .ok_or_else(|| HangarError::NotFound(format!("flight not found: {id}")))?;
        serde_json::to_value(&flight)
            .map_err(|e| HangarError::Storage(format!("failed to encode flight: {e}")))
    }

    /// Chat context resolution: the id must exist in the master list; the
    /// override file is preferred when it parses. No match is simply None.
    pub async fn resolve_context(&self, doc: &FlightsDocument, id: &str) -> Option<Flight> {
        let master = doc.flights.iter().find(|f| f.id == id)?;
        let per_file = self.override_file(id).ok()?;
        if let Ok(data) = tokio::fs::read_to_string(&per_file).await {
            if let Ok(flight) = serde_json::from_str::<Flight>(&data) {
                return Some(flight);
            }
        }
        Some(master.clone())
    }

    /// Overwrites the override file for this id, creating the directory if
    /// absent. Last-writer-wins by design.
    pub async fn save_override(&self, id: &str, body: &Value) -> Result<(), HangarError> {
        let per_file = self.override_file(id)?;
        tokio::fs::create_dir_all(self.override_dir())
            .await
            .map_err(|e| HangarError::Storage(format!("failed to create override dir: {e}")))?;
        let data = serde_json::to_string_pretty(body)
            .map_err(|e| HangarError::Storage(format!("failed to encode flight: {e}")))?;
        tokio::fs::write(&per_file, data)
            .await
            .map_err(|e| HangarError::Storage(format!("failed to save flight: {e}")))
    }

    /// Opaque tuner settings blob. Any read or parse failure yields an empty
    /// object rather than an error.
    pub async fn load_tuner(&self) -> Value {
        match tokio::fs::read_to_string(self.tuner_file()).await {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|_| Value::Object(Default::default())),
            Err(_) => Value::Object(Default::default()),
        }
    }

    pub async fn save_tuner(&self, body: &Value) -> Result<(), HangarError> {
        let data = serde_json::to_string_pretty(body)
            .map_err(|e| HangarError::Storage(format!("failed to encode tuner: {e}")))?;
        tokio::fs::write(self.tuner_file(), data)
            .await
            .map_err(|e| HangarError::Storage(format!("failed to save tuner: {e}")))
    }
}

/// Append-only newline-delimited JSON trace log. Every entry gets an RFC 3339
/// UTC `ts` field. Append failures are logged and swallowed: tracing a
/// request must never fail it.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Creates the parent log directory eagerly; failure to do so only
    /// surfaces later as swallowed append warnings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create log dir {}: {e}", parent.display());
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped JSON line. Non-object entries are wrapped
    /// under an `entry` key.
    pub async fn append(&self, entry: Value) {
        let mut record = match entry {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("entry".to_string(), other);
                map
            }
        };
        record.insert("ts".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
        let mut line = match serde_json::to_string(&Value::Object(record)) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to encode audit entry: {e}");
                return;
            }
        };
        line.push('\n');
        let result = async {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            // tokio files buffer internally; the line must be on disk before
            // the request returns
            file.flush().await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!("failed to append to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &Path, flights: Value) {
        std::fs::write(dir.join("flights.json"), serde_json::to_string(&flights).unwrap()).unwrap();
    }

    fn sample_doc() -> Value {
        serde_json::json!({
            "flights": [
                { "id": "A400-01", "displayName": "Atlas 01", "components": [] },
                { "id": "A400-02", "displayName": "Atlas 02", "components": [
                    { "id": "eng-1", "status": "Critical", "maintenanceDue": "overdue" }
                ] }
            ]
        })
    }

    #[tokio::test]
    async fn override_file_is_preferred_over_master() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), sample_doc());
        let store = FlightStore::new(dir.path());

        let body = serde_json::json!({ "id": "A400-01", "displayName": "Patched", "components": [] });
        store.save_override("A400-01", &body).await.unwrap();

        let loaded = store.load_flight_raw("A400-01").await.unwrap();
        assert_eq!(loaded, body);
    }

    #[tokio::test]
    async fn corrupt_override_falls_back_to_master_record() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), sample_doc());
        std::fs::create_dir_all(dir.path().join("flights")).unwrap();
        std::fs::write(dir.path().join("flights/A400-02.json"), "{ not json").unwrap();

        let store = FlightStore::new(dir.path());
        let loaded = store.load_flight_raw("A400-02").await.unwrap();
        assert_eq!(loaded["displayName"], "Atlas 02");
    }

    #[tokio::test]
    async fn unknown_flight_is_not_found() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), sample_doc());
        let store = FlightStore::new(dir.path());
        match store.load_flight_raw("A400-99").await {
            Err(HangarError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn path_escaping_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), sample_doc());
        let store = FlightStore::new(dir.path());
        match store.load_flight_raw("../secrets").await {
            Err(HangarError::BadRequest(_)) => {}
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_tuner_reads_as_empty_object() {
        let dir = TempDir::new().unwrap();
        let store = FlightStore::new(dir.path());
        assert_eq!(store.load_tuner().await, serde_json::json!({}));

        let settings = serde_json::json!({ "sensitivity": 0.8 });
        store.save_tuner(&settings).await.unwrap();
        assert_eq!(store.load_tuner().await, settings);
    }

    #[tokio::test]
    async fn resolve_context_requires_master_membership() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), sample_doc());
        let store = FlightStore::new(dir.path());
        let doc = store.load_flights().await.unwrap();

        assert!(store.resolve_context(&doc, "A400-99").await.is_none());
        let flight = store.resolve_context(&doc, "A400-02").await.unwrap();
        assert_eq!(flight.display_name.as_deref(), Some("Atlas 02"));
    }

    #[tokio::test]
    async fn audit_log_appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path().join("logs/ai.log"));
        log.append(serde_json::json!({ "event": "request", "message": "hello" })).await;
        log.append(serde_json::json!({ "event": "local-reply" })).await;

        let data = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert!(value["ts"].is_string());
        }
        let first: Value = serde_json::from_str(data.lines().next().unwrap()).unwrap();
        assert_eq!(first["event"], "request");
    }
}
