use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::now_utc_iso;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub attempted: u64,
    pub created: u64,
    pub failed: u64,
    pub designs: Vec<Map<String, Value>>,
}

pub fn write_summary(
    path: &Path,
    summary: &SessionSummary,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = match serde_json::to_value(summary)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{write_summary, SessionSummary};

    #[test]
    fn summary_includes_counts_and_extra_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("summary.json");
        let mut design = Map::new();
        design.insert("image_path".to_string(), json!("design-1.png"));
        let summary = SessionSummary {
            session_id: "session-1".to_string(),
            started_at: "2026-01-01T00:00:00.000000+00:00".to_string(),
            finished_at: "2026-01-01T00:01:00.000000+00:00".to_string(),
            attempted: 2,
            created: 1,
            failed: 1,
            designs: vec![design],
        };
        let mut extra = Map::new();
        extra.insert("engine_id".to_string(), json!("sdxl"));
        write_summary(&path, &summary, Some(&extra))?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed["session_id"], json!("session-1"));
        assert_eq!(parsed["attempted"], json!(2));
        assert_eq!(parsed["failed"], json!(1));
        assert_eq!(parsed["designs"][0]["image_path"], json!("design-1.png"));
        assert_eq!(parsed["engine_id"], json!("sdxl"));
        assert!(parsed["ts"].is_string());
        Ok(())
    }
}
