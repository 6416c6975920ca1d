use anyhow::Context;
use examguard_core::config::SessionConfig;
use std::path::PathBuf;

/// JSON file holding the values the page-rendering layer hands to a session.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads and validates the session config.
    pub fn load(&self) -> anyhow::Result<SessionConfig> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: SessionConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        cfg.validate()
            .with_context(|| format!("invalid config: {}", self.path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use examguard_core::config::ProgressMode;
    use examguard_core::types::{AttemptNumber, CandidateId};

    #[test]
    fn loads_config_written_by_the_page_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{
                "total_minutes": 45,
                "total_questions": 12,
                "candidate_id": "42",
                "attempt_number": 2,
                "backend_url": "http://localhost:5000",
                "hidden_fields": [["current_set", "3"]],
                "progress_mode": "ephemeral"
            }"#,
        )
        .unwrap();

        let cfg = ConfigStore::at_path(&path).load().unwrap();
        assert_eq!(cfg.total_minutes, 45);
        assert_eq!(cfg.candidate_id, CandidateId::new("42"));
        assert_eq!(cfg.attempt_number, AttemptNumber(2));
        assert_eq!(cfg.hidden_fields, vec![("current_set".to_string(), "3".to_string())]);
        assert_eq!(cfg.progress_mode, ProgressMode::Ephemeral);
        assert_eq!(cfg.form_action, "/test");
    }

    #[test]
    fn load_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"total_minutes":0,"total_questions":5,"candidate_id":"1","attempt_number":1,"backend_url":"http://x"}"#,
        )
        .unwrap();

        let err = ConfigStore::at_path(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("total_minutes"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("absent.json"));
        assert!(store.load().is_err());
    }
}
