//! Match history: records of matches a student decided to keep

use crate::error::{MatcherError, Result};
use crate::processing::profile::MatchRecord;
use log::debug;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Write side of the match history store.
pub trait MatchHistorySink {
    fn record(&self, record: &MatchRecord) -> Result<()>;

    /// All records for a student, oldest first
    fn history_for(&self, student_id: &str) -> Result<Vec<MatchRecord>>;
}

/// Append-only JSON Lines file, one record per line.
pub struct JsonlHistorySink {
    path: PathBuf,
}

impl JsonlHistorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatchHistorySink for JsonlHistorySink {
    fn record(&self, record: &MatchRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                MatcherError::Storage(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        writeln!(file, "{}", line)?;

        debug!(
            "Recorded match {} -> {} in {}",
            record.student_id,
            record.supervisor_id,
            self.path.display()
        );
        Ok(())
    }

    fn history_for(&self, student_id: &str) -> Result<Vec<MatchRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: MatchRecord = serde_json::from_str(&line).map_err(|e| {
                MatcherError::Storage(format!(
                    "Corrupt history entry at {}:{}: {}",
                    self.path.display(),
                    number + 1,
                    e
                ))
            })?;
            if record.student_id == student_id {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// History kept in memory, for tests and embedding callers.
#[derive(Default)]
pub struct InMemoryHistory {
    records: Mutex<Vec<MatchRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchHistorySink for InMemoryHistory {
    fn record(&self, record: &MatchRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn history_for(&self, student_id: &str) -> Result<Vec<MatchRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(student: &str, supervisor: &str, score: f32) -> MatchRecord {
        MatchRecord {
            student_id: student.to_string(),
            supervisor_id: supervisor.to_string(),
            supervisor_name: format!("Dr. {}", supervisor),
            final_score: score,
            research_alignment: 0.7,
            methodology_match: 0.5,
            technical_skills: 0.25,
            domain_knowledge: 0.4,
            matching_skills: vec!["python".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jsonl_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlHistorySink::new(dir.path().join("history").join("matches.jsonl"));

        sink.record(&record("ada", "s1", 0.61)).unwrap();
        sink.record(&record("bob", "s2", 0.40)).unwrap();
        sink.record(&record("ada", "s3", 0.55)).unwrap();

        let ada = sink.history_for("ada").unwrap();
        assert_eq!(ada.len(), 2);
        assert_eq!(ada[0].supervisor_id, "s1");
        assert_eq!(ada[1].supervisor_id, "s3");
        assert_eq!(ada[0].matching_skills, vec!["python"]);
    }

    #[test]
    fn test_missing_history_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let sink = JsonlHistorySink::new(dir.path().join("none.jsonl"));

        assert!(sink.history_for("ada").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        let err = JsonlHistorySink::new(&path).history_for("ada").err().unwrap();
        assert!(matches!(err, MatcherError::Storage(_)));
    }

    #[test]
    fn test_in_memory_history() {
        let history = InMemoryHistory::new();
        assert!(history.is_empty());

        history.record(&record("ada", "s1", 0.9)).unwrap();
        history.record(&record("bob", "s1", 0.3)).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.history_for("bob").unwrap().len(), 1);
    }
}
