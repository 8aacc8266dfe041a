//! Supervisor profile sources

use crate::error::{MatcherError, Result};
use crate::processing::profile::SupervisorProfile;
use log::{info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Read side of the supervisor store.
pub trait SupervisorDirectory {
    fn supervisors(&self) -> Result<Vec<SupervisorProfile>>;
}

/// Supervisors held in memory, e.g. already fetched by a caller.
impl SupervisorDirectory for Vec<SupervisorProfile> {
    fn supervisors(&self) -> Result<Vec<SupervisorProfile>> {
        Ok(self.clone())
    }
}

/// A JSON array of supervisor objects on disk.
///
/// Records missing their interests load with empty interests. Records that do
/// not fit the profile shape keep whatever identity fields they have and are
/// logged, so one bad entry never hides the rest of the directory.
pub struct JsonSupervisorDirectory {
    path: PathBuf,
}

impl JsonSupervisorDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(content: &str) -> Result<Vec<SupervisorProfile>> {
        let records: Vec<Value> = serde_json::from_str(content).map_err(|e| {
            MatcherError::InputData(format!("Supervisor file must be a JSON array: {}", e))
        })?;

        Ok(records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<SupervisorProfile>(record.clone())
                    .unwrap_or_else(|e| recover_record(index, &record, &e.to_string()))
            })
            .collect())
    }
}

impl SupervisorDirectory for JsonSupervisorDirectory {
    fn supervisors(&self) -> Result<Vec<SupervisorProfile>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            MatcherError::InputData(format!(
                "Failed to read supervisors from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let supervisors = Self::parse(&content)?;
        info!("Loaded {} supervisors from {}", supervisors.len(), self.path.display());
        Ok(supervisors)
    }
}

fn recover_record(index: usize, record: &Value, reason: &str) -> SupervisorProfile {
    let err = MatcherError::InputData(format!("Supervisor record {}: {}", index, reason));
    warn!("{}, loading it without research interests", err);

    let text = |key: &str| match record.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    SupervisorProfile {
        id: text("id").unwrap_or_else(|| format!("record-{}", index)),
        name: text("name").unwrap_or_else(|| format!("Unnamed supervisor {}", index + 1)),
        department: text("department"),
        interests: None,
        expertise: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("supervisors.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "1", "name": "Dr. Smith", "department": "CS", "interests": "machine learning"},
                {"id": "2", "name": "Dr. Jones"}
            ]"#,
        )
        .unwrap();

        let supervisors = JsonSupervisorDirectory::new(&path).supervisors().unwrap();

        assert_eq!(supervisors.len(), 2);
        assert_eq!(supervisors[0].interests_text(), "machine learning");
        assert!(!supervisors[1].has_interests());
    }

    #[test]
    fn test_malformed_record_is_recovered() {
        let supervisors = JsonSupervisorDirectory::parse(
            r#"[{"id": 7, "name": "Dr. Odd", "interests": ["not", "a", "string"]}, {"name": 3}]"#,
        )
        .unwrap();

        assert_eq!(supervisors.len(), 2);
        assert_eq!(supervisors[0].id, "7");
        assert_eq!(supervisors[0].name, "Dr. Odd");
        assert!(supervisors[0].interests.is_none());
        assert_eq!(supervisors[1].id, "record-1");
        assert_eq!(supervisors[1].name, "3");
    }

    #[test]
    fn test_non_array_is_input_error() {
        let err = JsonSupervisorDirectory::parse(r#"{"id": "1"}"#).err().unwrap();
        assert!(matches!(err, MatcherError::InputData(_)));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = JsonSupervisorDirectory::new("/no/such/supervisors.json")
            .supervisors()
            .err()
            .unwrap();
        assert!(!err.is_fatal());
    }
}
