use crate::domain::model::{CourseEntry, Lecturer, SmallGroup};
use crate::domain::ports::{CatalogProvider, LecturerRegistry};
use crate::utils::error::{AssignError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Catalog and lecturer registry read once from a local JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCatalog {
    #[serde(default)]
    pub courses: Vec<CourseEntry>,
    #[serde(default)]
    pub lecturers: Vec<Lecturer>,
    #[serde(default)]
    pub groups: Vec<SmallGroup>,
}

impl FileCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AssignError::ConfigError {
            message: format!("Cannot read fixture file {}: {}", path.display(), e),
        })?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(
            "📂 Loaded fixture {}: {} courses, {} lecturers, {} groups",
            path.display(),
            catalog.courses.len(),
            catalog.lecturers.len(),
            catalog.groups.len()
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[async_trait]
impl CatalogProvider for FileCatalog {
    async fn courses(&self) -> Result<Vec<CourseEntry>> {
        Ok(self.courses.clone())
    }

    async fn small_groups(&self, semester: u32) -> Result<Vec<SmallGroup>> {
        Ok(self
            .groups
            .iter()
            .filter(|group| group.semester == semester)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LecturerRegistry for FileCatalog {
    async fn lecturers(&self) -> Result<Vec<Lecturer>> {
        Ok(self.lecturers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FIXTURE: &str = r#"{
        "courses": [{
            "course": {"code": "CARD", "name": "Cardiology", "semester": 3, "block": 1, "requiredSkills": ["Cardiology"]},
            "modules": [
                {"id": "CARD-M1", "courseCode": "CARD", "sequence": 1, "title": "Heart"},
                {"id": "CARD-M2", "courseCode": "CARD", "sequence": 2, "title": "Vessels"}
            ]
        }],
        "lecturers": [{"id": "L1", "name": "Ayu", "skills": ["Cardiology"]}],
        "groups": [
            {"semester": 3, "groupName": "A"},
            {"semester": 5, "groupName": "B"}
        ]
    }"#;

    #[tokio::test]
    async fn test_fixture_serves_catalog_and_registry() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let catalog = FileCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.courses().await.unwrap()[0].modules.len(), 2);
        assert_eq!(catalog.small_groups(3).await.unwrap().len(), 1);
        assert!(catalog.small_groups(7).await.unwrap().is_empty());

        let lecturers = catalog.lecturers().await.unwrap();
        assert_eq!(lecturers[0].id, "L1");
        assert!(!lecturers[0].standby);
    }

    #[test]
    fn test_missing_fixture_is_config_error() {
        assert!(matches!(
            FileCatalog::from_file("/nonexistent/catalog.json"),
            Err(AssignError::ConfigError { .. })
        ));
    }
}
