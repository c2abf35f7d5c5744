use lecturer_assign::domain::ports::{CatalogProvider, LecturerRegistry};
use lecturer_assign::utils::validation::Validate;
use lecturer_assign::{EngineSettings, FileCatalog, TomlConfig};
use std::fs;
use tempfile::TempDir;

const FIXTURE: &str = r#"{
    "courses": [{
        "course": {"code": "PULM", "name": "Pulmonology", "semester": 5, "block": 2},
        "modules": [{"id": "PULM-M1", "courseCode": "PULM", "sequence": 1, "title": "Lungs"}]
    }],
    "lecturers": [{"id": "S1", "name": "Eka", "standby": true}],
    "groups": [{"semester": 5, "groupName": "A"}, {"semester": 5, "groupName": "B"}]
}"#;

#[test]
fn test_config_with_fixture_catalog() {
    let dir = TempDir::new().unwrap();
    let fixture_path = dir.path().join("catalog.json");
    fs::write(&fixture_path, FIXTURE).unwrap();

    let config_path = dir.path().join("assign.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[backend]
base_url = "http://localhost:8080/api"

[engine]
block = 2
semesters = [5]

[fixtures]
catalog_file = "{}"
"#,
            fixture_path.display()
        ),
    )
    .unwrap();

    let config = TomlConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();

    let settings = EngineSettings::from_provider(&config);
    assert_eq!(settings.block, 2);
    assert_eq!(settings.semesters, vec![5]);

    let catalog = FileCatalog::from_file(&config.fixtures.unwrap().catalog_file).unwrap();
    let courses = tokio_test::block_on(catalog.courses()).unwrap();
    assert_eq!(courses[0].course.block, 2);
    assert_eq!(tokio_test::block_on(catalog.small_groups(5)).unwrap().len(), 2);

    let lecturers = tokio_test::block_on(catalog.lecturers()).unwrap();
    assert!(lecturers[0].standby);
}

#[test]
fn test_fixture_with_wrong_extension_is_rejected() {
    let config = TomlConfig::from_toml_str(
        r#"
[backend]
base_url = "http://localhost:8080"

[fixtures]
catalog_file = "catalog.yaml"
"#,
    )
    .unwrap();

    assert!(config.validate().is_err());
}
