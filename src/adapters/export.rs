use crate::core::catalog::Catalog;
use crate::domain::model::{Assignment, Lecturer, LecturerId, ModuleId};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    module_id: &'a str,
    course_code: &'a str,
    lecturer_id: &'a str,
    lecturer_name: &'a str,
    role: String,
    skill_mismatch: bool,
}

/// Render the confirmed bindings as CSV, one row per binding.
pub fn snapshot_to_csv(
    snapshot: &BTreeMap<ModuleId, Vec<Assignment>>,
    catalog: &Catalog,
    lecturers: &HashMap<LecturerId, Lecturer>,
) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for (module_id, assignments) in snapshot {
        let course_code = catalog.course_of(module_id).map(|c| c.code.as_str()).unwrap_or("");
        for assignment in assignments {
            let lecturer_name = lecturers
                .get(&assignment.lecturer_id)
                .map(|l| l.name.as_str())
                .unwrap_or("");
            writer.serialize(SnapshotRow {
                module_id,
                course_code,
                lecturer_id: &assignment.lecturer_id,
                lecturer_name,
                role: assignment.role.to_string(),
                skill_mismatch: assignment.skill_mismatch,
            })?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_snapshot_csv<P: AsRef<Path>>(
    path: P,
    snapshot: &BTreeMap<ModuleId, Vec<Assignment>>,
    catalog: &Catalog,
    lecturers: &HashMap<LecturerId, Lecturer>,
) -> Result<usize> {
    let content = snapshot_to_csv(snapshot, catalog, lecturers)?;
    std::fs::write(path.as_ref(), &content)?;
    let rows = snapshot.values().map(Vec::len).sum();
    tracing::info!("💾 Wrote {} bindings to {}", rows, path.as_ref().display());
    Ok(rows)
}
