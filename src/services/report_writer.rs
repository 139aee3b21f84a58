use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::AppResult;
use crate::models::score::GamificationReport;

/// Reads and writes the JSON report consumed by the dashboard.
pub struct ReportWriter;

impl ReportWriter {
    /// Serializes the report with keys in sorted order.
    pub fn to_json(report: &GamificationReport) -> AppResult<String> {
        Ok(serde_json::to_string(report)?)
    }

    pub fn write(path: &Path, report: &GamificationReport) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = Self::to_json(report)?;
        fs::write(path, json.as_bytes())?;

        info!(
            target: "app::report",
            path = %path.display(),
            users = report.user_names.len(),
            bytes = json.len(),
            "wrote gamification report"
        );
        Ok(())
    }

    pub fn read(path: &Path) -> AppResult<GamificationReport> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
