use crate::error::{KpiError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

pub const DEFAULT_CONFIG_FILE: &str = "lead_kpi.toml";

/// Environment variables that override config file entries: (variable,
/// section, key).
const ENV_OVERRIDES: [(&str, &str, &str); 5] = [
    ("LEAD_KPI_LEAD_BOOK", "workbooks", "lead"),
    ("LEAD_KPI_PDR_BOOK", "workbooks", "pdr"),
    ("LEAD_KPI_REPORT_BOOK", "workbooks", "report"),
    ("LEAD_KPI_MASTER_BOOK", "workbooks", "master"),
    ("LEAD_KPI_ARCHIVE_DIR", "publish", "archive_dir"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Six audit tabs to the report workbook.
    #[default]
    Audit,
    /// Formatted tab to the master workbook plus an archival export.
    Master,
    Both,
}

impl Strategy {
    pub fn includes_audit(self) -> bool {
        matches!(self, Strategy::Audit | Strategy::Both)
    }

    pub fn includes_master(self) -> bool {
        matches!(self, Strategy::Master | Strategy::Both)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KpiConfig {
    #[serde(default)]
    pub workbooks: WorkbooksConfig,
    #[serde(default)]
    pub tabs: TabsConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkbooksConfig {
    pub lead: Option<PathBuf>,
    pub pdr: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub master: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabsConfig {
    #[serde(default = "default_lead_tab")]
    pub lead: String,
    #[serde(default = "default_attendance_tab")]
    pub attendance: String,
    #[serde(default = "default_project_hours_tab")]
    pub project_hours: String,
    #[serde(default = "default_final_report_tab")]
    pub final_report: String,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            lead: default_lead_tab(),
            attendance: default_attendance_tab(),
            project_hours: default_project_hours_tab(),
            final_report: default_final_report_tab(),
        }
    }
}

fn default_lead_tab() -> String {
    "Lead".to_string()
}

fn default_attendance_tab() -> String {
    "Attendance".to_string()
}

fn default_project_hours_tab() -> String {
    "Project_Hours".to_string()
}

fn default_final_report_tab() -> String {
    "Lead_KPI_Report".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub strategy: Strategy,
    pub archive_dir: Option<PathBuf>,
    #[serde(default = "default_archive_file")]
    pub archive_file: String,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            archive_dir: None,
            archive_file: default_archive_file(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_archive_file() -> String {
    "lead_kpi_log.json".to_string()
}

fn default_preview_rows() -> usize {
    5
}

fn required<'a>(value: &'a Option<PathBuf>, key: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| KpiError::MissingSetting(key.to_string()))
}

impl KpiConfig {
    pub fn lead_book(&self) -> Result<&Path> {
        required(&self.workbooks.lead, "workbooks.lead")
    }

    pub fn pdr_book(&self) -> Result<&Path> {
        required(&self.workbooks.pdr, "workbooks.pdr")
    }

    pub fn report_book(&self) -> Result<&Path> {
        required(&self.workbooks.report, "workbooks.report")
    }

    pub fn master_book(&self) -> Result<&Path> {
        required(&self.workbooks.master, "workbooks.master")
    }

    pub fn archive_dir(&self) -> Result<&Path> {
        required(&self.publish.archive_dir, "publish.archive_dir")
    }

    /// Check that every location the selected strategy needs is present.
    pub fn validate(&self) -> Result<()> {
        self.lead_book()?;
        self.pdr_book()?;
        let strategy = self.publish.strategy;
        if strategy.includes_audit() {
            self.report_book()?;
        }
        if strategy.includes_master() {
            self.master_book()?;
            self.archive_dir()?;
        }
        Ok(())
    }
}

/// Load the config file (if present) with process environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<KpiConfig> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

pub(crate) fn load_config_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<KpiConfig> {
    let mut merged = Value::Table(Map::new());
    match path {
        Some(p) if p.exists() => merge_toml(&mut merged, read_toml_value(p)?),
        Some(p) => {
            return Err(KpiError::ConfigParse(format!(
                "{}: file not found",
                p.display()
            )))
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                merge_toml(&mut merged, read_toml_value(default)?);
            }
        }
    }
    merge_toml(&mut merged, env_overlay(env));

    Ok(merged.try_into::<KpiConfig>()?)
}

fn env_overlay(env: impl Fn(&str) -> Option<String>) -> Value {
    let mut root = Map::new();
    for (var, section, key) in ENV_OVERRIDES {
        let Some(value) = env(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let entry = root
            .entry(section.to_string())
            .or_insert(Value::Table(Map::new()));
        if let Value::Table(table) = entry {
            table.insert(key.to_string(), Value::String(value));
        }
    }
    Value::Table(root)
}

fn read_toml_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| KpiError::ConfigParse(format!("{}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| KpiError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}
