// Ingestion boundary: named tables in, typed records out.
//
// Column aliases are resolved once per table here, so nothing downstream
// ever checks which spelling of a header the source used.
use crate::error::{KpiError, Result};
use crate::types::{AttendanceRecord, LeadRecord, LoadReport, ProjectHourRecord, QualityMetrics};
use crate::util::{coerce, normalize_id, normalize_month};
use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A header row plus string data rows, as read from a source tab.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows the reader could not decode at all.
    pub skipped: usize,
}

pub trait TableSource {
    fn read_table(&self, name: &str) -> Result<RawTable>;
}

/// A directory of `<tab>.csv` files standing in for one spreadsheet.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
}

impl CsvWorkbook {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tab_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }
}

impl TableSource for CsvWorkbook {
    fn read_table(&self, name: &str) -> Result<RawTable> {
        let path = self.tab_path(name);
        if !path.exists() {
            return Err(KpiError::TableNotFound(path.display().to_string()));
        }
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(&path)?;
        let header = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            match result {
                Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => {
                    debug!("{}: skipping undecodable row: {}", name, e);
                    skipped += 1;
                }
            }
        }
        Ok(RawTable {
            name: name.to_string(),
            header,
            rows,
            skipped,
        })
    }
}

pub mod columns {
    pub const MONTH: &str = "Month";
    pub const QAI_ID: &str = "QAI_ID";
    pub const LEAD: &str = "Lead";
    pub const PROJECT: &str = "Project name";
    pub const QUALITY: &str = "Quality Score (RCA)";
    pub const TIMELINESS: &str = "Project Delivery Timeliness";
    pub const DOCUMENTATION: &str = "Documentation & Reporting";
    pub const COMMUNICATION: &str = "Communication Efficiency";
    pub const DISCIPLINE: &str = "Discipline & Punctuality";
    pub const ATTENDANCE: &str = "Attendance";
    pub const TRAINING: &str = "Training and assessment performance";
    pub const PDR: &str = "PDR";
    pub const PROJECT_HOUR: &str = "Project Hour";
}

/// Resolved column positions for one table; each slot holds the index of the
/// first alias present in the header.
struct ColumnMap {
    slots: Vec<Option<usize>>,
    missing: Vec<String>,
}

impl ColumnMap {
    fn resolve(table: &RawTable, wanted: &[&[&str]]) -> Self {
        let mut slots = Vec::with_capacity(wanted.len());
        let mut missing = Vec::new();
        for aliases in wanted {
            let idx = aliases
                .iter()
                .find_map(|alias| table.header.iter().position(|h| h == alias));
            if idx.is_none() {
                warn!(
                    "{}: column {:?} not found, treating as empty",
                    table.name, aliases[0]
                );
                missing.push(aliases[0].to_string());
            }
            slots.push(idx);
        }
        Self { slots, missing }
    }

    /// Raw cell text, `None` for missing columns and short rows.
    fn cell<'a>(&self, row: &'a [String], slot: usize) -> Option<&'a str> {
        self.slots[slot].and_then(|i| row.get(i)).map(String::as_str)
    }

    /// Trimmed non-empty text.
    fn text(&self, row: &[String], slot: usize) -> Option<String> {
        self.cell(row, slot)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn number(&self, row: &[String], slot: usize) -> f64 {
        coerce(self.cell(row, slot))
    }
}

fn report(table: &RawTable, keyed_rows: usize, map: &ColumnMap) -> LoadReport {
    LoadReport {
        source: table.name.clone(),
        total_rows: table.rows.len(),
        keyed_rows,
        skipped_rows: table.skipped,
        missing_columns: map.missing.join(", "),
    }
}

pub fn decode_leads(table: &RawTable) -> (Vec<LeadRecord>, LoadReport) {
    use columns::*;
    let map = ColumnMap::resolve(
        table,
        &[
            &[MONTH],
            &[QAI_ID],
            &[LEAD],
            &[PROJECT],
            &[QUALITY],
            &[TIMELINESS],
            &[DOCUMENTATION],
            &[COMMUNICATION],
            &[DISCIPLINE],
        ],
    );
    let records: Vec<LeadRecord> = table
        .rows
        .iter()
        .map(|row| LeadRecord {
            month: normalize_month(map.cell(row, 0)),
            qai_id: normalize_id(map.cell(row, 1)),
            lead: map.text(row, 2),
            project: map.text(row, 3),
            metrics: QualityMetrics {
                quality: map.number(row, 4),
                timeliness: map.number(row, 5),
                documentation: map.number(row, 6),
                communication: map.number(row, 7),
                discipline: map.number(row, 8),
            },
        })
        .collect();
    let keyed = records.iter().filter(|r| r.key().is_some()).count();
    let load_report = report(table, keyed, &map);
    (records, load_report)
}

pub fn decode_attendance(table: &RawTable) -> (Vec<AttendanceRecord>, LoadReport) {
    use columns::*;
    let map = ColumnMap::resolve(
        table,
        &[
            &[MONTH],
            &[QAI_ID, "ID"],
            &["Attendance Score", "Score"],
            &[TRAINING],
        ],
    );
    let records: Vec<AttendanceRecord> = table
        .rows
        .iter()
        .map(|row| AttendanceRecord {
            month: normalize_month(map.cell(row, 0)),
            qai_id: normalize_id(map.cell(row, 1)),
            attendance: map.number(row, 2),
            training: map.number(row, 3),
        })
        .collect();
    let keyed = records.iter().filter(|r| r.key().is_some()).count();
    let load_report = report(table, keyed, &map);
    (records, load_report)
}

pub fn decode_project_hours(table: &RawTable) -> (Vec<ProjectHourRecord>, LoadReport) {
    use columns::*;
    let map = ColumnMap::resolve(
        table,
        &[
            &[PROJECT, "Project Batch"],
            &[PROJECT_HOUR, "SUM of Effective Work Hour"],
            &[PDR],
        ],
    );
    let records: Vec<ProjectHourRecord> = table
        .rows
        .iter()
        .map(|row| ProjectHourRecord {
            project: map.text(row, 0),
            hours: map.number(row, 1),
            pdr: map.number(row, 2),
        })
        .collect();
    let keyed = records.iter().filter(|r| r.project.is_some()).count();
    let load_report = report(table, keyed, &map);
    (records, load_report)
}

/// Everything the pipeline consumes, already typed.
#[derive(Debug, Clone, Default)]
pub struct KpiInputs {
    pub leads: Vec<LeadRecord>,
    pub attendance: Vec<AttendanceRecord>,
    pub project_hours: Vec<ProjectHourRecord>,
}

/// Tab names to read from each source.
#[derive(Debug, Clone, Copy)]
pub struct SourceTabs<'a> {
    pub lead: &'a str,
    pub attendance: &'a str,
    pub project_hours: &'a str,
}

/// Read and decode all three inputs. Lead and attendance share one source,
/// project hours come from the other.
pub fn load_inputs(
    lead_source: &dyn TableSource,
    pdr_source: &dyn TableSource,
    tabs: SourceTabs<'_>,
) -> Result<(KpiInputs, Vec<LoadReport>)> {
    let (leads, lead_report) = decode_leads(&lead_source.read_table(tabs.lead)?);
    let (attendance, att_report) = decode_attendance(&lead_source.read_table(tabs.attendance)?);
    let (project_hours, pdr_report) =
        decode_project_hours(&pdr_source.read_table(tabs.project_hours)?);
    Ok((
        KpiInputs {
            leads,
            attendance,
            project_hours,
        },
        vec![lead_report, att_report, pdr_report],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table(name: &str, header: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            name: name.to_string(),
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            skipped: 0,
        }
    }

    #[test]
    fn blank_names_are_absent_not_empty() {
        use columns::*;
        let t = table(
            "Lead",
            &[MONTH, QAI_ID, LEAD, PROJECT],
            &[&["Jan", "QAI_1", "  ", ""], &["Jan", "QAI_1", "Asha", "Alpha"]],
        );
        let (leads, _) = decode_leads(&t);
        assert_eq!(leads[0].lead, None);
        assert_eq!(leads[0].project, None);
        let core = crate::aggregate::monthly_core(&leads);
        assert_eq!(core[0].lead.as_deref(), Some("Asha"));
        assert_eq!(core[0].projects, "Alpha");
    }

    #[test]
    fn lead_rows_are_normalized_and_coerced() {
        let t = table(
            "Lead",
            &[
                "Month",
                "QAI_ID",
                "Lead",
                "Project name",
                "Quality Score (RCA)",
                "Project Delivery Timeliness",
                "Documentation & Reporting",
                "Communication Efficiency",
                "Discipline & Punctuality",
            ],
            &[&["jan", "qai 7", " Asha ", "Alpha", "0.9", "x", "", "1", "0.5"]],
        );
        let (records, rep) = decode_leads(&t);
        let r = &records[0];
        assert_eq!(r.month.as_deref(), Some("January"));
        assert_eq!(r.qai_id.as_deref(), Some("QAI_7"));
        assert_eq!(r.lead.as_deref(), Some("Asha"));
        assert_eq!(r.metrics.quality, 0.9);
        assert_eq!(r.metrics.timeliness, 0.0);
        assert_eq!(r.metrics.documentation, 0.0);
        assert_eq!(rep.keyed_rows, 1);
        assert!(rep.missing_columns.is_empty());
    }

    #[test]
    fn attendance_prefers_qai_id_and_attendance_score() {
        let t = table(
            "Attendance",
            &["Month", "ID", "QAI_ID", "Score", "Attendance Score"],
            &[&["Feb", "ignored", "qai_1", "1", "4"]],
        );
        let (records, rep) = decode_attendance(&t);
        assert_eq!(records[0].qai_id.as_deref(), Some("QAI_1"));
        assert_eq!(records[0].attendance, 4.0);
        assert_eq!(records[0].training, 0.0);
        assert_eq!(rep.missing_columns, "Training and assessment performance");
    }

    #[test]
    fn attendance_falls_back_to_id_and_score() {
        let t = table(
            "Attendance",
            &["Month", "ID", "Score", "Training and assessment performance"],
            &[&["March", "qai 2", "3.5", "4"], &["March", "", "1", "1"]],
        );
        let (records, rep) = decode_attendance(&t);
        assert_eq!(records[0].qai_id.as_deref(), Some("QAI_2"));
        assert_eq!(records[0].attendance, 3.5);
        assert_eq!(records[0].training, 4.0);
        assert_eq!(records[1].qai_id, None);
        assert_eq!(rep.keyed_rows, 1);
    }

    #[test]
    fn project_hours_accept_sheet_headers() {
        let t = table(
            "Project_Hours",
            &["Project Batch", "SUM of Effective Work Hour", "PDR"],
            &[&["Alpha", "1,200", "0.8"], &["Beta", "", "bad"]],
        );
        let (records, _) = decode_project_hours(&t);
        assert_eq!(records[0].project.as_deref(), Some("Alpha"));
        assert_eq!(records[0].hours, 1200.0);
        assert_eq!(records[0].pdr, 0.8);
        assert_eq!(records[1].hours, 0.0);
        assert_eq!(records[1].pdr, 0.0);
    }

    #[test]
    fn short_rows_read_as_missing_cells() {
        let t = table(
            "Project_Hours",
            &["Project name", "Project Hour", "PDR"],
            &[&["Alpha"]],
        );
        let (records, _) = decode_project_hours(&t);
        assert_eq!(records[0].hours, 0.0);
        assert_eq!(records[0].pdr, 0.0);
    }

    #[test]
    fn csv_workbook_trims_headers() {
        let dir = TempDir::new().expect("temp dir should be created");
        fs::write(
            dir.path().join("Project_Hours.csv"),
            " Project name ,Project Hour, PDR\nAlpha,10,2\n",
        )
        .expect("fixture should write");
        let book = CsvWorkbook::new(dir.path());
        let raw = book.read_table("Project_Hours").expect("tab should read");
        assert_eq!(raw.header, vec!["Project name", "Project Hour", "PDR"]);
        assert_eq!(raw.rows.len(), 1);
    }

    #[test]
    fn missing_tab_is_an_error() {
        let dir = TempDir::new().expect("temp dir should be created");
        let book = CsvWorkbook::new(dir.path());
        let err = book.read_table("Lead").expect_err("tab should be missing");
        assert!(matches!(err, KpiError::TableNotFound(_)));
    }
}
