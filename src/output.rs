use crate::error::{KpiError, Result};
use crate::loader::CsvWorkbook;
use crate::reports::{ReportSet, Table};
use crate::types::LoadReport;
use crate::util::{format_int, format_number};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table as TextTable};
use tracing::info;

pub trait TableSink {
    /// Replace the named destination with `table`; any previous content under
    /// that name is discarded.
    fn write_table(&mut self, table: &Table) -> Result<()>;
}

fn sink_error(table: &str, err: impl ToString) -> KpiError {
    KpiError::SinkWrite {
        table: table.to_string(),
        reason: err.to_string(),
    }
}

impl TableSink for CsvWorkbook {
    fn write_table(&mut self, table: &Table) -> Result<()> {
        std::fs::create_dir_all(self.root()).map_err(|e| sink_error(&table.name, e))?;
        let path = self.tab_path(&table.name);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| sink_error(&table.name, e))?;
        }
        write_csv(&path, table).map_err(|e| sink_error(&table.name, e))
    }
}

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.header)?;
    for row in table.display_rows() {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

#[derive(Serialize)]
struct ArchiveDocument<'a> {
    generated_at: String,
    sources: &'a [LoadReport],
    tables: Vec<&'a Table>,
}

/// Offline export of a whole table set into a single JSON log file.
#[derive(Debug, Clone)]
pub struct ArchiveSink {
    path: PathBuf,
}

impl ArchiveSink {
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export(&self, sources: &[LoadReport], tables: &[&Table]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| sink_error("archive", e))?;
        }
        let doc = ArchiveDocument {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            sources,
            tables: tables.to_vec(),
        };
        write_json(&self.path, &doc).map_err(|e| sink_error("archive", e))
    }
}

pub trait Publisher {
    fn name(&self) -> &'static str;
    fn publish(&mut self, report: &ReportSet, sources: &[LoadReport]) -> Result<()>;
}

fn upload<S: TableSink + ?Sized>(sink: &mut S, table: &Table) -> Result<()> {
    sink.write_table(table)?;
    info!(
        "Uploaded tab: {} ({} rows)",
        table.name,
        format_int(table.rows.len())
    );
    Ok(())
}

/// Writes every audit tab to a dedicated report workbook.
pub struct AuditPublisher<S: TableSink> {
    sink: S,
}

impl<S: TableSink> AuditPublisher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: TableSink> Publisher for AuditPublisher<S> {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn publish(&mut self, report: &ReportSet, _sources: &[LoadReport]) -> Result<()> {
        for table in &report.audit {
            upload(&mut self.sink, table)?;
        }
        Ok(())
    }
}

/// Writes the presentation tab back into the master workbook and archives
/// the full table set.
pub struct MasterPublisher<S: TableSink> {
    sink: S,
    archive: ArchiveSink,
}

impl<S: TableSink> MasterPublisher<S> {
    pub fn new(sink: S, archive: ArchiveSink) -> Self {
        Self { sink, archive }
    }
}

impl<S: TableSink> Publisher for MasterPublisher<S> {
    fn name(&self) -> &'static str {
        "master"
    }

    fn publish(&mut self, report: &ReportSet, sources: &[LoadReport]) -> Result<()> {
        upload(&mut self.sink, &report.presentation)?;
        let mut tables: Vec<&Table> = report.audit.iter().collect();
        tables.push(&report.presentation);
        self.archive.export(sources, &tables)?;
        info!("Archived {} tables to {}", tables.len(), self.archive.path().display());
        Ok(())
    }
}

fn render(header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    let mut table: TextTable = builder.build();
    table.with(Style::markdown()).to_string()
}

/// Markdown preview of the first `max_rows` rows, numbers to two decimals.
pub fn preview_table(table: &Table, max_rows: usize) -> String {
    if table.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(max_rows)
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    crate::reports::Cell::Number(n) => format_number(*n, 2),
                    other => other.display(),
                })
                .collect()
        })
        .collect();
    render(&table.header, &rows)
}

pub fn load_summary(reports: &[LoadReport]) -> String {
    TextTable::new(reports.iter().cloned()).with(Style::markdown()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{KpiInputs, TableSource};
    use crate::pipeline;
    use crate::reports::build_report_set;
    use crate::types::{LeadRecord, QualityMetrics};
    use std::fs;
    use tempfile::TempDir;

    fn report_set() -> ReportSet {
        let inputs = KpiInputs {
            leads: vec![LeadRecord {
                month: Some("January".into()),
                qai_id: Some("QAI_1".into()),
                lead: Some("Asha".into()),
                project: Some("Alpha".into()),
                metrics: QualityMetrics {
                    quality: 4.0,
                    ..QualityMetrics::default()
                },
            }],
            ..KpiInputs::default()
        };
        build_report_set(&pipeline::run(&inputs), "Lead_KPI_Report")
    }

    #[test]
    fn csv_sink_overwrites_existing_tab() {
        let dir = TempDir::new().expect("temp dir should be created");
        let mut book = CsvWorkbook::new(dir.path().join("report"));
        let set = report_set();
        book.write_table(&set.presentation).expect("first write should succeed");
        book.write_table(&set.presentation).expect("second write should succeed");
        let raw = book.read_table("Lead_KPI_Report").expect("tab should read back");
        assert_eq!(raw.rows.len(), 1);
        assert_eq!(raw.header, set.presentation.header);
    }

    #[test]
    fn audit_publisher_writes_six_tabs() {
        let dir = TempDir::new().expect("temp dir should be created");
        let mut publisher = AuditPublisher::new(CsvWorkbook::new(dir.path()));
        publisher.publish(&report_set(), &[]).expect("publish should succeed");
        let count = fs::read_dir(dir.path()).expect("dir should list").count();
        assert_eq!(count, 6);
        assert!(dir.path().join("06_Final_Report.csv").exists());
    }

    #[test]
    fn master_publisher_writes_tab_and_archive() {
        let dir = TempDir::new().expect("temp dir should be created");
        let archive = ArchiveSink::new(dir.path().join("archive"), "lead_kpi_log.json");
        let mut publisher = MasterPublisher::new(CsvWorkbook::new(dir.path().join("master")), archive);
        publisher.publish(&report_set(), &[]).expect("publish should succeed");

        assert!(dir.path().join("master/Lead_KPI_Report.csv").exists());
        let json = fs::read_to_string(dir.path().join("archive/lead_kpi_log.json"))
            .expect("archive should exist");
        let doc: serde_json::Value = serde_json::from_str(&json).expect("archive should parse");
        assert_eq!(doc["tables"].as_array().map(Vec::len), Some(7));
        assert!(doc["generated_at"].is_string());
    }

    #[test]
    fn unwritable_destination_names_the_table() {
        let dir = TempDir::new().expect("temp dir should be created");
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "not a directory").expect("blocker should write");
        let mut book = CsvWorkbook::new(&blocker);
        let err = book
            .write_table(&report_set().presentation)
            .expect_err("write should fail");
        assert!(err.to_string().contains("Lead_KPI_Report"));
    }

    #[test]
    fn preview_formats_numbers() {
        let set = report_set();
        let text = preview_table(&set.presentation, 5);
        assert!(text.contains("QAI_1"));
        assert!(text.contains("0.80"));
    }
}
