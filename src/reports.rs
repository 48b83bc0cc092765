// Report formatting: typed pipeline output to named header + rows tables.
use crate::loader::columns::*;
use crate::pipeline::KpiRun;
use crate::scoring::{COMPONENTS, FINAL_SCORE_KEY, FINAL_SCORE_LABEL};
use crate::types::{MergedRecord, MonthlyCore, QualityMetrics};
use serde::{Serialize, Serializer};

pub const TAB_MONTHLY_CORE: &str = "01_Monthly_Core";
pub const TAB_LEAD_WITH_HOURS: &str = "02_Lead_With_Hours";
pub const TAB_LEAD_CONTRIBUTION: &str = "03_Lead_Contribution";
pub const TAB_ATTENDANCE_AGGREGATE: &str = "04_Attendance_Aggregate";
pub const TAB_MERGED: &str = "05_Merged_Before_Scoring";
pub const TAB_FINAL_REPORT: &str = "06_Final_Report";

const LEAD_CONTRIBUTION: &str = "Lead_Contribution";
const TOTAL_MONTH_CONTRIBUTION: &str = "Total_Month_Contribution";
const CONTRIBUTION_PCT: &str = "Contribution_%";
const CONTRIBUTION_RATING: &str = "Contribution_Rating";
const PROJECT_COUNT: &str = "Project Count";
const WEIGHTED_CONTRIBUTION: &str = "Weighted_Contribution";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Int(i64),
    Empty,
}

impl Cell {
    /// Display-safe rendering: absent and non-finite values are blank.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(t) => t.clone(),
            Cell::Number(n) if n.is_finite() => n.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Number(_) | Cell::Empty => String::new(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Number(n) if n.is_finite() => s.serialize_f64(*n),
            Cell::Int(i) => s.serialize_i64(*i),
            other => s.serialize_str(&other.display()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<usize> for Cell {
    fn from(v: usize) -> Self {
        Cell::Int(v as i64)
    }
}

impl From<u8> for Cell {
    fn from(v: u8) -> Self {
        Cell::Int(i64::from(v))
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<Option<&str>> for Cell {
    fn from(v: Option<&str>) -> Self {
        v.map_or(Cell::Empty, Cell::from)
    }
}

/// A named table: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn new(name: &str, header: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Cell::display).collect())
            .collect()
    }
}

/// Everything a publisher may need from one run.
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub audit: Vec<Table>,
    pub presentation: Table,
}

const METRIC_HEADERS: [&str; 5] = [QUALITY, TIMELINESS, DOCUMENTATION, COMMUNICATION, DISCIPLINE];

fn metric_cells(m: &QualityMetrics) -> Vec<Cell> {
    [m.quality, m.timeliness, m.documentation, m.communication, m.discipline]
        .into_iter()
        .map(Cell::from)
        .collect()
}

fn core_cells(c: &MonthlyCore) -> Vec<Cell> {
    let mut row = vec![Cell::from(c.month.as_str()), Cell::from(c.qai_id.as_str())];
    row.extend(metric_cells(&c.metrics));
    row.push(Cell::from(c.lead.as_deref()));
    row.push(Cell::from(c.projects.as_str()));
    row
}

fn core_header() -> Vec<&'static str> {
    let mut h = vec![MONTH, QAI_ID];
    h.extend(METRIC_HEADERS);
    h.extend([LEAD, PROJECT]);
    h
}

fn merged_header() -> Vec<&'static str> {
    let mut h = core_header();
    h.extend([
        LEAD_CONTRIBUTION,
        TOTAL_MONTH_CONTRIBUTION,
        CONTRIBUTION_PCT,
        CONTRIBUTION_RATING,
        ATTENDANCE,
        TRAINING,
        PROJECT_COUNT,
    ]);
    h
}

fn merged_cells(m: &MergedRecord) -> Vec<Cell> {
    let mut row = core_cells(&m.core);
    row.extend([
        Cell::from(m.lead_contribution),
        Cell::from(m.total_month_contribution),
        Cell::from(m.contribution_pct),
        Cell::from(m.rating),
        Cell::from(m.attendance),
        Cell::from(m.training),
        Cell::from(m.project_count),
    ]);
    row
}

fn monthly_core_table(run: &KpiRun) -> Table {
    let mut t = Table::new(TAB_MONTHLY_CORE, &core_header());
    t.rows = run.monthly_core.iter().map(core_cells).collect();
    t
}

fn lead_with_hours_table(run: &KpiRun) -> Table {
    let mut header = vec![MONTH, QAI_ID, LEAD, PROJECT];
    header.extend(METRIC_HEADERS);
    header.extend([PDR, PROJECT_HOUR, WEIGHTED_CONTRIBUTION]);
    let mut t = Table::new(TAB_LEAD_WITH_HOURS, &header);
    t.rows = run
        .lead_with_hours
        .iter()
        .map(|j| {
            let r = &j.record;
            let mut row = vec![
                Cell::from(r.month.as_deref()),
                Cell::from(r.qai_id.as_deref()),
                Cell::from(r.lead.as_deref()),
                Cell::from(r.project.as_deref()),
            ];
            row.extend(metric_cells(&r.metrics));
            row.extend([Cell::from(j.pdr), Cell::from(j.hours), Cell::from(j.weighted)]);
            row
        })
        .collect();
    t
}

fn lead_contribution_table(run: &KpiRun) -> Table {
    let mut t = Table::new(
        TAB_LEAD_CONTRIBUTION,
        &[
            MONTH,
            QAI_ID,
            LEAD_CONTRIBUTION,
            TOTAL_MONTH_CONTRIBUTION,
            CONTRIBUTION_PCT,
            CONTRIBUTION_RATING,
        ],
    );
    t.rows = run
        .contributions
        .iter()
        .map(|c| {
            vec![
                Cell::from(c.month.as_str()),
                Cell::from(c.qai_id.as_str()),
                Cell::from(c.lead_contribution),
                Cell::from(c.total_month_contribution),
                Cell::from(c.contribution_pct),
                Cell::from(c.rating),
            ]
        })
        .collect();
    t
}

fn attendance_table(run: &KpiRun) -> Table {
    let mut t = Table::new(TAB_ATTENDANCE_AGGREGATE, &[MONTH, QAI_ID, ATTENDANCE, TRAINING]);
    t.rows = run
        .attendance
        .iter()
        .map(|a| {
            vec![
                Cell::from(a.month.as_str()),
                Cell::from(a.qai_id.as_str()),
                Cell::from(a.attendance),
                Cell::from(a.training),
            ]
        })
        .collect();
    t
}

fn merged_table(run: &KpiRun) -> Table {
    let mut t = Table::new(TAB_MERGED, &merged_header());
    t.rows = run.merged.iter().map(merged_cells).collect();
    t
}

fn final_report_table(run: &KpiRun) -> Table {
    let mut header = merged_header();
    header.extend(COMPONENTS.iter().map(|c| c.key));
    header.push(FINAL_SCORE_KEY);
    let mut t = Table::new(TAB_FINAL_REPORT, &header);
    t.rows = run
        .scored
        .iter()
        .map(|s| {
            let mut row = merged_cells(&s.merged);
            row.extend(s.scores.as_array().map(Cell::from));
            row.push(Cell::from(s.final_score));
            row
        })
        .collect();
    t
}

/// The six audit tabs, in publication order.
pub fn audit_tables(run: &KpiRun) -> Vec<Table> {
    vec![
        monthly_core_table(run),
        lead_with_hours_table(run),
        lead_contribution_table(run),
        attendance_table(run),
        merged_table(run),
        final_report_table(run),
    ]
}

/// Presentation variant of the final report: fixed columns, headers that
/// carry weight and ceiling.
pub fn presentation_table(run: &KpiRun, name: &str) -> Table {
    let mut header = vec![MONTH, QAI_ID, LEAD, PROJECT, PROJECT_COUNT, CONTRIBUTION_PCT, CONTRIBUTION_RATING];
    header.extend(COMPONENTS.iter().map(|c| c.label));
    header.push(FINAL_SCORE_LABEL);
    let mut t = Table::new(name, &header);
    t.rows = run
        .scored
        .iter()
        .map(|s| {
            let m = &s.merged;
            let mut row = vec![
                Cell::from(m.core.month.as_str()),
                Cell::from(m.core.qai_id.as_str()),
                Cell::from(m.core.lead.as_deref()),
                Cell::from(m.core.projects.as_str()),
                Cell::from(m.project_count),
                Cell::from(m.contribution_pct),
                Cell::from(m.rating),
            ];
            row.extend(s.scores.as_array().map(Cell::from));
            row.push(Cell::from(s.final_score));
            row
        })
        .collect();
    t
}

pub fn build_report_set(run: &KpiRun, presentation_name: &str) -> ReportSet {
    ReportSet {
        audit: audit_tables(run),
        presentation: presentation_table(run, presentation_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::KpiInputs;
    use crate::pipeline;
    use crate::types::{LeadRecord, QualityMetrics};

    fn sample_run() -> KpiRun {
        let lead = |id: Option<&str>, project: &str| LeadRecord {
            month: Some("January".into()),
            qai_id: id.map(str::to_string),
            lead: Some("Asha".into()),
            project: Some(project.into()),
            metrics: QualityMetrics::default(),
        };
        pipeline::run(&KpiInputs {
            leads: vec![lead(Some("QAI_1"), "Alpha"), lead(None, "Beta")],
            ..KpiInputs::default()
        })
    }

    #[test]
    fn display_hides_non_finite_and_absent() {
        assert_eq!(Cell::Number(f64::NAN).display(), "");
        assert_eq!(Cell::Number(f64::INFINITY).display(), "");
        assert_eq!(Cell::Empty.display(), "");
        assert_eq!(Cell::from(None::<&str>).display(), "");
        assert_eq!(Cell::Number(2.5).display(), "2.5");
        assert_eq!(Cell::Int(3).display(), "3");
    }

    #[test]
    fn serialized_cells_never_carry_nan() {
        let row = vec![Cell::Number(f64::NAN), Cell::Empty, Cell::Number(1.5), Cell::Int(2)];
        let json = serde_json::to_string(&row).expect("cells should serialize");
        assert_eq!(json, r#"["","",1.5,2]"#);
    }

    #[test]
    fn audit_set_has_six_named_tabs() {
        let tables = audit_tables(&sample_run());
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                TAB_MONTHLY_CORE,
                TAB_LEAD_WITH_HOURS,
                TAB_LEAD_CONTRIBUTION,
                TAB_ATTENDANCE_AGGREGATE,
                TAB_MERGED,
                TAB_FINAL_REPORT
            ]
        );
        for t in &tables {
            assert!(t.rows.iter().all(|r| r.len() == t.header.len()), "{} is ragged", t.name);
        }
    }

    #[test]
    fn lead_with_hours_keeps_rows_without_id() {
        let tables = audit_tables(&sample_run());
        assert_eq!(tables[1].rows.len(), 2);
        assert_eq!(tables[1].rows[1][1], Cell::Empty);
        assert_eq!(tables[0].rows.len(), 1);
    }

    #[test]
    fn presentation_headers_carry_weights() {
        let t = presentation_table(&sample_run(), "Lead_KPI_Report");
        assert_eq!(t.name, "Lead_KPI_Report");
        assert!(t.header.contains(&"Quality (20%, out of 1.00)".to_string()));
        assert_eq!(t.header.last().map(String::as_str), Some("Final KPI Score (out of 5)"));
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].len(), t.header.len());
    }
}
