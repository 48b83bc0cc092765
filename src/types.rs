use serde::Serialize;
use tabled::Tabled;

use crate::util::average;

/// `(Month, QAI_ID)` compound grouping key, both already normalized.
pub type GroupKey = (String, String);

/// The five evaluation metrics carried by every lead row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityMetrics {
    pub quality: f64,
    pub timeliness: f64,
    pub documentation: f64,
    pub communication: f64,
    pub discipline: f64,
}

impl QualityMetrics {
    /// Field-wise arithmetic mean.
    pub fn mean(items: &[QualityMetrics]) -> QualityMetrics {
        let col = |f: fn(&QualityMetrics) -> f64| average(&items.iter().map(f).collect::<Vec<_>>());
        QualityMetrics {
            quality: col(|m| m.quality),
            timeliness: col(|m| m.timeliness),
            documentation: col(|m| m.documentation),
            communication: col(|m| m.communication),
            discipline: col(|m| m.discipline),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadRecord {
    pub month: Option<String>,
    pub qai_id: Option<String>,
    pub lead: Option<String>,
    pub project: Option<String>,
    pub metrics: QualityMetrics,
}

impl LeadRecord {
    pub fn key(&self) -> Option<GroupKey> {
        Some((self.month.clone()?, self.qai_id.clone()?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub month: Option<String>,
    pub qai_id: Option<String>,
    pub attendance: f64,
    pub training: f64,
}

impl AttendanceRecord {
    pub fn key(&self) -> Option<GroupKey> {
        Some((self.month.clone()?, self.qai_id.clone()?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHourRecord {
    pub project: Option<String>,
    pub pdr: f64,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCore {
    pub month: String,
    pub qai_id: String,
    pub metrics: QualityMetrics,
    /// First non-blank lead name encountered in source row order. Blank
    /// cells are absent, never an empty name.
    pub lead: Option<String>,
    /// Distinct project names, sorted, joined with `", "`.
    pub projects: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCount {
    pub month: String,
    pub qai_id: String,
    pub count: usize,
}

/// One lead row after the left join against project hours.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadWithHours {
    pub record: LeadRecord,
    pub pdr: f64,
    pub hours: f64,
    pub weighted: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadContribution {
    pub month: String,
    pub qai_id: String,
    pub lead_contribution: f64,
    pub total_month_contribution: f64,
    pub contribution_pct: f64,
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceAggregate {
    pub month: String,
    pub qai_id: String,
    pub attendance: f64,
    pub training: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub core: MonthlyCore,
    pub lead_contribution: f64,
    pub total_month_contribution: f64,
    pub contribution_pct: f64,
    pub rating: u8,
    pub attendance: f64,
    pub training: f64,
    pub project_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubScores {
    pub quality: f64,
    pub timeliness: f64,
    pub documentation: f64,
    pub communication: f64,
    pub discipline: f64,
    pub contribution: f64,
    pub attendance: f64,
    pub training: f64,
}

impl SubScores {
    pub fn as_array(&self) -> [f64; 8] {
        [
            self.quality,
            self.timeliness,
            self.documentation,
            self.communication,
            self.discipline,
            self.contribution,
            self.attendance,
            self.training,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub merged: MergedRecord,
    pub scores: SubScores,
    pub final_score: f64,
}

/// Per-source ingestion diagnostics, printed by `check` and archived.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LoadReport {
    #[serde(rename = "Source")]
    #[tabled(rename = "Source")]
    pub source: String,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub total_rows: usize,
    #[serde(rename = "Keyed")]
    #[tabled(rename = "Keyed")]
    pub keyed_rows: usize,
    #[serde(rename = "Skipped")]
    #[tabled(rename = "Skipped")]
    pub skipped_rows: usize,
    #[serde(rename = "MissingColumns")]
    #[tabled(rename = "MissingColumns")]
    pub missing_columns: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_mean_is_field_wise() {
        let a = QualityMetrics {
            quality: 1.0,
            timeliness: 0.0,
            documentation: 0.5,
            communication: 1.0,
            discipline: 0.2,
        };
        let b = QualityMetrics {
            quality: 0.0,
            timeliness: 1.0,
            documentation: 0.5,
            communication: 0.0,
            discipline: 0.4,
        };
        let m = QualityMetrics::mean(&[a, b]);
        assert_eq!(m.quality, 0.5);
        assert_eq!(m.timeliness, 0.5);
        assert_eq!(m.documentation, 0.5);
        assert!((m.discipline - 0.3).abs() < 1e-12);
    }

    #[test]
    fn key_requires_month_and_id() {
        let mut rec = LeadRecord {
            month: Some("January".into()),
            qai_id: None,
            lead: None,
            project: None,
            metrics: QualityMetrics::default(),
        };
        assert_eq!(rec.key(), None);
        rec.qai_id = Some("QAI_1".into());
        assert_eq!(rec.key(), Some(("January".into(), "QAI_1".into())));
    }
}
