use crate::aggregate::{attendance_aggregate, monthly_core, project_counts};
use crate::contribution::{join_project_hours, lead_contributions};
use crate::loader::KpiInputs;
use crate::merge::merge;
use crate::scoring::score_all;
use crate::types::{
    AttendanceAggregate, LeadContribution, LeadWithHours, MergedRecord, MonthlyCore, ScoredRecord,
};
use tracing::debug;

/// Every intermediate table of one run, kept for the audit snapshot.
#[derive(Debug, Clone)]
pub struct KpiRun {
    pub monthly_core: Vec<MonthlyCore>,
    pub lead_with_hours: Vec<LeadWithHours>,
    pub contributions: Vec<LeadContribution>,
    pub attendance: Vec<AttendanceAggregate>,
    pub merged: Vec<MergedRecord>,
    pub scored: Vec<ScoredRecord>,
}

/// Recompute everything from the inputs. Pure and deterministic.
pub fn run(inputs: &KpiInputs) -> KpiRun {
    let monthly_core = monthly_core(&inputs.leads);
    let project_counts = project_counts(&inputs.leads);
    let lead_with_hours = join_project_hours(&inputs.leads, &inputs.project_hours);
    let contributions = lead_contributions(&lead_with_hours);
    let attendance = attendance_aggregate(&inputs.attendance);
    debug!(
        "{} core groups, {} joined rows, {} attendance groups",
        monthly_core.len(),
        lead_with_hours.len(),
        attendance.len()
    );

    let merged = merge(&monthly_core, &contributions, &attendance, &project_counts);
    let scored = score_all(merged.clone());
    KpiRun {
        monthly_core,
        lead_with_hours,
        contributions,
        attendance,
        merged,
        scored,
    }
}
