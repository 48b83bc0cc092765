use crate::types::{
    AttendanceAggregate, AttendanceRecord, GroupKey, LeadRecord, MonthlyCore, ProjectCount,
    QualityMetrics,
};
use crate::util::average;
use std::collections::{BTreeMap, BTreeSet};

/// Per-(Month, QAI_ID) metric means, first lead name and project list.
///
/// Rows without a month or id never form a group. Output is ordered by key.
pub fn monthly_core(leads: &[LeadRecord]) -> Vec<MonthlyCore> {
    #[derive(Default)]
    struct Acc {
        metrics: Vec<QualityMetrics>,
        lead: Option<String>,
        projects: BTreeSet<String>,
    }

    let mut map: BTreeMap<GroupKey, Acc> = BTreeMap::new();
    for r in leads {
        let Some(key) = r.key() else { continue };
        let e = map.entry(key).or_default();
        e.metrics.push(r.metrics);
        if e.lead.is_none() {
            e.lead = r.lead.clone();
        }
        if let Some(p) = &r.project {
            e.projects.insert(p.clone());
        }
    }
    map.into_iter()
        .map(|((month, qai_id), acc)| MonthlyCore {
            month,
            qai_id,
            metrics: QualityMetrics::mean(&acc.metrics),
            lead: acc.lead,
            projects: acc.projects.into_iter().collect::<Vec<_>>().join(", "),
        })
        .collect()
}

pub fn project_counts(leads: &[LeadRecord]) -> Vec<ProjectCount> {
    let mut map: BTreeMap<GroupKey, BTreeSet<&str>> = BTreeMap::new();
    for r in leads {
        let Some(key) = r.key() else { continue };
        let e = map.entry(key).or_default();
        if let Some(p) = r.project.as_deref() {
            e.insert(p);
        }
    }
    map.into_iter()
        .map(|((month, qai_id), projects)| ProjectCount {
            month,
            qai_id,
            count: projects.len(),
        })
        .collect()
}

pub fn attendance_aggregate(records: &[AttendanceRecord]) -> Vec<AttendanceAggregate> {
    #[derive(Default)]
    struct Acc {
        attendance: Vec<f64>,
        training: Vec<f64>,
    }

    let mut map: BTreeMap<GroupKey, Acc> = BTreeMap::new();
    for r in records {
        let Some(key) = r.key() else { continue };
        let e = map.entry(key).or_default();
        e.attendance.push(r.attendance);
        e.training.push(r.training);
    }
    map.into_iter()
        .map(|((month, qai_id), acc)| AttendanceAggregate {
            month,
            qai_id,
            attendance: average(&acc.attendance),
            training: average(&acc.training),
        })
        .collect()
}
