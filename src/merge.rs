use crate::types::{
    AttendanceAggregate, GroupKey, LeadContribution, MergedRecord, MonthlyCore, ProjectCount,
};
use std::collections::HashMap;

fn index_by_key<'a, T>(
    items: &'a [T],
    key: impl Fn(&T) -> GroupKey,
) -> HashMap<GroupKey, &'a T> {
    items.iter().map(|item| (key(item), item)).collect()
}

/// Left-anchored merge on (Month, QAI_ID).
///
/// Every core row yields exactly one merged row, in core order. Keys present
/// only in the other tables are dropped. A table that is empty contributes
/// zero to every row, and so does a key it does not cover.
pub fn merge(
    core: &[MonthlyCore],
    contributions: &[LeadContribution],
    attendance: &[AttendanceAggregate],
    counts: &[ProjectCount],
) -> Vec<MergedRecord> {
    let contrib = index_by_key(contributions, |c| (c.month.clone(), c.qai_id.clone()));
    let att = index_by_key(attendance, |a| (a.month.clone(), a.qai_id.clone()));
    let cnt = index_by_key(counts, |c| (c.month.clone(), c.qai_id.clone()));

    core.iter()
        .map(|c| {
            let key = (c.month.clone(), c.qai_id.clone());
            let lc = contrib.get(&key);
            let at = att.get(&key);
            MergedRecord {
                core: c.clone(),
                lead_contribution: lc.map_or(0.0, |l| l.lead_contribution),
                total_month_contribution: lc.map_or(0.0, |l| l.total_month_contribution),
                contribution_pct: lc.map_or(0.0, |l| l.contribution_pct),
                rating: lc.map_or(0, |l| l.rating),
                attendance: at.map_or(0.0, |a| a.attendance),
                training: at.map_or(0.0, |a| a.training),
                project_count: cnt.get(&key).map_or(0, |p| p.count),
            }
        })
        .collect()
}
