use crate::types::{GroupKey, LeadContribution, LeadRecord, LeadWithHours, ProjectHourRecord};
use crate::util::{fill_zero, round2};
use std::collections::{BTreeMap, HashMap};

/// Left join of lead rows onto project hours by project name.
///
/// Every lead row survives. A row whose project is unknown (or blank) gets
/// zero PDR and hours; a project listed more than once yields one joined row
/// per listing.
pub fn join_project_hours(
    leads: &[LeadRecord],
    hours: &[ProjectHourRecord],
) -> Vec<LeadWithHours> {
    let mut index: HashMap<&str, Vec<&ProjectHourRecord>> = HashMap::new();
    for h in hours {
        if let Some(p) = h.project.as_deref() {
            index.entry(p).or_default().push(h);
        }
    }

    let mut out = Vec::with_capacity(leads.len());
    for r in leads {
        let matches = r.project.as_deref().and_then(|p| index.get(p));
        match matches {
            Some(found) => {
                for h in found {
                    out.push(LeadWithHours {
                        record: r.clone(),
                        pdr: h.pdr,
                        hours: h.hours,
                        weighted: h.pdr * h.hours,
                    });
                }
            }
            None => out.push(LeadWithHours {
                record: r.clone(),
                pdr: 0.0,
                hours: 0.0,
                weighted: 0.0,
            }),
        }
    }
    out
}

/// Contribution share in percent, rounded to two places. A zero monthly total
/// gives 0.
pub fn contribution_pct(lead: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    fill_zero(round2(lead / total * 100.0))
}

/// Step function over the contribution share; bounds are inclusive.
pub fn contribution_rating(pct: f64) -> u8 {
    match pct {
        p if p >= 20.0 => 5,
        p if p >= 16.0 => 4,
        p if p >= 11.0 => 3,
        p if p >= 5.0 => 2,
        _ => 1,
    }
}

/// Sum weighted contribution per (Month, QAI_ID), then rate each person
/// against the month total.
pub fn lead_contributions(joined: &[LeadWithHours]) -> Vec<LeadContribution> {
    let mut per_lead: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for row in joined {
        let Some(key) = row.record.key() else { continue };
        *per_lead.entry(key).or_insert(0.0) += row.weighted;
    }

    let mut per_month: HashMap<&str, f64> = HashMap::new();
    for ((month, _), value) in &per_lead {
        *per_month.entry(month.as_str()).or_insert(0.0) += *value;
    }

    per_lead
        .iter()
        .map(|((month, qai_id), &lead_contribution)| {
            let total = per_month.get(month.as_str()).copied().unwrap_or(0.0);
            let pct = contribution_pct(lead_contribution, total);
            LeadContribution {
                month: month.clone(),
                qai_id: qai_id.clone(),
                lead_contribution,
                total_month_contribution: total,
                contribution_pct: pct,
                rating: contribution_rating(pct),
            }
        })
        .collect()
}
