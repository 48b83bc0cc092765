use crate::types::{MergedRecord, ScoredRecord, SubScores};
use crate::util::round2;

/// One weighted term of the final score.
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub key: &'static str,
    pub weight: f64,
    /// Presentation header: weight and the most the term can add.
    pub label: &'static str,
}

pub const COMPONENTS: [Component; 8] = [
    Component { key: "Score_Quality", weight: 0.20, label: "Quality (20%, out of 1.00)" },
    Component { key: "Score_Timeliness", weight: 0.10, label: "Timeliness (10%, out of 0.50)" },
    Component { key: "Score_Documentation", weight: 0.10, label: "Documentation (10%, out of 0.50)" },
    Component { key: "Score_Communication", weight: 0.10, label: "Communication (10%, out of 0.50)" },
    Component { key: "Score_Discipline", weight: 0.075, label: "Discipline (7.5%, out of 0.375)" },
    Component { key: "Score_Contribution", weight: 0.15, label: "Contribution (15%, out of 0.75)" },
    Component { key: "Score_Attendance", weight: 0.075, label: "Attendance (7.5%, out of 0.375)" },
    Component { key: "Score_Training", weight: 0.20, label: "Training (20%, out of 1.00)" },
];

pub const FINAL_SCORE_KEY: &str = "Final KPI Score";
pub const FINAL_SCORE_LABEL: &str = "Final KPI Score (out of 5)";

/// Raw component values in `COMPONENTS` order.
fn inputs(m: &MergedRecord) -> [f64; 8] {
    let q = &m.core.metrics;
    [
        q.quality,
        q.timeliness,
        q.documentation,
        q.communication,
        q.discipline,
        f64::from(m.rating),
        m.attendance,
        m.training,
    ]
}

pub fn sub_scores(m: &MergedRecord) -> SubScores {
    let values = inputs(m);
    let w = |i: usize| COMPONENTS[i].weight * values[i];
    SubScores {
        quality: w(0),
        timeliness: w(1),
        documentation: w(2),
        communication: w(3),
        discipline: w(4),
        contribution: w(5),
        attendance: w(6),
        training: w(7),
    }
}

/// Sum of the eight weighted terms, rounded to two places. Not clamped.
pub fn final_score(scores: &SubScores) -> f64 {
    round2(scores.as_array().iter().sum())
}

pub fn score_all(merged: Vec<MergedRecord>) -> Vec<ScoredRecord> {
    merged
        .into_iter()
        .map(|m| {
            let scores = sub_scores(&m);
            ScoredRecord {
                final_score: final_score(&scores),
                scores,
                merged: m,
            }
        })
        .collect()
}
