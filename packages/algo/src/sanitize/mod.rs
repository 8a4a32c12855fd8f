//! Data Sanitization
//!
//! Numerical stability utilities.
//!
//! Functions:
//! - Rate clamping
//! - Mastery state health diagnostics

use serde::{Deserialize, Serialize};

use crate::types::{MasteryState, TopicId};

/// Tolerance when comparing a stored rate with its implied integer count
pub const RATE_EPSILON: f64 = 1e-9;

/// 检查数值是否无效 (NaN 或 Inf)
pub fn is_invalid(value: f64) -> bool {
    value.is_nan() || value.is_infinite()
}

/// 将比率限制在 [0, 1]，无效值归零
pub fn sanitize_rate(rate: f64) -> f64 {
    if is_invalid(rate) {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}

/// Mastery state health report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryDiagnostics {
    pub is_healthy: bool,
    /// Rates that are NaN, infinite or outside [0, 1]
    pub out_of_range: Vec<TopicId>,
    /// Rates that do not correspond to a whole number of correct answers
    pub fractional_counts: Vec<TopicId>,
    /// Records with zero attempts
    pub empty_records: Vec<TopicId>,
}

/// 诊断掌握度状态
///
/// Stored state should always come out healthy; anything else means a record
/// was edited outside the aggregator.
pub fn diagnose_mastery(state: &MasteryState) -> MasteryDiagnostics {
    let mut report = MasteryDiagnostics::default();

    for record in state {
        if is_invalid(record.correct_rate) || !(0.0..=1.0).contains(&record.correct_rate) {
            report.out_of_range.push(record.topic_id.clone());
            continue;
        }
        if record.attempts == 0 {
            report.empty_records.push(record.topic_id.clone());
            continue;
        }
        let implied = record.correct_rate * f64::from(record.attempts);
        if (implied - implied.round()).abs() > RATE_EPSILON * f64::from(record.attempts).max(1.0) {
            report.fractional_counts.push(record.topic_id.clone());
        }
    }

    report.is_healthy = report.out_of_range.is_empty()
        && report.fractional_counts.is_empty()
        && report.empty_records.is_empty();
    report
}
