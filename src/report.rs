use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{generate_analytics, Analytics, Warning};
use crate::balance::{compute_balances, Balances};
use crate::explain::{explain_all, Explanation};
use crate::schemas::{Expense, Participant};
use crate::settlement::{optimize, Settlement};

/// Everything calculated for one trip snapshot.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TripReport {
    pub balances: Balances,
    pub settlements: Vec<Settlement>,
    pub analytics: Analytics,
    pub warnings: Vec<Warning>,
    pub explanations: Vec<Explanation>,
    pub calculated_at: DateTime<Utc>,
}

pub fn calculate(participants: &[Participant], expenses: &[Expense]) -> TripReport {
    let balances = compute_balances(participants, expenses);
    let settlements = optimize(&balances);
    let report = generate_analytics(participants, expenses);
    let explanations = explain_all(participants, expenses, &balances);

    debug!(
        participants = participants.len(),
        expenses = expenses.len(),
        settlements = settlements.len(),
        warnings = report.warnings.len(),
        "trip calculated"
    );

    TripReport {
        balances,
        settlements,
        analytics: report.analytics,
        warnings: report.warnings,
        explanations,
        calculated_at: Utc::now(),
    }
}
