use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::eligibility::Roster;
use crate::money::{format_currency, round_cents, DEFAULT_CURRENCY_SYMBOL};
use crate::schemas::{Category, Expense, IsoDate, Participant, ParticipantId};

const PAYER_PERCENT_LIMIT: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
const CATEGORY_PERCENT_LIMIT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const DAILY_SPIKE_FACTOR: Decimal = Decimal::from_parts(2, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HighestSpendingDay {
    pub date: Option<IsoDate>,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Analytics {
    pub total_spent: Decimal,
    pub category_breakdown: BTreeMap<Category, Decimal>,
    pub daily_spending: BTreeMap<IsoDate, Decimal>,
    pub highest_spending_day: HighestSpendingDay,
    pub payer_totals: BTreeMap<ParticipantId, Decimal>,
}

/// Spending pattern flagged by [`generate_analytics`]. Percentages are
/// rounded for display; the thresholds are checked on exact values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    PayerConcentration {
        participant_id: ParticipantId,
        name: String,
        percent: Decimal,
        amount: Decimal,
        total: Decimal,
    },
    CategoryConcentration {
        category: Category,
        percent: Decimal,
        amount: Decimal,
        total: Decimal,
    },
    DailySpike {
        date: IsoDate,
        amount: Decimal,
        average: Decimal,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let money = |amount: &Decimal| format_currency(*amount, DEFAULT_CURRENCY_SYMBOL);
        match self {
            Warning::PayerConcentration {
                name,
                percent,
                amount,
                total,
                ..
            } => write!(
                f,
                "Warning: {name} paid {percent:.2}% of total expenses ({} of {})",
                money(amount),
                money(total)
            ),
            Warning::CategoryConcentration {
                category,
                percent,
                amount,
                total,
            } => write!(
                f,
                "Warning: '{category}' accounts for {percent:.2}% of total spend ({} of {})",
                money(amount),
                money(total)
            ),
            Warning::DailySpike {
                date,
                amount,
                average,
            } => write!(
                f,
                "Warning: Spending on {date} ({}) exceeds 2x average daily spend ({})",
                money(amount),
                money(average)
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalyticsReport {
    pub analytics: Analytics,
    pub warnings: Vec<Warning>,
}

#[derive(Default)]
struct Sums {
    total: Decimal,
    /// Sum of absolute amounts; bounds every other sum.
    magnitude: Decimal,
    by_category: BTreeMap<Category, Decimal>,
    by_day: BTreeMap<IsoDate, Decimal>,
    by_payer: BTreeMap<ParticipantId, Decimal>,
}

impl Sums {
    fn add(&mut self, expense: &Expense, roster: &Roster<'_>) {
        let Some(magnitude) = self.magnitude.checked_add(expense.amount.abs()) else {
            warn!(
                expense = %expense.expense_id,
                amount = %expense.amount,
                "amount overflows spending totals, expense skipped"
            );
            return;
        };
        self.magnitude = magnitude;
        self.total += expense.amount;
        *self.by_category.entry(expense.category).or_default() += expense.amount;
        *self.by_day.entry(expense.date.clone()).or_default() += expense.amount;
        if roster.contains(&expense.payer_id) {
            *self.by_payer.entry(expense.payer_id.clone()).or_default() += expense.amount;
        } else {
            warn!(
                expense = %expense.expense_id,
                payer = %expense.payer_id,
                "unknown payer left out of payer totals"
            );
        }
    }
}

fn rounded<K: Ord + Clone>(sums: &BTreeMap<K, Decimal>) -> BTreeMap<K, Decimal> {
    sums.iter()
        .map(|(key, amount)| (key.clone(), round_cents(*amount)))
        .collect()
}

/// `amount` as a percentage of `total`, or `None` when it does not fit.
fn percent_of(amount: Decimal, total: Decimal) -> Option<Decimal> {
    amount.checked_div(total)?.checked_mul(HUNDRED)
}

/// Category, daily and payer totals plus rule-based warnings.
///
/// Category and daily totals cover every expense regardless of who shared it.
/// Payer totals only cover known participants, matching the `total_paid`
/// figures of [`crate::balance::compute_balances`].
pub fn generate_analytics(participants: &[Participant], expenses: &[Expense]) -> AnalyticsReport {
    let roster = Roster::new(participants);
    let mut sums = Sums::default();
    for expense in expenses {
        sums.add(expense, &roster);
    }

    let mut highest_spending_day = HighestSpendingDay::default();
    for (date, amount) in &sums.by_day {
        if highest_spending_day.date.is_none() || *amount > highest_spending_day.amount {
            highest_spending_day = HighestSpendingDay {
                date: Some(date.clone()),
                amount: *amount,
            };
        }
    }
    highest_spending_day.amount = round_cents(highest_spending_day.amount);

    let warnings = warnings(&sums, &roster);
    let analytics = Analytics {
        total_spent: round_cents(sums.total),
        category_breakdown: rounded(&sums.by_category),
        daily_spending: rounded(&sums.by_day),
        highest_spending_day,
        payer_totals: rounded(&sums.by_payer),
    };

    AnalyticsReport {
        analytics,
        warnings,
    }
}

fn warnings(sums: &Sums, roster: &Roster<'_>) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let total = sums.total;
    if total <= Decimal::ZERO {
        return warnings;
    }

    for (participant_id, amount) in &sums.by_payer {
        let Some(percent) = percent_of(*amount, total) else {
            continue;
        };
        if percent > PAYER_PERCENT_LIMIT {
            let name = roster
                .get(participant_id)
                .map(|p| p.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or(participant_id.as_str());
            warnings.push(Warning::PayerConcentration {
                participant_id: participant_id.clone(),
                name: name.to_string(),
                percent: round_cents(percent),
                amount: round_cents(*amount),
                total: round_cents(total),
            });
        }
    }

    for (category, amount) in &sums.by_category {
        let Some(percent) = percent_of(*amount, total) else {
            continue;
        };
        if percent > CATEGORY_PERCENT_LIMIT {
            warnings.push(Warning::CategoryConcentration {
                category: *category,
                percent: round_cents(percent),
                amount: round_cents(*amount),
                total: round_cents(total),
            });
        }
    }

    if sums.by_day.len() >= 2 {
        let average = total / Decimal::from(sums.by_day.len());
        let threshold = average * DAILY_SPIKE_FACTOR;
        for (date, amount) in &sums.by_day {
            if *amount > threshold {
                warnings.push(Warning::DailySpike {
                    date: date.clone(),
                    amount: round_cents(*amount),
                    average: round_cents(average),
                });
            }
        }
    }

    warnings
}
