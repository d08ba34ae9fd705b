use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::eligibility::Roster;
use crate::money::round_cents;
use crate::schemas::{Expense, Participant, ParticipantId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Balance {
    pub total_paid: Decimal,
    pub total_share: Decimal,
    /// Positive when the participant is owed money, negative when they owe.
    pub net_balance: Decimal,
}

pub type Balances = BTreeMap<ParticipantId, Balance>;

#[derive(Default)]
struct Totals {
    paid: Decimal,
    /// Amounts this participant shares in, keyed by how many shared them.
    /// Dividing once per key keeps the result independent of expense order.
    shared_by_count: BTreeMap<usize, Decimal>,
    /// Sum of the absolute amounts paid and shared. Every figure derived from
    /// this participant is bounded by it, so it is the only sum checked for
    /// overflow.
    magnitude: Decimal,
}

impl Totals {
    fn share(&self) -> Decimal {
        self.shared_by_count
            .iter()
            .map(|(count, amount)| *amount / Decimal::from(*count))
            .sum()
    }
}

/// Adds `|amount|` to the magnitude of every involved participant, once per
/// appearance. Returns false and leaves `totals` untouched when any of them
/// would overflow.
fn reserve(totals: &mut BTreeMap<&str, Totals>, involved: &[&str], amount: Decimal) -> bool {
    let mut grown: BTreeMap<&str, Decimal> = BTreeMap::new();
    for &id in involved {
        let Some(current) = totals.get(id) else {
            continue;
        };
        let base = grown.get(id).copied().unwrap_or(current.magnitude);
        match base.checked_add(amount.abs()) {
            Some(next) => {
                grown.insert(id, next);
            }
            None => return false,
        }
    }
    for (id, magnitude) in grown {
        if let Some(entry) = totals.get_mut(id) {
            entry.magnitude = magnitude;
        }
    }
    true
}

/// Per-participant paid/share/net totals for a snapshot.
///
/// Every participant appears in the result, even without expenses. Totals are
/// accumulated unrounded and rounded to cents once at the end; the net is the
/// difference of the two rounded figures. An expense that would overflow a
/// participant's running totals is skipped with a warning.
pub fn compute_balances(participants: &[Participant], expenses: &[Expense]) -> Balances {
    let roster = Roster::new(participants);
    let mut totals: BTreeMap<&str, Totals> = participants
        .iter()
        .map(|p| (p.participant_id.as_str(), Totals::default()))
        .collect();

    for expense in expenses {
        let payer_known = totals.contains_key(expense.payer_id.as_str());
        if !payer_known {
            warn!(
                expense = %expense.expense_id,
                payer = %expense.payer_id,
                "unknown payer, amount not credited"
            );
        }
        let eligible = roster.eligible_beneficiaries(expense);

        let mut involved: Vec<&str> = eligible.clone();
        if payer_known {
            involved.push(expense.payer_id.as_str());
        }
        if !reserve(&mut totals, &involved, expense.amount) {
            warn!(
                expense = %expense.expense_id,
                amount = %expense.amount,
                "amount overflows running totals, expense skipped"
            );
            continue;
        }

        if let Some(payer) = totals.get_mut(expense.payer_id.as_str()) {
            payer.paid += expense.amount;
        }
        if eligible.is_empty() {
            debug!(
                expense = %expense.expense_id,
                date = %expense.date,
                "no eligible beneficiaries, amount left unassigned"
            );
            continue;
        }

        let count = eligible.len();
        for beneficiary in eligible {
            if let Some(entry) = totals.get_mut(beneficiary) {
                *entry.shared_by_count.entry(count).or_default() += expense.amount;
            }
        }
    }

    totals
        .into_iter()
        .map(|(id, totals)| {
            let total_paid = round_cents(totals.paid);
            let total_share = round_cents(totals.share());
            let balance = Balance {
                total_paid,
                total_share,
                net_balance: round_cents(total_paid - total_share),
            };
            (id.to_string(), balance)
        })
        .collect()
}
