//! Activity windows and beneficiary eligibility.
//!
//! Balances, analytics and explanations all resolve "who shares this expense"
//! through [`Roster::eligible_beneficiaries`], so the three views can never
//! disagree about a split.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::schemas::{Expense, Participant};

/// A participant is active on `date` when `start <= date` and, if the
/// participant has left, `date <= end`. Both bounds are inclusive.
pub fn is_active(start: &str, end: Option<&str>, date: &str) -> bool {
    if date < start {
        return false;
    }
    match end {
        Some(end) => date <= end,
        None => true,
    }
}

pub fn active_participants<'a>(participants: &'a [Participant], date: &str) -> Vec<&'a Participant> {
    participants.iter().filter(|p| p.is_active_on(date)).collect()
}

/// Participants of one snapshot indexed by id.
#[derive(Debug)]
pub struct Roster<'a> {
    by_id: BTreeMap<&'a str, &'a Participant>,
}

impl<'a> Roster<'a> {
    pub fn new(participants: &'a [Participant]) -> Self {
        let by_id = participants
            .iter()
            .map(|p| (p.participant_id.as_str(), p))
            .collect();
        Roster { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a Participant> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Beneficiaries of `expense` that exist in the roster and are active on
    /// the expense date, in listing order. Repeated ids count once.
    pub fn eligible_beneficiaries<'e>(&self, expense: &'e Expense) -> Vec<&'e str> {
        let mut seen = HashSet::new();
        let mut eligible = Vec::with_capacity(expense.beneficiaries.len());

        for beneficiary in &expense.beneficiaries {
            let beneficiary = beneficiary.as_str();
            if !seen.insert(beneficiary) {
                warn!(
                    expense = %expense.expense_id,
                    beneficiary,
                    "duplicate beneficiary counted once"
                );
                continue;
            }
            let Some(participant) = self.get(beneficiary) else {
                warn!(
                    expense = %expense.expense_id,
                    beneficiary,
                    "unknown beneficiary excluded from split"
                );
                continue;
            };
            if participant.is_active_on(&expense.date) {
                eligible.push(beneficiary);
            }
        }

        eligible
    }

    /// Whether `participant_id` takes part in the split of `expense`.
    pub fn is_eligible(&self, participant_id: &str, expense: &Expense) -> bool {
        expense.beneficiaries.iter().any(|b| b == participant_id)
            && self
                .get(participant_id)
                .is_some_and(|p| p.is_active_on(&expense.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Category;
    use rust_decimal_macros::dec;

    fn participant(id: &str, start: &str, end: Option<&str>) -> Participant {
        Participant {
            participant_id: id.to_string(),
            name: id.to_string(),
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
            group_id: None,
        }
    }

    fn expense(beneficiaries: &[&str], date: &str) -> Expense {
        Expense {
            expense_id: "E001".to_string(),
            payer_id: "A".to_string(),
            amount: dec!(30),
            category: Category::Food,
            beneficiaries: beneficiaries.iter().map(|b| b.to_string()).collect(),
            date: date.to_string(),
            note: None,
        }
    }

    #[test]
    fn start_date_is_inclusive() {
        assert!(is_active("2024-06-03", None, "2024-06-03"));
        assert!(!is_active("2024-06-03", None, "2024-06-02"));
    }

    #[test]
    fn end_date_is_inclusive() {
        assert!(is_active("2024-06-01", Some("2024-06-10"), "2024-06-10"));
        assert!(!is_active("2024-06-01", Some("2024-06-10"), "2024-06-11"));
    }

    #[test]
    fn open_ended_participant_stays_active() {
        assert!(is_active("2024-06-01", None, "2030-01-01"));
    }

    #[test]
    fn filters_active_participants() {
        let participants = vec![
            participant("A", "2024-06-01", None),
            participant("B", "2024-06-05", None),
            participant("C", "2024-06-01", Some("2024-06-02")),
        ];
        let active: Vec<_> = active_participants(&participants, "2024-06-03")
            .into_iter()
            .map(|p| p.participant_id.as_str())
            .collect();
        assert_eq!(active, vec!["A"]);
    }

    #[test]
    fn excludes_inactive_and_unknown_beneficiaries() {
        let participants = vec![
            participant("A", "2024-06-01", None),
            participant("B", "2024-06-05", None),
            participant("C", "2024-06-01", Some("2024-06-02")),
        ];
        let roster = Roster::new(&participants);
        let expense = expense(&["A", "B", "C", "ghost"], "2024-06-03");

        assert_eq!(roster.eligible_beneficiaries(&expense), vec!["A"]);
        assert!(roster.is_eligible("A", &expense));
        assert!(!roster.is_eligible("B", &expense));
        assert!(!roster.is_eligible("ghost", &expense));
    }

    #[test]
    fn duplicate_beneficiaries_count_once() {
        let participants = vec![
            participant("A", "2024-06-01", None),
            participant("B", "2024-06-01", None),
        ];
        let roster = Roster::new(&participants);
        let expense = expense(&["A", "B", "A"], "2024-06-03");

        assert_eq!(roster.eligible_beneficiaries(&expense), vec!["A", "B"]);
    }

    #[test]
    fn everyone_inactive_yields_empty_set() {
        let participants = vec![participant("A", "2024-06-05", None)];
        let roster = Roster::new(&participants);
        assert!(roster
            .eligible_beneficiaries(&expense(&["A"], "2024-06-01"))
            .is_empty());
    }
}
