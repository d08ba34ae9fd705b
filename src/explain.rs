use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::Balances;
use crate::eligibility::Roster;
use crate::money::round_cents;
use crate::schemas::{Category, Expense, ExpenseId, IsoDate, Participant, ParticipantId};

/// One expense a participant shares in, and how their part was derived.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contribution {
    pub expense_id: ExpenseId,
    pub category: Category,
    pub date: IsoDate,
    pub total_expense_amount: Decimal,
    pub beneficiaries: Vec<ParticipantId>,
    pub num_beneficiaries: usize,
    pub participant_share: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payment {
    pub expense_id: ExpenseId,
    pub category: Category,
    pub date: IsoDate,
    pub amount: Decimal,
}

/// Itemized trace behind one participant's balance. The totals are copied
/// from the balance map handed in, so the trace always agrees with the
/// figures the settlements were computed from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Explanation {
    pub participant_id: ParticipantId,
    pub expense_contributions: Vec<Contribution>,
    pub payments: Vec<Payment>,
    pub total_share: Decimal,
    pub total_paid: Decimal,
    pub net_balance: Decimal,
}

/// Explains `participant_id`'s share. Returns `None` for an id that is not
/// part of the roster.
pub fn explain(
    participant_id: &str,
    participants: &[Participant],
    expenses: &[Expense],
    balances: &Balances,
) -> Option<Explanation> {
    let roster = Roster::new(participants);
    explain_with(&roster, participant_id, expenses, balances)
}

/// Explanations for every participant, ordered by id.
pub fn explain_all(
    participants: &[Participant],
    expenses: &[Expense],
    balances: &Balances,
) -> Vec<Explanation> {
    let roster = Roster::new(participants);
    let mut explanations: Vec<_> = participants
        .iter()
        .filter_map(|p| explain_with(&roster, &p.participant_id, expenses, balances))
        .collect();
    explanations.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
    explanations
}

fn explain_with(
    roster: &Roster<'_>,
    participant_id: &str,
    expenses: &[Expense],
    balances: &Balances,
) -> Option<Explanation> {
    roster.get(participant_id)?;

    let mut expense_contributions = Vec::new();
    let mut payments = Vec::new();

    for expense in expenses {
        if expense.payer_id == participant_id {
            payments.push(Payment {
                expense_id: expense.expense_id.clone(),
                category: expense.category,
                date: expense.date.clone(),
                amount: round_cents(expense.amount),
            });
        }

        if !roster.is_eligible(participant_id, expense) {
            continue;
        }
        let eligible = roster.eligible_beneficiaries(expense);
        let share = expense.amount / Decimal::from(eligible.len());

        expense_contributions.push(Contribution {
            expense_id: expense.expense_id.clone(),
            category: expense.category,
            date: expense.date.clone(),
            total_expense_amount: round_cents(expense.amount),
            num_beneficiaries: eligible.len(),
            beneficiaries: eligible.into_iter().map(str::to_string).collect(),
            participant_share: round_cents(share),
        });
    }

    let balance = balances.get(participant_id).copied().unwrap_or_default();

    Some(Explanation {
        participant_id: participant_id.to_string(),
        expense_contributions,
        payments,
        total_share: balance.total_share,
        total_paid: balance.total_paid,
        net_balance: balance.net_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_balances;
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

    fn expense(id: &str, payer: &str, amount: Decimal, beneficiaries: &[&str], date: &str) -> Expense {
        Expense {
            expense_id: id.to_string(),
            payer_id: payer.to_string(),
            amount,
            category: Category::Transport,
            beneficiaries: beneficiaries.iter().map(|b| b.to_string()).collect(),
            date: date.to_string(),
            note: None,
        }
    }

    fn snapshot() -> (Vec<Participant>, Vec<Expense>) {
        let participants = vec![
            participant("A", "2024-06-01", None),
            participant("B", "2024-06-01", Some("2024-06-03")),
            participant("C", "2024-06-03", None),
        ];
        let expenses = vec![
            expense("E001", "A", dec!(90), &["A", "B", "C"], "2024-06-02"),
            expense("E002", "B", dec!(30), &["A", "B", "C"], "2024-06-03"),
            expense("E003", "C", dec!(10), &["A", "B", "C"], "2024-06-04"),
        ];
        (participants, expenses)
    }

    #[test]
    fn lists_only_eligible_contributions() {
        let (participants, expenses) = snapshot();
        let balances = compute_balances(&participants, &expenses);
        let explanation = explain("C", &participants, &expenses, &balances).unwrap();

        let ids: Vec<_> = explanation
            .expense_contributions
            .iter()
            .map(|c| c.expense_id.as_str())
            .collect();
        assert_eq!(ids, vec!["E002", "E003"]);

        let e002 = &explanation.expense_contributions[0];
        assert_eq!(e002.num_beneficiaries, 3);
        assert_eq!(e002.participant_share, dec!(10));
        let e003 = &explanation.expense_contributions[1];
        assert_eq!(e003.beneficiaries, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(e003.participant_share, dec!(5));
    }

    #[test]
    fn totals_come_from_balances() {
        let (participants, expenses) = snapshot();
        let balances = compute_balances(&participants, &expenses);

        for explanation in explain_all(&participants, &expenses, &balances) {
            let balance = balances[&explanation.participant_id];
            assert_eq!(explanation.total_share, balance.total_share);
            assert_eq!(explanation.total_paid, balance.total_paid);
            assert_eq!(explanation.net_balance, balance.net_balance);

            let itemized: Decimal = explanation
                .expense_contributions
                .iter()
                .map(|c| c.participant_share)
                .sum();
            assert_eq!(itemized, balance.total_share);
        }
    }

    #[test]
    fn records_payments() {
        let (participants, expenses) = snapshot();
        let balances = compute_balances(&participants, &expenses);
        let explanation = explain("B", &participants, &expenses, &balances).unwrap();
        assert_eq!(
            explanation.payments,
            vec![Payment {
                expense_id: "E002".to_string(),
                category: Category::Transport,
                date: "2024-06-03".to_string(),
                amount: dec!(30),
            }]
        );
    }

    #[test]
    fn unknown_participant_has_no_explanation() {
        let (participants, expenses) = snapshot();
        let balances = compute_balances(&participants, &expenses);
        assert!(explain("ghost", &participants, &expenses, &balances).is_none());
    }

    #[test]
    fn explain_all_covers_everyone_sorted() {
        let participants = vec![
            participant("P002", "2024-06-01", None),
            participant("P001", "2024-06-01", None),
        ];
        let balances = compute_balances(&participants, &[]);
        let ids: Vec<_> = explain_all(&participants, &[], &balances)
            .into_iter()
            .map(|e| e.participant_id)
            .collect();
        assert_eq!(ids, vec!["P001".to_string(), "P002".to_string()]);
    }
}
