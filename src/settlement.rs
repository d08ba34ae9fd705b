use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::balance::Balances;
use crate::money::{round_cents, EPSILON};
use crate::schemas::ParticipantId;

/// A payment obligation: `from` owes `to` the given amount.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settlement {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

#[derive(Clone, Debug)]
struct Position<'a> {
    id: &'a str,
    remaining: Decimal,
}

/// Reduces net balances to a short list of payments.
///
/// Debtors and creditors are each sorted largest first and matched greedily;
/// every step clears at least one of the two, so `n` unsettled participants
/// need at most `n - 1` payments. Balances within a cent of zero are treated
/// as settled. Sorting is stable over the id-ordered input, so equal amounts
/// are matched in ascending id order.
pub fn optimize(balances: &Balances) -> Vec<Settlement> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (id, balance) in balances {
        let net = balance.net_balance;
        if net < -EPSILON {
            debtors.push(Position {
                id: id.as_str(),
                remaining: net.abs(),
            });
        } else if net > EPSILON {
            creditors.push(Position {
                id: id.as_str(),
                remaining: net,
            });
        }
    }

    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut settlements = Vec::with_capacity(debtors.len() + creditors.len());
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];
        let amount = debtor.remaining.min(creditor.remaining);

        if amount >= EPSILON {
            settlements.push(Settlement {
                from: debtor.id.to_string(),
                to: creditor.id.to_string(),
                amount: round_cents(amount),
            });
        }

        debtor.remaining -= amount;
        creditor.remaining -= amount;

        if debtor.remaining < EPSILON {
            d += 1;
        }
        if creditor.remaining < EPSILON {
            c += 1;
        }
    }

    debug!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        settlements = settlements.len(),
        "settlements optimized"
    );

    settlements
}
