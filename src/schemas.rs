use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::eligibility;
use crate::report::TripReport;

pub type ParticipantId = String;
pub type ExpenseId = String;
pub type TripId = String;

/// Calendar date in `YYYY-MM-DD` form. Lexicographic order is chronological
/// order, which the eligibility and daily aggregation code relies on.
pub type IsoDate = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub name: String,
    pub start_date: IsoDate,
    pub end_date: Option<IsoDate>,
    pub group_id: Option<String>,
}

impl Participant {
    pub fn is_active_on(&self, date: &str) -> bool {
        eligibility::is_active(&self.start_date, self.end_date.as_deref(), date)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Hotel,
    Transport,
    Fun,
    Misc,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Hotel,
        Category::Transport,
        Category::Fun,
        Category::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Hotel => "hotel",
            Category::Transport => "transport",
            Category::Fun => "fun",
            Category::Misc => "misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub expense_id: ExpenseId,
    pub payer_id: ParticipantId,
    pub amount: Decimal,
    pub category: Category,
    pub beneficiaries: Vec<ParticipantId>,
    pub date: IsoDate,
    pub note: Option<String>,
}

/// A trip as stored: one document embedding its roster, its expenses and the
/// last calculated report.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Trip {
    pub trip_id: TripId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    pub expenses: Vec<Expense>,
    pub report: Option<TripReport>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NewTrip {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewParticipant {
    pub name: String,
    pub start_date: IsoDate,
    pub group_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Leave {
    pub end_date: IsoDate,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewExpense {
    pub payer_id: ParticipantId,
    pub amount: Decimal,
    pub category: Category,
    pub beneficiaries: Vec<ParticipantId>,
    pub date: IsoDate,
    pub note: Option<String>,
}

impl NewExpense {
    pub fn into_expense(self, expense_id: ExpenseId) -> Expense {
        Expense {
            expense_id,
            payer_id: self.payer_id,
            amount: self.amount,
            category: self.category,
            beneficiaries: self.beneficiaries,
            date: self.date,
            note: self.note,
        }
    }
}

/// Sequential per-trip identifiers: `P001`, `E042`, ...
pub fn sequential_id(prefix: char, number: usize) -> String {
    format!("{prefix}{number:03}")
}
