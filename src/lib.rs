//! Trip cost splitting: per-participant balances with time-windowed
//! eligibility, greedy settlement minimization, and spending analytics.
//!
//! [`balance`], [`settlement`], [`analytics`] and [`explain`] are pure
//! functions over an in-memory snapshot of participants and expenses.
//! [`store`] and the binary's handlers wrap them with MongoDB persistence and
//! an HTTP API.

pub mod analytics;
pub mod balance;
pub mod eligibility;
pub mod error;
pub mod explain;
pub mod money;
pub mod report;
pub mod schemas;
pub mod settings;
pub mod settlement;
pub mod store;
pub mod validation;

pub use analytics::{generate_analytics, Analytics, AnalyticsReport, Warning};
pub use balance::{compute_balances, Balance, Balances};
pub use explain::{explain, explain_all, Explanation};
pub use report::{calculate, TripReport};
pub use schemas::{Category, Expense, Participant};
pub use settlement::{optimize, Settlement};
