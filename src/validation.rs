//! Checks the orchestration layer runs before anything reaches the store.
//! The calculation modules assume their input already passed through here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::MAX_AMOUNT;
use crate::schemas::{NewExpense, NewParticipant, Participant};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be a non-empty string")]
    Empty(&'static str),

    #[error("{field} must be in YYYY-MM-DD format, got: {value}")]
    Date { field: &'static str, value: String },

    #[error("end_date ({end}) cannot be before start_date ({start})")]
    EndBeforeStart { start: String, end: String },

    #[error("amount must be greater than 0, got: {0}")]
    NonPositiveAmount(Decimal),

    #[error("amount must not exceed {max}, got: {amount}")]
    AmountTooLarge { amount: Decimal, max: Decimal },

    #[error("beneficiaries must contain at least one participant")]
    NoBeneficiaries,

    #[error("payer {0} is not a participant of this trip")]
    UnknownPayer(String),

    #[error("beneficiary {0} is not a participant of this trip")]
    UnknownBeneficiary(String),
}

pub fn validate_date(field: &'static str, value: &str) -> Result<(), ValidationError> {
    // chrono accepts unpadded fields, the stored form must stay sortable.
    let well_formed = value.len() == 10
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::Date {
            field,
            value: value.to_string(),
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates and normalizes a participant about to join a trip.
pub fn new_participant(mut request: NewParticipant) -> Result<NewParticipant, ValidationError> {
    request.name = request.name.trim().to_string();
    if request.name.is_empty() {
        return Err(ValidationError::Empty("name"));
    }
    validate_date("start_date", &request.start_date)?;
    request.group_id = trimmed(request.group_id);
    Ok(request)
}

/// A participant can only leave on or after the day they joined.
pub fn leave(participant: &Participant, end_date: &str) -> Result<(), ValidationError> {
    validate_date("end_date", end_date)?;
    if end_date < participant.start_date.as_str() {
        return Err(ValidationError::EndBeforeStart {
            start: participant.start_date.clone(),
            end: end_date.to_string(),
        });
    }
    Ok(())
}

/// Validates an expense against the trip roster.
pub fn new_expense(
    mut request: NewExpense,
    participants: &[Participant],
) -> Result<NewExpense, ValidationError> {
    let known = |id: &str| participants.iter().any(|p| p.participant_id == id);

    if request.payer_id.trim().is_empty() {
        return Err(ValidationError::Empty("payer_id"));
    }
    if !known(&request.payer_id) {
        return Err(ValidationError::UnknownPayer(request.payer_id));
    }
    if request.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(request.amount));
    }
    if request.amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            amount: request.amount,
            max: MAX_AMOUNT,
        });
    }
    if request.beneficiaries.is_empty() {
        return Err(ValidationError::NoBeneficiaries);
    }
    if let Some(unknown) = request.beneficiaries.iter().find(|b| !known(b)) {
        return Err(ValidationError::UnknownBeneficiary(unknown.clone()));
    }
    validate_date("date", &request.date)?;
    request.note = trimmed(request.note);
    Ok(request)
}
