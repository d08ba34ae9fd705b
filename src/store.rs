use chrono::Utc;
use mongodb::{bson::doc, Client, Collection};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, TripError};
use crate::report::TripReport;
use crate::schemas::{
    sequential_id, Expense, NewExpense, NewParticipant, Participant, Trip, TripId,
};
use crate::validation;

const TRIPS: &str = "Trips";

/// Appends race on the sequential id; each attempt re-reads the trip.
const MAX_APPEND_ATTEMPTS: usize = 3;

/// Trips persisted as one MongoDB document each, embedding the roster, the
/// expenses and the last calculated report.
#[derive(Clone, Debug)]
pub struct TripStore {
    trips: Collection<Trip>,
}

pub fn new_trip_id() -> TripId {
    let hex = Uuid::new_v4().simple().to_string();
    format!("trip_{}", &hex[..8])
}

/// Next id after the highest `<prefix><number>` already taken. Ids that do
/// not follow the pattern are ignored.
pub fn next_sequential_id<'a>(prefix: char, taken: impl Iterator<Item = &'a str>) -> String {
    let highest = taken
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|number| number.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    sequential_id(prefix, highest + 1)
}

impl TripStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(TripStore::new(&client, database))
    }

    pub fn new(client: &Client, database: &str) -> Self {
        TripStore {
            trips: client.database(database).collection::<Trip>(TRIPS),
        }
    }

    pub async fn create_trip(&self, name: Option<String>) -> Result<Trip> {
        let trip_id = new_trip_id();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| trip_id.clone());
        let trip = Trip {
            trip_id,
            name,
            created_at: Utc::now(),
            participants: vec![],
            expenses: vec![],
            report: None,
        };
        self.trips.insert_one(trip.clone(), None).await?;
        info!(trip = %trip.trip_id, "trip created");
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Trip> {
        self.trips
            .find_one(doc! { "trip_id": trip_id }, None)
            .await?
            .ok_or_else(|| TripError::TripNotFound(trip_id.to_string()))
    }

    pub async fn add_participant(
        &self,
        trip_id: &str,
        request: NewParticipant,
    ) -> Result<Participant> {
        let request = validation::new_participant(request)?;

        for _ in 0..MAX_APPEND_ATTEMPTS {
            let trip = self.get_trip(trip_id).await?;
            let participant_id = next_sequential_id(
                'P',
                trip.participants.iter().map(|p| p.participant_id.as_str()),
            );
            let participant = Participant {
                participant_id: participant_id.clone(),
                name: request.name.clone(),
                start_date: request.start_date.clone(),
                end_date: None,
                group_id: request.group_id.clone(),
            };

            let result = self
                .trips
                .update_one(
                    doc! {
                        "trip_id": trip_id,
                        "participants.participant_id": { "$ne": participant_id.as_str() },
                    },
                    doc! { "$push": { "participants": bson::to_bson(&participant)? } },
                    None,
                )
                .await?;
            if result.modified_count == 1 {
                info!(trip = trip_id, participant = %participant_id, "participant added");
                return Ok(participant);
            }
            warn!(trip = trip_id, participant = %participant_id, "participant id taken, retrying");
        }

        Err(TripError::Conflict(trip_id.to_string()))
    }

    /// Soft removal: the participant stays on the roster with an end date.
    pub async fn remove_participant(
        &self,
        trip_id: &str,
        participant_id: &str,
        end_date: &str,
    ) -> Result<Participant> {
        let trip = self.get_trip(trip_id).await?;
        let mut participant = trip
            .participants
            .into_iter()
            .find(|p| p.participant_id == participant_id)
            .ok_or_else(|| TripError::ParticipantNotFound {
                trip_id: trip_id.to_string(),
                participant_id: participant_id.to_string(),
            })?;
        validation::leave(&participant, end_date)?;

        self.trips
            .update_one(
                doc! { "trip_id": trip_id, "participants.participant_id": participant_id },
                doc! { "$set": { "participants.$.end_date": end_date } },
                None,
            )
            .await?;

        info!(trip = trip_id, participant = participant_id, end_date, "participant left");
        participant.end_date = Some(end_date.to_string());
        Ok(participant)
    }

    pub async fn add_expense(&self, trip_id: &str, request: NewExpense) -> Result<Expense> {
        for _ in 0..MAX_APPEND_ATTEMPTS {
            let trip = self.get_trip(trip_id).await?;
            let request = validation::new_expense(request.clone(), &trip.participants)?;
            let expense_id = next_sequential_id(
                'E',
                trip.expenses.iter().map(|e| e.expense_id.as_str()),
            );
            let expense = request.into_expense(expense_id.clone());

            let result = self
                .trips
                .update_one(
                    doc! {
                        "trip_id": trip_id,
                        "expenses.expense_id": { "$ne": expense_id.as_str() },
                    },
                    doc! { "$push": { "expenses": bson::to_bson(&expense)? } },
                    None,
                )
                .await?;
            if result.modified_count == 1 {
                info!(trip = trip_id, expense = %expense_id, amount = %expense.amount, "expense added");
                return Ok(expense);
            }
            warn!(trip = trip_id, expense = %expense_id, "expense id taken, retrying");
        }

        Err(TripError::Conflict(trip_id.to_string()))
    }

    pub async fn save_report(&self, trip_id: &str, report: &TripReport) -> Result<()> {
        let result = self
            .trips
            .update_one(
                doc! { "trip_id": trip_id },
                doc! { "$set": { "report": bson::to_bson(report)? } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(TripError::TripNotFound(trip_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_follows_highest_taken() {
        let taken = ["P001", "P007", "P003"];
        assert_eq!(next_sequential_id('P', taken.into_iter()), "P008");
    }

    #[test]
    fn next_id_starts_at_one_and_skips_foreign_ids() {
        assert_eq!(next_sequential_id('E', std::iter::empty()), "E001");
        let taken = ["legacy-uuid", "Pxyz", "E002"];
        assert_eq!(next_sequential_id('P', taken.into_iter()), "P001");
    }

    #[test]
    fn trip_ids_carry_eight_hex_chars() {
        let id = new_trip_id();
        let suffix = id.strip_prefix("trip_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
