use actix_cors::Cors;
use actix_web::{get, middleware, post, web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tripsplit::error::{Result, TripError};
use tripsplit::report::calculate;
use tripsplit::schemas::{Leave, NewExpense, NewParticipant, NewTrip};
use tripsplit::settings::Settings;
use tripsplit::store::TripStore;

#[derive(Deserialize, Serialize)]
struct TripCreated {
    trip_id: String,
    message: String,
}

#[post("/trips")]
async fn create_trip(
    store: web::Data<TripStore>,
    json: Option<web::Json<NewTrip>>,
) -> Result<HttpResponse> {
    let name = json.and_then(|json| json.into_inner().name);
    let trip = store.create_trip(name).await?;
    Ok(HttpResponse::Created().json(TripCreated {
        trip_id: trip.trip_id,
        message: "Trip created successfully".to_string(),
    }))
}

#[post("/trips/{trip_id}/participants")]
async fn add_participant(
    store: web::Data<TripStore>,
    trip_id: web::Path<String>,
    json: web::Json<NewParticipant>,
) -> Result<HttpResponse> {
    let participant = store
        .add_participant(&trip_id.into_inner(), json.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(participant))
}

#[post("/trips/{trip_id}/participants/{participant_id}/leave")]
async fn remove_participant(
    store: web::Data<TripStore>,
    path: web::Path<(String, String)>,
    json: web::Json<Leave>,
) -> Result<HttpResponse> {
    let (trip_id, participant_id) = path.into_inner();
    let participant = store
        .remove_participant(&trip_id, &participant_id, &json.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(participant))
}

#[post("/trips/{trip_id}/expenses")]
async fn add_expense(
    store: web::Data<TripStore>,
    trip_id: web::Path<String>,
    json: web::Json<NewExpense>,
) -> Result<HttpResponse> {
    let expense = store
        .add_expense(&trip_id.into_inner(), json.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(expense))
}

#[get("/trips/{trip_id}/calculate")]
async fn calculate_trip(
    store: web::Data<TripStore>,
    trip_id: web::Path<String>,
) -> Result<HttpResponse> {
    let trip_id = trip_id.into_inner();
    let trip = store.get_trip(&trip_id).await?;
    if trip.participants.is_empty() {
        return Err(TripError::NoParticipants(trip_id));
    }

    let report = calculate(&trip.participants, &trip.expenses);
    store.save_report(&trip_id, &report).await?;
    info!(
        trip = %trip_id,
        settlements = report.settlements.len(),
        warnings = report.warnings.len(),
        "trip results stored"
    );
    Ok(HttpResponse::Ok().json(report))
}

#[get("/trips/{trip_id}/summary")]
async fn trip_summary(
    store: web::Data<TripStore>,
    trip_id: web::Path<String>,
) -> Result<HttpResponse> {
    let trip_id = trip_id.into_inner();
    match store.get_trip(&trip_id).await?.report {
        Some(report) => Ok(HttpResponse::Ok().json(report)),
        None => Err(TripError::NoResults(trip_id)),
    }
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "Smart Travel Expense Splitter"
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.level)),
        )
        .with_target(false)
        .init();

    if let Err(err) = settings.validate() {
        error!("Invalid configuration: {}", err);
        std::process::exit(1);
    }

    let store = match TripStore::connect(&settings.mongodb.uri, &settings.mongodb.database).await {
        Ok(store) => store,
        Err(err) => {
            error!("Failed to connect to MongoDB: {}", err);
            std::process::exit(1);
        }
    };
    info!(database = %settings.mongodb.database, "connected to MongoDB");

    let store = web::Data::new(store);
    info!(
        "Starting HTTP server on {}:{}",
        settings.server.host, settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .service(create_trip)
            .service(add_participant)
            .service(remove_participant)
            .service(add_expense)
            .service(calculate_trip)
            .service(trip_summary)
            .service(health)
    })
    .bind((settings.server.host.as_str(), settings.server.port))?
    .run()
    .await
}
