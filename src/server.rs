//! # Server Configuration
//!
//! Router assembly, middleware, the OpenAPI document, and the serve loop for
//! the seating API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::engine::SeatingEngine;
use crate::handlers::{self, assignments, parties, reservations, restaurants, servers, tables, waiting_list};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub engine: SeatingEngine,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        let engine = SeatingEngine::new(db.clone(), config.waiting_list.clone());
        Self { db, engine, config }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants",
            post(restaurants::create_restaurant).get(restaurants::list_restaurants),
        )
        .route(
            "/restaurants/{id}",
            get(restaurants::get_restaurant).patch(restaurants::update_restaurant),
        )
        .route(
            "/restaurants/{id}/sections",
            post(restaurants::create_section).get(restaurants::list_sections),
        )
        .route(
            "/restaurants/{id}/tables",
            post(tables::create_table).get(tables::list_tables),
        )
        .route(
            "/restaurants/{id}/availability",
            get(restaurants::check_availability),
        )
        .route(
            "/restaurants/{id}/occupancy",
            get(restaurants::compute_occupancy),
        )
        .route(
            "/restaurants/{id}/servers",
            post(servers::create_server).get(servers::list_servers),
        )
        .route(
            "/restaurants/{id}/reservations",
            get(reservations::list_reservations),
        )
        .route(
            "/restaurants/{id}/waiting-list",
            post(waiting_list::add_to_waiting_list).get(waiting_list::list_waiting_list),
        )
        .route(
            "/restaurants/{id}/waiting-list/next",
            get(waiting_list::next_waiting_entry),
        )
        .route(
            "/sections/{id}",
            get(restaurants::get_section).patch(restaurants::update_section),
        )
        .route(
            "/tables/{id}",
            get(tables::get_table)
                .patch(tables::update_table)
                .delete(tables::retire_table),
        )
        .route(
            "/tables/{id}/sections/{section_id}",
            put(tables::link_table_section),
        )
        .route("/tables/{id}/maintenance", put(tables::set_table_maintenance))
        .route("/servers/{id}", patch(servers::update_server))
        .route(
            "/parties",
            post(parties::create_party).get(parties::list_parties),
        )
        .route(
            "/parties/{id}",
            get(parties::get_party).patch(parties::update_party),
        )
        .route("/parties/{id}/cancel", post(parties::cancel_party))
        .route("/reservations", post(reservations::create_reservation))
        .route(
            "/reservations/{id}",
            get(reservations::get_reservation).patch(reservations::update_reservation),
        )
        .route(
            "/reservations/{id}/confirm",
            post(reservations::confirm_reservation),
        )
        .route(
            "/reservations/{id}/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/reservations/{id}/no-show",
            post(reservations::mark_no_show),
        )
        .route(
            "/waiting-list/{id}",
            get(waiting_list::get_waiting_list_entry)
                .patch(waiting_list::update_waiting_list_entry),
        )
        .route(
            "/waiting-list/{id}/promote",
            post(waiting_list::promote_waiting_list_entry),
        )
        .route(
            "/waiting-list/{id}/cancel",
            post(waiting_list::cancel_waiting_list_entry),
        )
        .route(
            "/waiting-list/{id}/expire",
            post(waiting_list::expire_waiting_list_entry),
        )
        .route(
            "/table-assignments",
            post(assignments::assign_table).get(assignments::list_table_assignments),
        )
        .route(
            "/table-assignments/{id}",
            get(assignments::get_table_assignment),
        )
        .route(
            "/table-assignments/{id}/complete",
            post(assignments::complete_assignment),
        )
        .route(
            "/table-assignments/{id}/cancel",
            post(assignments::cancel_assignment),
        )
        .route(
            "/reservation-assignments",
            post(assignments::assign_reservation).get(assignments::list_reservation_assignments),
        )
        .route(
            "/reservation-assignments/{id}",
            get(assignments::get_reservation_assignment),
        )
        .route(
            "/reservation-assignments/{id}/seat",
            post(assignments::seat_reservation),
        )
        .route(
            "/reservation-assignments/{id}/cancel",
            post(assignments::cancel_reservation_assignment),
        )
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();
    let state = AppState::new(db, Arc::new(config));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Seating API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::restaurants::create_restaurant,
        crate::handlers::restaurants::list_restaurants,
        crate::handlers::restaurants::get_restaurant,
        crate::handlers::restaurants::update_restaurant,
        crate::handlers::restaurants::get_section,
        crate::handlers::restaurants::update_section,
        crate::handlers::restaurants::create_section,
        crate::handlers::restaurants::list_sections,
        crate::handlers::restaurants::check_availability,
        crate::handlers::restaurants::compute_occupancy,
        crate::handlers::tables::create_table,
        crate::handlers::tables::list_tables,
        crate::handlers::tables::get_table,
        crate::handlers::tables::update_table,
        crate::handlers::tables::link_table_section,
        crate::handlers::tables::set_table_maintenance,
        crate::handlers::tables::retire_table,
        crate::handlers::servers::create_server,
        crate::handlers::servers::list_servers,
        crate::handlers::servers::update_server,
        crate::handlers::parties::create_party,
        crate::handlers::parties::list_parties,
        crate::handlers::parties::get_party,
        crate::handlers::parties::update_party,
        crate::handlers::parties::cancel_party,
        crate::handlers::reservations::create_reservation,
        crate::handlers::reservations::list_reservations,
        crate::handlers::reservations::get_reservation,
        crate::handlers::reservations::update_reservation,
        crate::handlers::reservations::confirm_reservation,
        crate::handlers::reservations::cancel_reservation,
        crate::handlers::reservations::mark_no_show,
        crate::handlers::waiting_list::add_to_waiting_list,
        crate::handlers::waiting_list::list_waiting_list,
        crate::handlers::waiting_list::next_waiting_entry,
        crate::handlers::waiting_list::get_waiting_list_entry,
        crate::handlers::waiting_list::update_waiting_list_entry,
        crate::handlers::waiting_list::promote_waiting_list_entry,
        crate::handlers::waiting_list::cancel_waiting_list_entry,
        crate::handlers::waiting_list::expire_waiting_list_entry,
        crate::handlers::assignments::assign_table,
        crate::handlers::assignments::list_table_assignments,
        crate::handlers::assignments::get_table_assignment,
        crate::handlers::assignments::complete_assignment,
        crate::handlers::assignments::cancel_assignment,
        crate::handlers::assignments::assign_reservation,
        crate::handlers::assignments::list_reservation_assignments,
        crate::handlers::assignments::get_reservation_assignment,
        crate::handlers::assignments::seat_reservation,
        crate::handlers::assignments::cancel_reservation_assignment,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::TableStatus,
            crate::models::PartyStatus,
            crate::models::ReservationStatus,
            crate::models::WaitingListStatus,
            crate::models::AssignmentStatus,
            crate::error::ApiError,
            crate::engine::Occupancy,
            crate::handlers::HealthStatus,
            crate::handlers::types::RestaurantInfo,
            crate::handlers::types::SectionInfo,
            crate::handlers::types::TableInfo,
            crate::handlers::types::PartyInfo,
            crate::handlers::types::ReservationInfo,
            crate::handlers::types::WaitingListEntryInfo,
            crate::handlers::types::ServerInfo,
            crate::handlers::types::TableAssignmentInfo,
            crate::handlers::types::ReservationAssignmentInfo,
            crate::handlers::tables::TableRetirementResponse,
            crate::handlers::restaurants::AvailabilityResponse,
        )
    ),
    tags(
        (name = "restaurants", description = "Restaurants and sections"),
        (name = "tables", description = "Dining tables"),
        (name = "availability", description = "Availability and occupancy projections"),
        (name = "servers", description = "Wait staff"),
        (name = "parties", description = "Parties"),
        (name = "reservations", description = "Reservation lifecycle"),
        (name = "waiting-list", description = "Walk-in queue"),
        (name = "assignments", description = "Seating engine assignments")
    ),
    info(
        title = "Seating API",
        description = "Restaurant seating: tables, parties, reservations, waiting list and assignments",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
