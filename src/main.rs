//! Service entry-point: wires adapters, REST endpoints and background jobs.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use mockable::{DefaultClock, DefaultEnv};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use autoschool_backend::domain::{
    AvailabilityScheduler, BalanceService, BookingService, LifecycleReconciler, ReconcilerConfig,
    TokioSleeper,
};
#[cfg(debug_assertions)]
use autoschool_backend::doc::ApiDoc;
use autoschool_backend::inbound::http::health::healthz;
use autoschool_backend::inbound::http::state::HttpState;
use autoschool_backend::inbound::http;
use autoschool_backend::outbound::memory::{
    InMemoryCreditLedger, InMemoryInstructorDirectory, InMemorySlotStore,
};
use autoschool_backend::outbound::notify::TracingNotifier;
use autoschool_backend::server::config::AppConfig;
use autoschool_backend::server::jobs;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env(&DefaultEnv::default())
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let slots = Arc::new(InMemorySlotStore::new());
    let balances = Arc::new(InMemoryCreditLedger::new());
    // Seeded from INSTRUCTOR_IDS; a staff-directory adapter would
    // replace this behind the same port.
    let instructors = Arc::new(InMemoryInstructorDirectory::new(
        config.instructor_ids.clone(),
    ));
    let notifier = Arc::new(TracingNotifier);
    let clock = Arc::new(DefaultClock);

    let booking = Arc::new(BookingService::new(
        slots.clone(),
        balances.clone(),
        notifier,
        clock.clone(),
        config.schedule.clone(),
    ));
    let balance = Arc::new(BalanceService::new(balances.clone()));
    let scheduler = Arc::new(AvailabilityScheduler::new(
        slots.clone(),
        instructors,
        clock.clone(),
        config.schedule.clone(),
    ));
    let reconciler = Arc::new(LifecycleReconciler::new(
        slots.clone(),
        clock,
        Arc::new(TokioSleeper),
        ReconcilerConfig::default(),
    ));

    jobs::spawn_weekly_generation(scheduler, config.generation_interval, config.job_tick_budget);
    jobs::spawn_lifecycle_reconciliation(
        reconciler,
        config.reconcile_interval,
        config.job_tick_budget,
    );

    let state = HttpState::new(booking, balance, slots);
    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(state.clone()))
            .service(healthz)
            .configure(http::configure);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(config.bind_addr)?
    .run()
    .await
}
