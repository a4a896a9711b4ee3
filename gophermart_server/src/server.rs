use actix_web::{dev::Server, middleware, web, App, HttpServer};
use gophermart_engine::{
    accrual::{AccrualHttpClient, AccrualPoller},
    scheduler::{AccrualScheduler, SchedulerHandle},
    traits::LedgerDatabase,
    LedgerApi, SqliteDatabase,
};
use log::{error, info};
use tokio::task::JoinHandle;

use crate::{config::ServerConfig, errors::ServerError, routes};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE_SECS: u64 = 5;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_uri, 25)
        .await
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;

    let poller = AccrualHttpClient::new(&config.accrual_address);
    let scheduler = AccrualScheduler::new(db.clone(), poller);
    let handle = scheduler.handle();
    let worker = start_accrual_worker(scheduler);

    let srv = create_server_instance(&config, db, handle.clone())?;
    srv.await?;

    // The HTTP server has drained; now wind down the polling pipeline.
    handle.stop();
    let _ = worker.await;
    Ok(())
}

/// Starts the accrual scheduler on a detached task. Do not await the returned JoinHandle until after calling
/// [`SchedulerHandle::stop`]; it runs until stopped.
pub fn start_accrual_worker<B, C>(scheduler: AccrualScheduler<B, C>) -> JoinHandle<()>
where
    B: LedgerDatabase,
    C: AccrualPoller,
{
    tokio::spawn(async move {
        info!("🔁️ Accrual worker started");
        if let Err(e) = scheduler.run().await {
            error!("🔁️ Accrual worker exited with an error: {e}");
        }
    })
}

pub fn create_server_instance(
    config: &ServerConfig,
    db: SqliteDatabase,
    scheduler: SchedulerHandle,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone());
        App::new()
            .wrap(middleware::Logger::new("%t (%D ms) %s %a %U"))
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(scheduler.clone()))
            .app_data(json_error_config())
            .configure(api_routes::<SqliteDatabase>)
    })
    .bind(config.run_address.as_str())?
    .shutdown_timeout(SHUTDOWN_GRACE_SECS)
    .run();
    Ok(srv)
}

/// Registers every route against the given ledger backend.
pub fn api_routes<B: LedgerDatabase>(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::health).service(
        web::scope("/api/user")
            .route("/register", web::post().to(routes::register::<B>))
            .route("/login", web::post().to(routes::login::<B>))
            .route("/orders", web::post().to(routes::post_order::<B>))
            .route("/orders", web::get().to(routes::get_orders::<B>))
            .route("/balance", web::get().to(routes::get_balance::<B>))
            .route("/balance/withdraw", web::post().to(routes::withdraw::<B>))
            .route("/withdrawals", web::get().to(routes::get_withdrawals::<B>)),
    );
}

/// Malformed JSON bodies are a 400 with the standard message envelope.
pub fn json_error_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|_, _| ServerError::InvalidRequestBody.into())
}
