#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::data::mongo::MongoStore;
use crate::data::Store;
use crate::error::{BackendError, ConfigurationError};
use crate::payment::stripe::StripeClient;
use crate::payment::Payments;
use crate::route::mount_api;
use crate::security::Security;

pub mod config;
pub mod data;
pub mod error;
pub mod payment;
pub mod resp;
pub mod role;
pub mod route;
pub mod security;
pub mod util;

/// Attaches CORS, shared state, routes and catchers. Collaborators are built by the caller.
pub fn assemble(
    rocket: Rocket<Build>,
    security: Security,
    store: Store,
    payments: Payments,
) -> Result<Rocket<Build>, BackendError> {
    tracing::info!("Setting up CORS...");
    let cors = rocket_cors::CorsOptions {
        allowed_origins: AllowedOrigins::all(),
        allowed_methods: vec![
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ]
        .into_iter()
        .map(From::from)
        .collect(),
        allowed_headers: AllowedHeaders::all(),
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    let r = rocket
        .attach(cors)
        .manage(security)
        .manage(store)
        .manage(payments);

    Ok(mount_api(r))
}

pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
        if let Err(err) = tracing_log::LogTracer::init() {
            eprintln!("Unable to forward log records: {}", err);
        }
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(dir)) => {
            tracing::info!(
                "No settings file in '{}', using environment.",
                dir.display()
            );
            Config::default()
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };
    c.validate()?;

    tracing::info!("Using MongoDB database: {}", c.mongodb_db);
    let mongo = MongoStore::connect(&c.mongodb_uri, &c.mongodb_db).await?;
    let client = mongo.client().clone();
    let store: Store = Arc::new(mongo);

    let payments: Payments = Arc::new(StripeClient::new(
        c.payment_secret_key.clone(),
        c.stripe_api_base.clone(),
    ));
    let security = Security::from_secret(&c.access_token_secret);

    tracing::info!("Starting HTTP server...");
    let figment = rocket::Config::figment()
        .merge(("port", c.port))
        .merge(("address", c.address.clone()));

    let r = rocket::custom(figment).attach(AdHoc::on_shutdown("MongoDB client", move |_| {
        Box::pin(async move {
            tracing::info!("Closing MongoDB connections...");
            client.shutdown().await;
        })
    }));

    assemble(r, security, store, payments)
}
