use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{jwt::JwtKeys, AuthService};
use crate::config::{AppConfig, JwtConfig};
use crate::listings::ListingService;
use crate::store::{ListingStore, PgListingStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub listings: ListingService,
}

impl AppState {
    /// Connects to Postgres from env config and runs pending migrations.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db.clone()));
        let listings: Arc<dyn ListingStore> = Arc::new(PgListingStore::new(db));
        Ok(Self::with_stores(users, listings, &config.jwt))
    }

    /// Wires services over any store pair; tests use the in-memory stores.
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        listings: Arc<dyn ListingStore>,
        jwt: &JwtConfig,
    ) -> Self {
        let keys = JwtKeys::from_config(jwt);
        Self {
            auth: AuthService::new(users.clone(), keys),
            listings: ListingService::new(listings, users),
        }
    }
}
