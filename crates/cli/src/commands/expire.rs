use std::sync::Arc;

use crate::commands::CommandResult;
use garasi_core::clock::SystemClock;
use garasi_core::config::{AppConfig, LoadOptions};
use garasi_db::stores::{
    SqlCustomerStore, SqlLegacyBookingStore, SqlLegacyEventStore, SqlVehicleStore,
};
use garasi_db::connect_with_settings;
use garasi_engine::{EngineStores, LifecycleOps};

/// The scheduled entry point: flips stale `active` bookings to `expired` on
/// both the embedded and the legacy tier.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "expire",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "expire",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let stores = EngineStores {
            vehicles: Arc::new(SqlVehicleStore::new(pool.clone())),
            customers: Arc::new(SqlCustomerStore::new(pool.clone())),
            legacy_events: Arc::new(SqlLegacyEventStore::new(pool.clone())),
            legacy_bookings: Arc::new(SqlLegacyBookingStore::new(pool.clone())),
        };
        let ops = LifecycleOps::new(stores, Arc::new(SystemClock));
        let sweep =
            ops.expire_stale_bookings().await.map_err(|error| ("sweep", error.to_string(), 5u8))?;

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(sweep)
    });

    match result {
        Ok(sweep) => CommandResult::success(
            "expire",
            format!(
                "expired {} stale bookings ({} embedded, {} legacy)",
                sweep.total(),
                sweep.expired_embedded,
                sweep.expired_legacy
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("expire", error_class, message, exit_code)
        }
    }
}
