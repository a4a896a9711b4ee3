use log::{debug, warn};
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Drops any stale copy of the test database and initialises logging. [`crate::SqliteDatabase::new_with_url`]
/// creates the file and runs the migrations.
pub async fn prepare_test_env(url: &str) {
    dotenvy::dotenv().ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Could not drop database {url}: {e:?}");
    }
}

/// A unique throwaway database path for one test.
pub fn random_db_path() -> String {
    format!("sqlite://{}/gophermart_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}
