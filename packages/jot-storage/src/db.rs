use std::str::FromStr;

use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{Error, Result, schema};

#[derive(Clone)]
pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &jot_config::Storage) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(&cfg.dsn)
			.map_err(|err| Error::InvalidArgument(format!("Invalid storage dsn: {err}.")))?
			.create_if_missing(true);
		// Every connection to an in-memory database opens a separate database, so the pool
		// is pinned to one long-lived connection.
		let in_memory = is_in_memory(&cfg.dsn);
		let max_connections = if in_memory { 1 } else { cfg.pool_max_conns };
		let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);

		if in_memory {
			pool_options = pool_options.idle_timeout(None).max_lifetime(None);
		}

		let pool = pool_options.connect_with(options).await?;

		tracing::debug!(in_memory, max_connections, "Storage pool connected.");

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		for statement in schema::statements(schema::render_schema()) {
			sqlx::query(statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}

fn is_in_memory(dsn: &str) -> bool {
	dsn.contains(":memory:") || dsn.contains("mode=memory")
}
