use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};

use crate::entities::{mode, sync_status, task};

/// Local storage handle owning the sqlite connection pool.
///
/// Constructed once at startup and passed by reference to the sync engine;
/// there is no global handle.
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the database at `database_url` and initialize the schema.
    pub async fn new(database_url: &str) -> Result<Self> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .max_connections(4)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open a private shared-cache in-memory database. Each call gets a fresh
    /// database; the shared cache keeps all pool connections on the same one.
    pub async fn in_memory() -> Result<Self> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let url = format!("sqlite:file:modalist_memdb_{n}?mode=memory&cache=shared");
        Self::new(&url).await
    }

    /// Create tables from the entity definitions if they do not exist yet.
    async fn init_schema(&self) -> Result<()> {
        let builder = self.conn.get_database_backend();
        let schema = Schema::new(builder);

        // Modes before tasks: tasks carry a foreign key into modes.
        let mut statements = vec![
            schema.create_table_from_entity(mode::Entity),
            schema.create_table_from_entity(task::Entity),
            schema.create_table_from_entity(sync_status::Entity),
        ];
        for statement in &mut statements {
            statement.if_not_exists();
            self.conn.execute(builder.build(&*statement)).await?;
        }

        Ok(())
    }
}
