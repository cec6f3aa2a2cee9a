use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use helix_admin::db::{DbPool, PoolSettings, establish_connection_pool};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Migrated SQLite database in a temporary directory, removed on drop.
pub struct TestDb {
    pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join(name);
        let settings = PoolSettings {
            max_connections: 2,
            wal: false,
            ..PoolSettings::default()
        };
        let pool = establish_connection_pool(&path.to_string_lossy(), &settings)
            .expect("connection pool");

        let mut conn = pool.get().expect("connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("migrations apply");

        Self { pool, _dir: dir }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}
