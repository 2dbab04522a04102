//! PostgreSQL task store for production use.
//!
//! Tasks are schemaless documents stored as JSONB, with the owner email
//! denormalized into an indexed column for filter-by-owner queries.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string. When unset it is composed
//!   from `DB_USER`, `DB_PASSWORD`, `DB_HOST` (default: localhost) and
//!   `DB_NAME` (default: taskmaster)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 1)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::types::{InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate, UpdateAck};
use super::TaskStore;

/// Table definition created at startup when missing.
pub const TASKS_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id          UUID PRIMARY KEY,
    user_email  TEXT,
    document    JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Owner index backing filter-by-owner queries.
pub const TASKS_OWNER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS tasks_user_email_idx ON tasks (user_email)";

/// Configuration for PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 1).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_u64 = |name: &str, default: u64| {
            lookup(name)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(default)
        };
        // Out-of-range pool sizes fall back to the default
        let parse_u32 = |name: &str, default: u32| {
            lookup(name)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(default)
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                let user = lookup("DB_USER").unwrap_or_default();
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let name = lookup("DB_NAME").unwrap_or_else(|| "taskmaster".to_string());
                compose_database_url(&user, &password, &host, &name)
            });

        Self {
            database_url,
            max_connections: parse_u32("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout_secs: parse_u64("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: parse_u64("DB_IDLE_TIMEOUT_SECS", 300),
        }
    }
}

/// Build a connection URL with percent-encoded credentials.
fn compose_database_url(user: &str, password: &str, host: &str, name: &str) -> String {
    let raw = format!("postgresql://{host}/{name}");
    let Ok(mut url) = Url::parse(&raw) else {
        return raw;
    };
    // Both setters only fail for URLs without a host, which `raw` always has
    if !user.is_empty() {
        let _ = url.set_username(user);
    }
    if !password.is_empty() {
        let _ = url.set_password(Some(password));
    }
    url.into()
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL embeds the password
        f.debug_struct("PostgresConfig")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .finish()
    }
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// PostgreSQL task store.
pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create the tasks table and index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        for statement in [TASKS_TABLE_SCHEMA, TASKS_OWNER_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn parse_task_row(row: &sqlx::postgres::PgRow) -> Result<TaskRecord, sqlx::Error> {
        let id: Uuid = row.try_get("id")?;
        let Json(document): Json<TaskDocument> = row.try_get("document")?;
        Ok(TaskRecord::new(TaskId::new(id), document))
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    type Error = PostgresError;

    async fn find_by_owner(&self, user_email: &str) -> Result<Vec<TaskRecord>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, document
            FROM tasks
            WHERE user_email = $1
            "#
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_task_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn insert(&self, document: TaskDocument) -> Result<InsertAck, Self::Error> {
        let record = TaskRecord::new(TaskId::generate(), document);

        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_email, document)
            VALUES ($1, $2, $3)
            "#
        )
        .bind(record.id().as_uuid())
        .bind(record.owner())
        .bind(Json(record.document()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(task_id = %record.id(), "Task inserted");
        Ok(InsertAck::new(record.id()))
    }

    async fn update_fields(
        &self,
        id: &TaskId,
        owner: &str,
        update: &TaskUpdate,
    ) -> Result<UpdateAck, Self::Error> {
        // `@>` skips the write when every supplied field already holds its value
        let row = sqlx::query(
            r#"
            WITH target AS (
                SELECT id, document FROM tasks
                WHERE id = $1 AND user_email = $3
                FOR UPDATE
            ),
            updated AS (
                UPDATE tasks t
                SET document = t.document || $2::jsonb
                FROM target
                WHERE t.id = target.id AND NOT (target.document @> $2::jsonb)
                RETURNING t.id
            )
            SELECT
                (SELECT COUNT(*) FROM target) AS matched,
                (SELECT COUNT(*) FROM updated) AS modified
            "#
        )
        .bind(id.as_uuid())
        .bind(Json(update.fields()))
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateAck::new(matched as u64, modified as u64))
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
