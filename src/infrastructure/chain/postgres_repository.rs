//! PostgreSQL chain and run-history repositories

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::chain::{Chain, ChainRepository, ChainStep, RunRecord, RunRecordRepository};
use crate::domain::DomainError;

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/chainflow".to_string(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Connects a shared pool for both repositories.
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

const CREATE_CHAINS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_chains (
    id VARCHAR(64) PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    steps JSONB NOT NULL,
    owner_id VARCHAR(128),
    execution_count BIGINT NOT NULL DEFAULT 0,
    last_executed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_RUNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_runs (
    id VARCHAR(64) PRIMARY KEY,
    prompt TEXT NOT NULL,
    action VARCHAR(16) NOT NULL,
    ai_response TEXT NOT NULL,
    api_response TEXT NOT NULL,
    final_result TEXT NOT NULL,
    owner_id VARCHAR(128),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Ensures both tables exist; idempotent, run at startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::query(CREATE_CHAINS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create chains table: {}", e)))?;

    sqlx::query(CREATE_RUNS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create runs table: {}", e)))?;

    Ok(())
}

/// Chain storage backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresChainRepository {
    pool: PgPool,
}

impl PostgresChainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn chain_from_row(row: &PgRow) -> Result<Chain, DomainError> {
        let steps_json: serde_json::Value = row
            .try_get("steps")
            .map_err(|e| DomainError::storage(format!("Failed to read steps column: {}", e)))?;
        let steps: Vec<ChainStep> = serde_json::from_value(steps_json)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize steps: {}", e)))?;

        Ok(Chain {
            id: row
                .try_get("id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            name: row
                .try_get("name")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            description: row
                .try_get("description")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            steps,
            owner_id: row
                .try_get("owner_id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            execution_count: row
                .try_get("execution_count")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            last_executed_at: row
                .try_get("last_executed_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ChainRepository for PostgresChainRepository {
    async fn create(&self, chain: &Chain) -> Result<(), DomainError> {
        let steps = serde_json::to_value(&chain.steps)
            .map_err(|e| DomainError::storage(format!("Failed to serialize steps: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO workflow_chains
                (id, name, description, steps, owner_id, execution_count, last_executed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&chain.id)
        .bind(&chain.name)
        .bind(&chain.description)
        .bind(steps)
        .bind(&chain.owner_id)
        .bind(chain.execution_count)
        .bind(chain.last_executed_at)
        .bind(chain.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create chain: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Chain>, DomainError> {
        let row = sqlx::query("SELECT * FROM workflow_chains WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to fetch chain: {}", e)))?;

        row.as_ref().map(Self::chain_from_row).transpose()
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Chain>, DomainError> {
        let rows = sqlx::query(
            "SELECT * FROM workflow_chains WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list chains: {}", e)))?;

        rows.iter().map(Self::chain_from_row).collect()
    }

    async fn increment_execution_stats(&self, id: &str) -> Result<(), DomainError> {
        // Atomic in-database increment; no read-modify-write race.
        let result = sqlx::query(
            r#"
            UPDATE workflow_chains
            SET execution_count = execution_count + 1, last_executed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update chain stats: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Workflow chain not found"));
        }
        Ok(())
    }
}

/// Run history backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresRunRecordRepository {
    pool: PgPool,
}

impl PostgresRunRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn run_from_row(row: &PgRow) -> Result<RunRecord, DomainError> {
        let action: String = row
            .try_get("action")
            .map_err(|e| DomainError::storage(e.to_string()))?;

        Ok(RunRecord {
            id: row
                .try_get("id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            prompt: row
                .try_get("prompt")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            action: action
                .parse()
                .map_err(|e: DomainError| DomainError::storage(e.to_string()))?,
            ai_response: row
                .try_get("ai_response")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            api_response: row
                .try_get("api_response")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            final_result: row
                .try_get("final_result")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            owner_id: row
                .try_get("owner_id")
                .map_err(|e| DomainError::storage(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| DomainError::storage(e.to_string()))?,
        })
    }
}

#[async_trait]
impl RunRecordRepository for PostgresRunRecordRepository {
    async fn record(&self, run: &RunRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_runs
                (id, prompt, action, ai_response, api_response, final_result, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&run.id)
        .bind(&run.prompt)
        .bind(run.action.as_str())
        .bind(&run.ai_response)
        .bind(&run.api_response)
        .bind(&run.final_result)
        .bind(&run.owner_id)
        .bind(run.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record run: {}", e)))?;

        Ok(())
    }

    async fn recent(
        &self,
        owner_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RunRecord>, DomainError> {
        let rows = match owner_id {
            Some(owner) => {
                sqlx::query(
                    "SELECT * FROM workflow_runs WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2",
                )
                .bind(owner)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM workflow_runs ORDER BY created_at DESC LIMIT $1")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| DomainError::storage(format!("Failed to fetch run history: {}", e)))?;

        rows.iter().map(Self::run_from_row).collect()
    }
}
