use super::InteractionRepository;
use crate::config::PostgresConfig;
use crate::models::{Interaction, InteractionKind};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, post_id, interaction_type, metadata, created_at FROM user_interaction";

#[derive(Debug, sqlx::FromRow)]
struct InteractionRow {
    id: String,
    user_id: String,
    post_id: String,
    interaction_type: String,
    metadata: Option<serde_json::Value>,
    created_at: NaiveDateTime,
}

impl From<InteractionRow> for Interaction {
    fn from(row: InteractionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            item_id: row.post_id,
            kind: InteractionKind::from(row.interaction_type),
            timestamp: row.created_at.and_utc(),
            metadata: row.metadata,
        }
    }
}

/// Interaction store backed by the `user_interaction` table.
pub struct PostgresInteractionRepository {
    pool: PgPool,
}

impl PostgresInteractionRepository {
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .context("failed to connect to postgres")?;

        info!("Connected to postgres with pool size {}", config.max_connections);
        Ok(Self { pool })
    }
}

fn sql_limit(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

#[async_trait::async_trait]
impl InteractionRepository for PostgresInteractionRepository {
    async fn get_user_interactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Interaction>> {
        let query = format!("{} WHERE user_id = $1 ORDER BY created_at, id LIMIT $2", SELECT_COLUMNS);
        let rows: Vec<InteractionRow> = sqlx::query_as(&query)
            .bind(user_id)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to load interactions for user {}", user_id))?;

        Ok(rows.into_iter().map(Interaction::from).collect())
    }

    async fn get_all_interactions(&self, limit: Option<usize>) -> Result<Vec<Interaction>> {
        let query = format!("{} ORDER BY created_at, id LIMIT $1", SELECT_COLUMNS);
        let rows: Vec<InteractionRow> = sqlx::query_as(&query)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await
            .context("failed to load interactions")?;

        debug!("Loaded {} interactions from postgres", rows.len());
        Ok(rows.into_iter().map(Interaction::from).collect())
    }

    async fn save_interaction(&self, interaction: &Interaction) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_interaction (id, user_id, post_id, interaction_type, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&interaction.id)
        .bind(&interaction.user_id)
        .bind(&interaction.item_id)
        .bind(interaction.kind.as_str())
        .bind(&interaction.metadata)
        .bind(interaction.timestamp.naive_utc())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save interaction {}", interaction.id))?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("postgres health check failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_maps_post_id_and_unknown_kind() {
        let created_at = chrono::DateTime::<chrono::Utc>::from_timestamp(1_700_000_000, 0).unwrap().naive_utc();
        let row = InteractionRow {
            id: "i1".to_string(),
            user_id: "u1".to_string(),
            post_id: "p1".to_string(),
            interaction_type: "bookmark".to_string(),
            metadata: None,
            created_at,
        };

        let interaction = Interaction::from(row);
        assert_eq!(interaction.item_id, "p1");
        assert_eq!(interaction.kind, InteractionKind::Other("bookmark".to_string()));
        assert_eq!(interaction.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_sql_limit() {
        assert_eq!(sql_limit(None), None);
        assert_eq!(sql_limit(Some(25)), Some(25));
    }
}
