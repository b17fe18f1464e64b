pub mod postgres;

pub use postgres::PostgresInteractionRepository;

use crate::models::Interaction;
use anyhow::Result;
use parking_lot::RwLock;

/// Read/write access to recorded user-item interactions.
#[async_trait::async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn get_user_interactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Interaction>>;
    async fn get_all_interactions(&self, limit: Option<usize>) -> Result<Vec<Interaction>>;
    async fn save_interaction(&self, interaction: &Interaction) -> Result<()>;
    /// Cheap reachability check for health endpoints.
    async fn ping(&self) -> Result<()>;
}

/// Process-local interaction store, used by tests and the trainer's
/// fixture mode.
#[derive(Debug, Default)]
pub struct InMemoryInteractionRepository {
    interactions: RwLock<Vec<Interaction>>,
}

impl InMemoryInteractionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interactions(interactions: Vec<Interaction>) -> Self {
        Self {
            interactions: RwLock::new(interactions),
        }
    }

    pub fn len(&self) -> usize {
        self.interactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.read().is_empty()
    }
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn get_user_interactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Interaction>> {
        let interactions = self.interactions.read();
        Ok(interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_all_interactions(&self, limit: Option<usize>) -> Result<Vec<Interaction>> {
        let interactions = self.interactions.read();
        Ok(interactions
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn save_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.interactions.write().push(interaction.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionKind;

    #[tokio::test]
    async fn test_in_memory_repository() {
        let repo = InMemoryInteractionRepository::new();
        assert!(repo.is_empty());
        tokio_test::assert_ok!(repo.ping().await);

        repo.save_interaction(&Interaction::new("u1", "p1", InteractionKind::Like)).await.unwrap();
        repo.save_interaction(&Interaction::new("u2", "p1", InteractionKind::View)).await.unwrap();
        repo.save_interaction(&Interaction::new("u1", "p2", InteractionKind::Share)).await.unwrap();

        assert_eq!(repo.len(), 3);
        assert_eq!(repo.get_all_interactions(None).await.unwrap().len(), 3);
        assert_eq!(repo.get_all_interactions(Some(2)).await.unwrap().len(), 2);

        let user = repo.get_user_interactions("u1", None).await.unwrap();
        assert_eq!(user.len(), 2);
        assert!(user.iter().all(|i| i.user_id == "u1"));
        assert_eq!(repo.get_user_interactions("u1", Some(1)).await.unwrap().len(), 1);
    }
}
