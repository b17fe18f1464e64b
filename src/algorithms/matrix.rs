use super::weighting::InteractionWeights;
use crate::models::{Interaction, MatrixStats};
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::{BTreeSet, HashMap};

/// Dense user x item strength matrix together with the id <-> index maps
/// used to translate between domain ids and matrix coordinates.
///
/// Rows follow the ascending order of user ids, columns the ascending order
/// of item ids, so the same interaction set always yields the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    values: Array2<f64>,
    user_ids: Vec<String>,
    item_ids: Vec<String>,
    user_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
}

impl InteractionMatrix {
    pub fn build(interactions: &[Interaction], weights: &InteractionWeights) -> Self {
        let user_ids: Vec<String> = interactions
            .iter()
            .map(|i| i.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<String> = interactions
            .iter()
            .map(|i| i.item_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_index: HashMap<String, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        let item_index: HashMap<String, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();

        let mut values = Array2::<f64>::zeros((user_ids.len(), item_ids.len()));
        for interaction in interactions {
            let row = user_index[&interaction.user_id];
            let col = item_index[&interaction.item_id];
            values[[row, col]] += weights.weight(&interaction.kind);
        }

        Self {
            values,
            user_ids,
            item_ids,
            user_index,
            item_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn user_row(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn item_col(&self, item_id: &str) -> Option<usize> {
        self.item_index.get(item_id).copied()
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn strength(&self, user_id: &str, item_id: &str) -> f64 {
        match (self.user_row(user_id), self.item_col(item_id)) {
            (Some(row), Some(col)) => self.values[[row, col]],
            _ => 0.0,
        }
    }

    pub fn stats(&self, n_interactions: usize) -> MatrixStats {
        if self.values.is_empty() {
            return MatrixStats {
                n_users: self.n_users(),
                n_items: self.n_items(),
                n_interactions,
                ..Default::default()
            };
        }

        let nonzero = self.values.iter().filter(|&&v| v > 0.0).count();
        let per_user = self
            .values
            .map_axis(Axis(1), |row| row.iter().filter(|&&v| v > 0.0).count() as f64);
        let per_item = self
            .values
            .map_axis(Axis(0), |col| col.iter().filter(|&&v| v > 0.0).count() as f64);

        MatrixStats {
            n_users: self.n_users(),
            n_items: self.n_items(),
            n_interactions,
            sparsity: 1.0 - nonzero as f64 / self.values.len() as f64,
            avg_items_per_user: per_user.mean().unwrap_or(0.0),
            avg_users_per_item: per_item.mean().unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionKind;

    fn interaction(user: &str, item: &str, kind: InteractionKind) -> Interaction {
        Interaction::new(user, item, kind)
    }

    #[test]
    fn test_build_sorts_ids_and_accumulates() {
        let interactions = vec![
            interaction("u2", "p3", InteractionKind::Share),
            interaction("u1", "p2", InteractionKind::View),
            interaction("u1", "p1", InteractionKind::Like),
            interaction("u1", "p1", InteractionKind::Click),
            interaction("u2", "p1", InteractionKind::Other("bookmark".into())),
        ];

        let matrix = InteractionMatrix::build(&interactions, &InteractionWeights::default());

        assert_eq!(matrix.user_ids(), ["u1", "u2"]);
        assert_eq!(matrix.item_ids(), ["p1", "p2", "p3"]);
        assert_eq!(matrix.user_row("u2"), Some(1));
        assert_eq!(matrix.item_col("p3"), Some(2));
        assert!((matrix.strength("u1", "p1") - 1.0).abs() < 1e-12);
        assert_eq!(matrix.strength("u1", "p2"), 0.1);
        assert_eq!(matrix.strength("u1", "p3"), 0.0);
        assert_eq!(matrix.strength("u2", "p1"), 0.1);
        assert_eq!(matrix.strength("u2", "p3"), 1.0);
        assert_eq!(matrix.strength("nobody", "p1"), 0.0);
    }

    #[test]
    fn test_build_is_order_independent() {
        let mut interactions = vec![
            interaction("b", "y", InteractionKind::Like),
            interaction("a", "x", InteractionKind::View),
            interaction("c", "z", InteractionKind::Click),
            interaction("a", "z", InteractionKind::Share),
        ];
        let weights = InteractionWeights::default();
        let forward = InteractionMatrix::build(&interactions, &weights);
        interactions.reverse();
        let backward = InteractionMatrix::build(&interactions, &weights);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_empty_input_gives_empty_matrix() {
        let matrix = InteractionMatrix::build(&[], &InteractionWeights::default());
        assert!(matrix.is_empty());
        assert_eq!(matrix.values().dim(), (0, 0));
        assert_eq!(matrix.stats(0), MatrixStats::default());
    }

    #[test]
    fn test_stats() {
        let interactions = vec![
            interaction("u1", "p1", InteractionKind::Like),
            interaction("u1", "p2", InteractionKind::View),
            interaction("u2", "p1", InteractionKind::Like),
            interaction("u2", "p1", InteractionKind::Like),
        ];
        let matrix = InteractionMatrix::build(&interactions, &InteractionWeights::default());
        let stats = matrix.stats(interactions.len());

        assert_eq!(stats.n_users, 2);
        assert_eq!(stats.n_items, 2);
        assert_eq!(stats.n_interactions, 4);
        assert!((stats.sparsity - 0.25).abs() < 1e-12);
        assert!((stats.avg_items_per_user - 1.5).abs() < 1e-12);
        assert!((stats.avg_users_per_item - 1.5).abs() < 1e-12);
    }
}
