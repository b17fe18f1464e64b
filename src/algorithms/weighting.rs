use crate::models::InteractionKind;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Interaction kind to affinity weight. Kinds outside the table get
/// `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionWeights {
    pub view: f64,
    pub click: f64,
    pub like: f64,
    pub share: f64,
    pub fallback: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            view: 0.1,
            click: 0.3,
            like: 0.7,
            share: 1.0,
            fallback: 0.1,
        }
    }
}

impl InteractionWeights {
    pub fn weight(&self, kind: &InteractionKind) -> f64 {
        match kind {
            InteractionKind::View => self.view,
            InteractionKind::Click => self.click,
            InteractionKind::Like => self.like,
            InteractionKind::Share => self.share,
            InteractionKind::Other(_) => self.fallback,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let entries = [
            ("view", self.view),
            ("click", self.click),
            ("like", self.like),
            ("share", self.share),
            ("fallback", self.fallback),
        ];

        for (name, weight) in entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("weights.{} must be a non-negative number, got {}", name, weight));
            }
        }

        Ok(())
    }
}
