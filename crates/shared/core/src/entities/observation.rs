use serde::{Deserialize, Serialize};

/// Auxiliary per-product observation delivered alongside the books
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Environmental sunlight index
    #[serde(default)]
    pub sunlight_index: Option<f64>,
}

impl Observation {
    pub fn sunlight(index: f64) -> Self {
        Self {
            sunlight_index: Some(index),
        }
    }
}
