//! Value networks.
mod deterministic;
mod gaussian;
pub use deterministic::{DeterministicCritic, DeterministicCriticConfig};
pub use gaussian::{GaussianCritic, GaussianCriticConfig};
