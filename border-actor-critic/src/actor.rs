//! Policy networks.
mod deterministic;
mod gaussian;
pub use deterministic::{DeterministicActor, DeterministicActorConfig};
pub use gaussian::{ActLogStd, ActMean, ActStd, GaussianActor, GaussianActorConfig};
