//! Definition of interfaces of neural networks.
mod base;
pub use base::{Model1, Model2, ModelBase};
