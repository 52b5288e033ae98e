//! Shared types and domain logic for the Cafeteria Administration backend
//!
//! This crate holds the record types and the pure computations (recipe
//! costing, stock-deduction planning, week arithmetic, loyalty points) so
//! they can be tested without a database.

pub mod loyalty;
pub mod models;
pub mod stock;
pub mod types;
pub mod validation;

pub use loyalty::*;
pub use models::*;
pub use stock::*;
pub use types::*;
pub use validation::*;
