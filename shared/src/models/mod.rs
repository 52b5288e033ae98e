//! Domain models for the Cafeteria Administration backend

mod attendance;
mod customer;
mod employee;
mod inventory;
mod product;
mod sale;
mod schedule;

pub use attendance::*;
pub use customer::*;
pub use employee::*;
pub use inventory::*;
pub use product::*;
pub use sale::*;
pub use schedule::*;
