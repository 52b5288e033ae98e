//! HTTP request handlers

pub mod attendance;
pub mod customer;
pub mod employee;
pub mod health;
pub mod product;
pub mod reporting;
pub mod sale;
pub mod schedule;
pub mod supply;

pub use attendance::*;
pub use customer::*;
pub use employee::*;
pub use health::*;
pub use product::*;
pub use reporting::*;
pub use sale::*;
pub use schedule::*;
pub use supply::*;
