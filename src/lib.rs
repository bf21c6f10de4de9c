//! # Seating Library
//!
//! Restaurant seating: tables, parties, reservations, the walk-in waiting
//! list, and the engine that assigns parties to tables.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
