//! Scoring, aggregation and feedback for school teacher evaluations.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod feedback;
pub mod models;
pub mod propagation;
pub mod report;
pub mod roster;
pub mod scoring;
pub mod templates;
pub mod tier;

pub use error::{EvaluationError, Result};
