//! tamiz-web: JSON API in front of the screening pipeline.
//!   - Prediction with recommendation
//!   - Canonical input column listing
//!   - Demo patient lookup from the reference dataset
//!   - Health

pub mod router;
pub mod handlers;
pub mod state;
pub mod error;
