//! HTTP handlers for all API routes.

pub mod system;
pub mod predict;
pub mod patients;
