//! WebDoctor Core Library
//!
//! Domain logic for the WebDoctor design critique service: input
//! normalization, the analyze orchestration, and the vision model client.

pub mod analyze;
pub mod config;
pub mod error;
pub mod vision;

pub use error::{WebDoctorError, WebDoctorResult};
