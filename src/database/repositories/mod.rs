//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod user;
pub mod service;
pub mod appointment;

// Re-export repositories
pub use user::UserRepository;
pub use service::ServiceRepository;
pub use appointment::AppointmentRepository;
