//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod service;
pub mod appointment;

// Re-export commonly used models
pub use user::{User, CreateUserRequest};
pub use service::{AgeCategory, Service, ServiceDraft};
pub use appointment::{Appointment, AppointmentRecord, CreateAppointmentRequest};
