//! Services module
//!
//! Collaborator ports used by the dialog engine and the bundle that carries
//! them into every step.

pub mod appointments;
pub mod catalog;
pub mod export;
pub mod notification;

// Re-export commonly used services
pub use appointments::AppointmentBook;
pub use catalog::Catalog;
pub use export::appointments_csv;
pub use notification::{Document, InlineButton, Keyboard, Messenger, TelegramMessenger};

use std::sync::Arc;
use chrono::{Local, NaiveDate};
use crate::config::Settings;
use crate::state::UserStore;

/// Source of "today" for booking dates and export prompts
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Everything a step may talk to, constructed once at startup
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn Catalog>,
    pub appointments: Arc<dyn AppointmentBook>,
    pub messenger: Arc<dyn Messenger>,
    pub settings: Arc<Settings>,
    pub clock: Clock,
}

impl Services {
    pub fn new(
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn Catalog>,
        appointments: Arc<dyn AppointmentBook>,
        messenger: Arc<dyn Messenger>,
        settings: Settings,
    ) -> Self {
        Self {
            users,
            catalog,
            appointments,
            messenger,
            settings: Arc::new(settings),
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.settings.is_admin(chat_id)
    }
}
