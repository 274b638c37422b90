//! Concrete dialogs
//!
//! `booking` is the client-facing consultation booking flow, `admin` the
//! catalog and export console for administrators.

pub mod admin;
pub mod booking;

use crate::models::{AgeCategory, Service};
use crate::services::{InlineButton, Keyboard};
use crate::utils::helpers::truncate_text;

/// Longest service name shown on a button
const BUTTON_LABEL_LIMIT: usize = 60;

/// One button per age category, keyed by the category name
pub(crate) fn age_category_buttons() -> Vec<InlineButton> {
    AgeCategory::ALL
        .into_iter()
        .map(|category| InlineButton::callback(category.name(), category.label()))
        .collect()
}

pub(crate) fn age_category_keyboard() -> Keyboard {
    Keyboard::Inline(age_category_buttons())
}

/// One button per service, keyed by the service id
pub(crate) fn service_buttons(services: &[Service]) -> Vec<InlineButton> {
    services
        .iter()
        .map(|service| {
            InlineButton::callback(service.id.to_string(), truncate_text(&service.name, BUTTON_LABEL_LIMIT))
        })
        .collect()
}
