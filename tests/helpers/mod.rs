//! Test helpers module
//!
//! In-memory collaborators for driving the dialog engine without Telegram
//! or PostgreSQL, plus a builder that wires them into a router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use chrono::NaiveDate;
use ConsultBot::config::Settings;
use ConsultBot::dialog::{InboundEvent, Command, TopLevelRouter, TurnOutcome, UserIdentity};
use ConsultBot::models::{AgeCategory, Appointment, AppointmentRecord, CreateAppointmentRequest, Service, ServiceDraft};
use ConsultBot::services::{AppointmentBook, Catalog, Clock, Document, Keyboard, Messenger, Services};
use ConsultBot::state::{decode, Context, UserStore};
use ConsultBot::{ConsultBotError, Result};

pub const ADMIN_ID: i64 = 1;
pub const CLIENT_ID: i64 = 500;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn date(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn offline() -> ConsultBotError {
    ConsultBotError::Io(std::io::Error::new(std::io::ErrorKind::Other, "store offline"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredUser {
    pub state: String,
    pub previous_state: Option<String>,
    pub username: Option<String>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<i64, StoredUser>>,
    fail_writes: Mutex<bool>,
}

impl MemoryUserStore {
    pub fn user(&self, telegram_id: i64) -> Option<StoredUser> {
        self.users.lock().unwrap().get(&telegram_id).cloned()
    }

    pub fn state(&self, telegram_id: i64) -> Option<String> {
        self.user(telegram_id).map(|user| user.state)
    }

    /// Decoded context of the persisted token
    pub fn context(&self, telegram_id: i64) -> Context {
        let state = self.state(telegram_id).expect("user has no state");
        decode(&state).expect("persisted token decodes").context()
    }

    pub fn put(&self, telegram_id: i64, state: &str) {
        self.users.lock().unwrap().insert(
            telegram_id,
            StoredUser {
                state: state.to_string(),
                previous_state: None,
                username: None,
            },
        );
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_state(&self, telegram_id: i64) -> Result<Option<String>> {
        Ok(self.state(telegram_id))
    }

    async fn set_state(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(offline());
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&telegram_id)
            .ok_or(ConsultBotError::UserNotFound { user_id: telegram_id })?;
        user.previous_state = Some(std::mem::replace(&mut user.state, state.to_string()));
        if let Some(username) = username {
            user.username = Some(username.to_string());
        }
        Ok(())
    }

    async fn create_user(&self, telegram_id: i64, state: &str, username: Option<&str>) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(offline());
        }
        self.users.lock().unwrap().insert(
            telegram_id,
            StoredUser {
                state: state.to_string(),
                previous_state: None,
                username: username.map(str::to_string),
            },
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    services: Mutex<Vec<Service>>,
    calls: Mutex<usize>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryCatalog {
    pub fn add(&self, category: AgeCategory, name: &str, link: Option<&str>) -> Service {
        let mut services = self.services.lock().unwrap();
        let id = services.iter().map(|service| service.id).max().unwrap_or(0) + 1;
        let service = Service {
            id,
            age_category: category,
            name: name.to_string(),
            description: format!("{} description", name),
            is_link: link.is_some(),
            link: link.map(str::to_string),
        };
        services.push(service.clone());
        service
    }

    pub fn all(&self) -> Vec<Service> {
        self.services.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    fn touch(&self) {
        *self.calls.lock().unwrap() += 1;
    }

    fn read(&self) -> Result<Vec<Service>> {
        self.touch();
        if *self.fail_reads.lock().unwrap() {
            return Err(offline());
        }
        Ok(self.all())
    }

    fn write(&self) -> Result<()> {
        self.touch();
        if *self.fail_writes.lock().unwrap() {
            return Err(offline());
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_services(&self) -> Result<Vec<Service>> {
        self.read()
    }

    async fn services_by_category(&self, category: AgeCategory) -> Result<Vec<Service>> {
        Ok(self.read()?.into_iter().filter(|service| service.age_category == category).collect())
    }

    async fn get_service(&self, id: i32) -> Result<Option<Service>> {
        Ok(self.read()?.into_iter().find(|service| service.id == id))
    }

    async fn create_service(&self, draft: &ServiceDraft) -> Result<Service> {
        self.write()?;
        let service = self.add(draft.age_category, &draft.name, draft.link.as_deref());
        let mut services = self.services.lock().unwrap();
        let stored = services.iter_mut().find(|s| s.id == service.id).unwrap();
        stored.description = draft.description.clone();
        stored.is_link = draft.is_link;
        Ok(stored.clone())
    }

    async fn update_service(&self, id: i32, draft: &ServiceDraft) -> Result<Service> {
        self.write()?;
        let mut services = self.services.lock().unwrap();
        let service = services
            .iter_mut()
            .find(|service| service.id == id)
            .ok_or(ConsultBotError::ServiceNotFound { service_id: id })?;
        service.age_category = draft.age_category;
        service.name = draft.name.clone();
        service.description = draft.description.clone();
        service.is_link = draft.is_link;
        service.link = draft.link.clone();
        Ok(service.clone())
    }

    async fn delete_service(&self, id: i32) -> Result<()> {
        self.write()?;
        self.services.lock().unwrap().retain(|service| service.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAppointments {
    appointments: Mutex<Vec<Appointment>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryAppointments {
    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.appointments.lock().unwrap().clone()
    }

    pub fn add(&self, client_name: &str, date: NaiveDate) {
        let mut appointments = self.appointments.lock().unwrap();
        let id = appointments.len() as i32 + 1;
        appointments.push(Appointment {
            id,
            service_id: None,
            client_name: client_name.to_string(),
            problem_description: "problem".to_string(),
            request: "request".to_string(),
            phone_number: "+7 900 000-00-00".to_string(),
            username: None,
            date,
        });
    }
}

#[async_trait]
impl AppointmentBook for MemoryAppointments {
    async fn create_appointment(&self, request: &CreateAppointmentRequest) -> Result<Appointment> {
        if *self.fail_writes.lock().unwrap() {
            return Err(offline());
        }
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = Appointment {
            id: appointments.len() as i32 + 1,
            service_id: Some(request.service_id),
            client_name: request.client_name.clone(),
            problem_description: request.problem_description.clone(),
            request: request.request.clone(),
            phone_number: request.phone_number.clone(),
            username: request.username.clone(),
            date: request.date,
        };
        appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn appointments_between(&self, since: NaiveDate, until: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(offline());
        }
        let mut records: Vec<AppointmentRecord> = self
            .all()
            .into_iter()
            .filter(|appointment| appointment.date > since && appointment.date < until)
            .map(|appointment| AppointmentRecord {
                username: appointment.username,
                client_name: appointment.client_name,
                service_name: String::new(),
                problem_description: appointment.problem_description,
                request: appointment.request,
                phone_number: appointment.phone_number,
                date: appointment.date,
            })
            .collect();
        records.sort_by_key(|record| record.date);
        Ok(records)
    }

    async fn earliest_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.all().into_iter().map(|appointment| appointment.date).min())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat_id: i64, text: String, keyboard: Keyboard },
    Document { chat_id: i64, document: Document },
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Drain everything sent so far
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Texts sent to one chat, in order
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { chat_id: to, text, .. } if to == chat_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_keyboard(&self, chat_id: i64) -> Option<Keyboard> {
        self.sent().into_iter().rev().find_map(|sent| match sent {
            Sent::Text { chat_id: to, keyboard, .. } if to == chat_id => Some(keyboard),
            _ => None,
        })
    }

    pub fn documents(&self) -> Vec<Document> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Document { document, .. } => Some(document),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, document: &Document) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Document {
            chat_id,
            document: document.clone(),
        });
        Ok(())
    }
}

/// Router wired to in-memory collaborators
pub struct TestBot {
    pub users: Arc<MemoryUserStore>,
    pub catalog: Arc<MemoryCatalog>,
    pub appointments: Arc<MemoryAppointments>,
    pub messenger: Arc<RecordingMessenger>,
    pub router: TopLevelRouter,
}

impl TestBot {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let appointments = Arc::new(MemoryAppointments::default());
        let messenger = Arc::new(RecordingMessenger::default());

        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings.bot.admin_ids = vec![ADMIN_ID];

        let services = Services::new(
            users.clone(),
            catalog.clone(),
            appointments.clone(),
            messenger.clone(),
            settings,
        )
        .with_clock(Clock::Fixed(today()));

        Self {
            users,
            catalog,
            appointments,
            messenger,
            router: TopLevelRouter::new(services),
        }
    }

    pub fn user(id: i64) -> UserIdentity {
        let username = if id == ADMIN_ID { "admin" } else { "client" };
        UserIdentity::new(id, Some(username.to_string()))
    }

    pub async fn command(&self, id: i64, command: Command) -> Result<TurnOutcome> {
        self.router.handle(InboundEvent::command(Self::user(id), command)).await
    }

    pub async fn text(&self, id: i64, text: &str) -> Result<TurnOutcome> {
        self.router.handle(InboundEvent::text(Self::user(id), text)).await
    }

    pub async fn press(&self, id: i64, data: &str) -> Result<TurnOutcome> {
        self.router.handle(InboundEvent::callback(Self::user(id), data)).await
    }

    pub fn state(&self, id: i64) -> Option<String> {
        self.users.state(id)
    }
}
