//! Dialog routing
//!
//! [`StepDialog`] turns a decoded position into a handler call through its
//! registry. [`TopLevelRouter`] sits in front of every dialog: it loads the
//! user's token, handles commands, picks the dialog and converts failures
//! into replies or errors.

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, info, warn};
use crate::dialogs::{admin, booking};
use crate::services::{Keyboard, Services};
use crate::state::{decode, Context, NextState, StateToken};
use crate::utils::errors::{ConsultBotError, Result};
use crate::utils::logging;
use super::registry::Registry;
use super::step::{process, StepHandler, StepOutcome, Turn, UserIdentity};

/// Reply sent when a collaborator fails mid-turn
pub const GENERIC_FAILURE_MESSAGE: &str = "Произошла ошибка. Попробуйте ещё раз позже.";

/// Decoded input for one dialog turn
#[derive(Debug, Clone)]
pub struct DialogRequest {
    pub user: UserIdentity,
    /// `None` routes to the dialog's entry step
    pub step: Option<String>,
    pub context: Context,
    pub message: Option<String>,
    pub callback: Option<String>,
}

/// A named flow the top-level router can dispatch to
#[async_trait]
pub trait Dialog: Send + Sync {
    fn name(&self) -> &str;

    fn entry_step(&self) -> &str;

    /// Only administrators may enter
    fn admin_only(&self) -> bool {
        false
    }

    async fn handle(&self, request: DialogRequest, services: &Services) -> Result<StepOutcome>;
}

/// Dialog backed by a step registry of one handler enum
pub struct StepDialog<S> {
    registry: Registry<S>,
    entry_step: &'static str,
    admin_only: bool,
}

impl<S: StepHandler> StepDialog<S> {
    pub fn new(registry: Registry<S>, entry_step: &'static str) -> Self {
        Self {
            registry,
            entry_step,
            admin_only: false,
        }
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }
}

#[async_trait]
impl<S: StepHandler> Dialog for StepDialog<S> {
    fn name(&self) -> &str {
        self.registry.name()
    }

    fn entry_step(&self) -> &str {
        self.entry_step
    }

    fn admin_only(&self) -> bool {
        self.admin_only
    }

    async fn handle(&self, request: DialogRequest, services: &Services) -> Result<StepOutcome> {
        let step_name = request.step.as_deref().unwrap_or(self.entry_step);
        let step = *self.registry.resolve(step_name, request.callback.as_deref())?;

        let next_state = step
            .config()
            .next_state
            .or_else(|| self.registry.successor(step_name))
            .map(NextState::step);

        debug!(
            user_id = request.user.id,
            dialog = self.name(),
            step = step_name,
            handler = ?step,
            callback = ?request.callback,
            "Resolved step handler"
        );

        let turn = Turn::new(
            step,
            request.user,
            request.message,
            request.callback,
            request.context,
            next_state,
        );
        process(self.name(), step, turn, services).await
    }
}

/// Bot commands that reset or shortcut the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Menu,
    AdminMenu,
    /// Put an admin on the admin menu step without replying
    AdminShortcut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Callback(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserIdentity,
    pub kind: Inbound,
}

impl InboundEvent {
    pub fn text(user: UserIdentity, text: impl Into<String>) -> Self {
        Self { user, kind: Inbound::Text(text.into()) }
    }

    pub fn callback(user: UserIdentity, data: impl Into<String>) -> Self {
        Self { user, kind: Inbound::Callback(data.into()) }
    }

    pub fn command(user: UserIdentity, command: Command) -> Self {
        Self { user, kind: Inbound::Command(command) }
    }
}

/// What the top-level router did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A step accepted the input; `state` is the token now persisted
    Advanced { state: Option<String> },
    /// The input was rejected with the step's invalid-input message
    Rejected,
    /// A collaborator failed and the user got the generic failure reply
    Failed,
    /// The token was overwritten without running a step
    StateReset { state: String },
    Ignored,
}

pub struct TopLevelRouter {
    dialogs: Registry<Arc<dyn Dialog>>,
    services: Services,
}

impl TopLevelRouter {
    pub fn new(services: Services) -> Self {
        let dialogs = Registry::new("dialogs")
            .step(booking::DIALOG, Arc::new(booking::dialog()) as Arc<dyn Dialog>)
            .step(admin::DIALOG, Arc::new(admin::dialog()) as Arc<dyn Dialog>);
        Self { dialogs, services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one inbound event to completion, redirects included.
    ///
    /// Routing failures are returned as errors; collaborator failures are
    /// logged and answered with [`GENERIC_FAILURE_MESSAGE`].
    pub async fn handle(&self, event: InboundEvent) -> Result<TurnOutcome> {
        let InboundEvent { user, kind } = event;
        match kind {
            Inbound::Command(command) => self.handle_command(user, command).await,
            Inbound::Text(text) => self.route(user, Some(text), None).await,
            Inbound::Callback(data) => self.route(user, None, Some(data)).await,
        }
    }

    async fn handle_command(&self, user: UserIdentity, command: Command) -> Result<TurnOutcome> {
        info!(user_id = user.id, command = ?command, "Command received");
        let is_admin = self.services.is_admin(user.id);

        match command {
            Command::Start | Command::AdminMenu if is_admin => self.enter(user, admin::DIALOG).await,
            Command::Start | Command::Menu | Command::AdminMenu => self.enter(user, booking::DIALOG).await,
            Command::AdminShortcut if is_admin => {
                let token = StateToken::entry(admin::DIALOG, admin::ENTRY_STEP).encode()?;
                if let Err(e) = self.save_state(&user, &token).await {
                    return self.fail(&user, "reset_state", e).await;
                }
                logging::log_admin_action(user.id, "admin_shortcut", Some(&token));
                Ok(TurnOutcome::StateReset { state: token })
            }
            Command::AdminShortcut => {
                warn!(user_id = user.id, "Admin shortcut used by a non-admin");
                Ok(TurnOutcome::Ignored)
            }
        }
    }

    /// Reset the user to a dialog's entry step and run it with no input
    async fn enter(&self, user: UserIdentity, dialog_name: &str) -> Result<TurnOutcome> {
        let dialog = self.dialog(dialog_name)?;
        let token = StateToken::entry(dialog.name(), dialog.entry_step());

        let encoded = token.encode()?;
        if let Err(e) = self.save_state(&user, &encoded).await {
            return self.fail(&user, "reset_state", e).await;
        }

        self.dispatch(user, token, None, None).await
    }

    async fn route(&self, user: UserIdentity, message: Option<String>, callback: Option<String>) -> Result<TurnOutcome> {
        let raw = match self.load_state(&user).await {
            Ok(raw) => raw,
            Err(e) => return self.fail(&user, "load_state", e).await,
        };

        let token = match decode(&raw) {
            Ok(token) => token,
            Err(e) => return self.fail(&user, "decode_state", e).await,
        };

        self.dispatch(user, token, message, callback).await
    }

    async fn dispatch(
        &self,
        user: UserIdentity,
        token: StateToken,
        message: Option<String>,
        callback: Option<String>,
    ) -> Result<TurnOutcome> {
        let raw = token.encode().unwrap_or_else(|_| token.dialog.clone());

        let mut dialog = match self.dialog(&token.dialog) {
            Ok(dialog) => dialog,
            Err(e) => {
                logging::log_routing_failure(user.id, &raw, &e);
                return Err(e);
            }
        };

        let mut request = DialogRequest {
            user: user.clone(),
            step: token.step.clone(),
            context: token.context(),
            message,
            callback,
        };

        if dialog.admin_only() && !self.services.is_admin(user.id) {
            warn!(user_id = user.id, dialog = dialog.name(), "Non-admin routed away from admin dialog");
            dialog = self.dialog(booking::DIALOG)?;
            request.step = None;
            request.context = Context::new();
            request.message = None;
            request.callback = None;
        }

        let dialog_name = dialog.name().to_string();
        let step_name = request.step.clone();

        match dialog.handle(request, &self.services).await {
            Ok(StepOutcome::Completed { state }) => Ok(TurnOutcome::Advanced { state }),
            Ok(StepOutcome::Rejected { message }) => {
                logging::log_validation_failure(user.id, &dialog_name, step_name.as_deref());
                if let Err(e) = self.services.messenger.send_text(user.id, &message, &Keyboard::None).await {
                    return self.fail(&user, "send_invalid_message", e).await;
                }
                Ok(TurnOutcome::Rejected)
            }
            Err(e) if e.is_routing_failure() => {
                logging::log_routing_failure(user.id, &raw, &e);
                Err(e)
            }
            Err(e) => self.fail(&user, "dialog_step", e).await,
        }
    }

    fn dialog(&self, name: &str) -> Result<Arc<dyn Dialog>> {
        self.dialogs
            .resolve(name, None)
            .cloned()
            .map_err(|_| ConsultBotError::UnknownDialog(name.to_string()))
    }

    /// Persisted token, creating the user on first contact
    async fn load_state(&self, user: &UserIdentity) -> Result<String> {
        if let Some(state) = self.services.users.get_state(user.id).await? {
            return Ok(state);
        }

        let token = StateToken::entry(booking::DIALOG, booking::ENTRY_STEP).encode()?;
        self.services
            .users
            .create_user(user.id, &token, user.username.as_deref())
            .await?;
        info!(user_id = user.id, state = %token, "New user registered");
        Ok(token)
    }

    async fn save_state(&self, user: &UserIdentity, token: &str) -> Result<()> {
        let users = &self.services.users;
        match users.get_state(user.id).await? {
            Some(_) => users.set_state(user.id, token, user.username.as_deref()).await,
            None => users.create_user(user.id, token, user.username.as_deref()).await,
        }
    }

    async fn fail(&self, user: &UserIdentity, stage: &str, error: ConsultBotError) -> Result<TurnOutcome> {
        logging::log_collaborator_failure(user.id, stage, &error);
        if let Err(e) = self
            .services
            .messenger
            .send_text(user.id, GENERIC_FAILURE_MESSAGE, &Keyboard::None)
            .await
        {
            warn!(user_id = user.id, error = %e, "Failed to deliver failure notice");
        }
        Ok(TurnOutcome::Failed)
    }
}
