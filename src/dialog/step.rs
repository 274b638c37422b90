//! Step handlers and their lifecycle
//!
//! A step is one question of a dialog. Every dialog declares its steps as a
//! closed enum implementing [`StepHandler`]; [`process`] drives one inbound
//! event through the handler resolved for the user's current step:
//! validate, run business logic, reply, persist the next token, send the
//! attachment, then follow any redirect within the same event.

use std::fmt;
use async_trait::async_trait;
use tracing::{debug, warn};
use crate::services::{Document, Keyboard, Services};
use crate::state::{Context, NextState};
use crate::utils::errors::Result;
use crate::utils::logging;

/// Default reply to a rejected answer
pub const DEFAULT_INVALID_MESSAGE: &str = "некорректный ответ";

/// Result of checking the user's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

/// Static description of a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    pub text: &'static str,
    pub invalid_message: &'static str,
    /// Step that always follows this one, overriding the registry successor
    pub next_state: Option<&'static str>,
    pub keyboard: Keyboard,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            text: "",
            invalid_message: DEFAULT_INVALID_MESSAGE,
            next_state: None,
            keyboard: Keyboard::None,
        }
    }
}

/// Who sent the inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub username: Option<String>,
}

impl UserIdentity {
    pub fn new(id: i64, username: Option<String>) -> Self {
        Self { id, username }
    }
}

/// Extra message queued by business logic, sent before the main reply
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Keyboard,
}

/// Handler to chain into once the current one has replied
#[derive(Debug, Clone)]
pub struct Redirect<S> {
    pub step: S,
    /// Used when the target has no fixed next step of its own
    pub next_state: Option<NextState>,
}

/// Mutable state of one handler invocation
#[derive(Debug, Clone)]
pub struct Turn<S> {
    pub user: UserIdentity,
    pub message: Option<String>,
    pub callback: Option<String>,
    pub context: Context,
    pub next_state: Option<NextState>,
    pub text: String,
    pub keyboard: Keyboard,
    pub notices: Vec<Notice>,
    pub document: Option<Document>,
    pub redirect: Option<Redirect<S>>,
}

impl<S: StepHandler> Turn<S> {
    pub fn new(
        step: S,
        user: UserIdentity,
        message: Option<String>,
        callback: Option<String>,
        context: Context,
        next_state: Option<NextState>,
    ) -> Self {
        let config = step.config();
        Self {
            user,
            message,
            callback,
            context,
            next_state,
            text: config.text.to_string(),
            keyboard: config.keyboard,
            notices: Vec::new(),
            document: None,
            redirect: None,
        }
    }

    /// Turn for a redirect target: same input and context, fresh reply
    fn chained(&self, redirect: Redirect<S>) -> (S, Self) {
        let next_state = redirect
            .step
            .config()
            .next_state
            .map(NextState::step)
            .or(redirect.next_state);
        let turn = Self::new(
            redirect.step,
            self.user.clone(),
            self.message.clone(),
            self.callback.clone(),
            self.context.clone(),
            next_state,
        );
        (redirect.step, turn)
    }

    /// Trimmed text answer, if the user typed a non-blank one
    pub fn text_answer(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn callback_is(&self, value: &str) -> bool {
        self.callback.as_deref() == Some(value)
    }

    /// Replace the context and carry it into the next token
    pub fn set_context(&mut self, context: Context) {
        self.context = context;
        self.carry_context();
    }

    /// Carry the current context into the next token
    pub fn carry_context(&mut self) {
        if let Some(next_state) = self.next_state.as_mut() {
            next_state.set_context(&self.context);
        }
    }

    /// Send the user to another step of the same dialog, dropping any
    /// context attached so far
    pub fn goto(&mut self, step: &str) {
        self.next_state = Some(NextState::step(step));
    }

    pub fn notify(&mut self, chat_id: i64, text: impl Into<String>) {
        self.notices.push(Notice {
            chat_id,
            text: text.into(),
            keyboard: Keyboard::None,
        });
    }

    /// Queue a message to the user that precedes the main reply
    pub fn notify_user(&mut self, text: impl Into<String>) {
        let chat_id = self.user.id;
        self.notify(chat_id, text);
    }

    pub fn redirect(&mut self, step: S) {
        self.redirect = Some(Redirect {
            step,
            next_state: None,
        });
    }

    pub fn redirect_to(&mut self, step: S, next_state: &str) {
        self.redirect = Some(Redirect {
            step,
            next_state: Some(NextState::step(next_state)),
        });
    }
}

/// Behavior of one step of a dialog
#[async_trait]
pub trait StepHandler: Copy + fmt::Debug + Send + Sync + 'static {
    fn config(&self) -> StepConfig;

    /// Check the inbound answer before anything else runs
    fn validate(&self, _turn: &Turn<Self>) -> Validation {
        Validation::Valid
    }

    /// Side effects and reply shaping; may still reject the answer
    async fn business_logic(&self, _turn: &mut Turn<Self>, _services: &Services) -> Result<Validation> {
        Ok(Validation::Valid)
    }

    /// Rejection carrying this step's invalid-input message
    fn reject(&self) -> Validation {
        Validation::Invalid(self.config().invalid_message.to_string())
    }

    fn accept_if(&self, valid: bool) -> Validation {
        if valid {
            Validation::Valid
        } else {
            self.reject()
        }
    }
}

/// What happened to an inbound event inside a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The answer was accepted; `state` is the last token persisted
    Completed { state: Option<String> },
    /// The answer was rejected and nothing was persisted
    Rejected { message: String },
}

/// Run a handler's full lifecycle, then any redirect chain it starts
pub async fn process<S: StepHandler>(
    dialog: &str,
    step: S,
    mut turn: Turn<S>,
    services: &Services,
) -> Result<StepOutcome> {
    if let Validation::Invalid(message) = step.validate(&turn) {
        return Ok(StepOutcome::Rejected { message });
    }
    if let Validation::Invalid(message) = step.business_logic(&mut turn, services).await? {
        return Ok(StepOutcome::Rejected { message });
    }

    let mut state = deliver(dialog, step, &mut turn, services).await?;
    let mut current = step;

    while let Some(redirect) = turn.redirect.take() {
        let (target, mut chained) = turn.chained(redirect);
        debug!(user_id = turn.user.id, dialog = dialog, from = ?current, to = ?target, "Following redirect");

        let mut verdict = target.validate(&chained);
        if verdict.is_valid() {
            verdict = target.business_logic(&mut chained, services).await?;
        }
        if let Validation::Invalid(message) = verdict {
            services
                .messenger
                .send_text(chained.user.id, &message, &Keyboard::None)
                .await?;
            break;
        }

        if let Some(token) = deliver(dialog, target, &mut chained, services).await? {
            state = Some(token);
        }
        current = target;
        turn = chained;
    }

    Ok(StepOutcome::Completed { state })
}

/// Reply, persist and attach; returns the persisted token
async fn deliver<S: StepHandler>(
    dialog: &str,
    step: S,
    turn: &mut Turn<S>,
    services: &Services,
) -> Result<Option<String>> {
    let messenger = &services.messenger;

    for notice in turn.notices.drain(..) {
        messenger
            .send_text(notice.chat_id, &notice.text, &notice.keyboard)
            .await?;
    }

    if turn.text.is_empty() {
        debug!(user_id = turn.user.id, dialog = dialog, step = ?step, "Step has no reply text");
    } else {
        messenger.send_text(turn.user.id, &turn.text, &turn.keyboard).await?;
    }

    let state = match &turn.next_state {
        Some(next_state) => {
            let token = next_state.resolve(dialog).encode()?;
            services
                .users
                .set_state(turn.user.id, &token, turn.user.username.as_deref())
                .await?;
            Some(token)
        }
        None => {
            warn!(user_id = turn.user.id, dialog = dialog, step = ?step, "Step has no successor, state left unchanged");
            None
        }
    };
    logging::log_turn(turn.user.id, dialog, Some(format!("{:?}", step).as_str()), state.as_deref());

    if let Some(document) = &turn.document {
        messenger.send_document(turn.user.id, document).await?;
    }

    Ok(state)
}
