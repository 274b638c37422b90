//! State token codec
//!
//! A user's position in a dialog is persisted as one string:
//! `dialog__step[__contextJSON]`. This is the only module that reads or
//! writes that string; everything else works with [`StateToken`] and
//! [`NextState`].

use crate::utils::errors::{ConsultBotError, Result};
use super::context::Context;

/// Separator between token segments. Dialog and step names may use single
/// underscores but must not contain it, start or end with `_`, or be empty;
/// [`StateToken::encode`] rejects such names.
pub const DELIMITER: &str = "__";

/// Marks a dialog-local target in a raw next-state (`@step`)
const LOCAL_PREFIX: char = '@';

/// Decoded state token
#[derive(Debug, Clone, PartialEq)]
pub struct StateToken {
    pub dialog: String,
    /// `None` for a reset token that only names the dialog
    pub step: Option<String>,
    /// `None` when the token has no context segment
    pub context: Option<Context>,
}

impl StateToken {
    pub fn new(dialog: &str, step: Option<&str>) -> Self {
        Self {
            dialog: dialog.to_string(),
            step: step.map(str::to_string),
            context: None,
        }
    }

    /// Token pointing at a dialog's entry step with an empty context
    pub fn entry(dialog: &str, step: &str) -> Self {
        Self::new(dialog, Some(step))
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Context carried by the token, empty when there is none
    pub fn context(&self) -> Context {
        self.context.clone().unwrap_or_default()
    }

    /// Serialize; the context segment is written whenever one is attached
    pub fn encode(&self) -> Result<String> {
        check_segment(&self.dialog, "dialog")?;
        let mut token = self.dialog.clone();
        if let Some(step) = &self.step {
            check_segment(step, "step")?;
            token.push_str(DELIMITER);
            token.push_str(step);
            if let Some(context) = &self.context {
                token.push_str(DELIMITER);
                token.push_str(&context.to_json()?);
            }
        }
        Ok(token)
    }
}

/// Parse a persisted token into its dialog, step and context
pub fn decode(token: &str) -> Result<StateToken> {
    let mut parts = token.splitn(3, DELIMITER);

    let dialog = parts.next().unwrap_or_default();
    if dialog.is_empty() {
        return Err(invalid(token, "missing dialog name"));
    }

    let step = parts.next().filter(|step| !step.is_empty());

    let context = match parts.next() {
        Some(json) => Some(
            Context::from_json(json).map_err(|e| invalid(token, &e.to_string()))?,
        ),
        None => None,
    };

    Ok(StateToken {
        dialog: dialog.to_string(),
        step: step.map(str::to_string),
        context,
    })
}

/// Serialize a position, omitting the context segment when it is empty
pub fn encode(dialog: &str, step: &str, context: &Context) -> Result<String> {
    let mut token = StateToken::entry(dialog, step);
    if !context.is_empty() {
        token.context = Some(context.clone());
    }
    token.encode()
}

/// A name that would split differently on decode
fn check_segment(name: &str, kind: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('_') || name.ends_with('_') || name.contains(DELIMITER) {
        return Err(invalid(name, &format!("{} name is not delimiter-safe", kind)));
    }
    Ok(())
}

fn invalid(token: &str, reason: &str) -> ConsultBotError {
    ConsultBotError::InvalidStateToken {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

/// Where a step sends the user next
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Step of the dialog that produced it (`@step`)
    Local(String),
    /// Fully qualified position, possibly in another dialog
    Absolute { dialog: String, step: Option<String> },
}

/// The mutable `next_state` of a running step.
///
/// Attaching a context always writes the segment, even an empty `{}`:
/// a step that starts a fresh form is visible in the token.
#[derive(Debug, Clone, PartialEq)]
pub struct NextState {
    target: Target,
    context: Option<Context>,
}

impl NextState {
    /// Dialog-local step
    pub fn step(name: &str) -> Self {
        Self {
            target: Target::Local(name.to_string()),
            context: None,
        }
    }

    /// Parse `@step[__json]` or `dialog__step[__json]`
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.strip_prefix(LOCAL_PREFIX) {
            Some(local) => {
                let mut parts = local.splitn(2, DELIMITER);
                let step = parts.next().unwrap_or_default();
                if step.is_empty() {
                    return Err(invalid(raw, "missing step name"));
                }
                let context = match parts.next() {
                    Some(json) => Some(
                        Context::from_json(json).map_err(|e| invalid(raw, &e.to_string()))?,
                    ),
                    None => None,
                };
                Ok(Self {
                    target: Target::Local(step.to_string()),
                    context,
                })
            }
            None => {
                let token = decode(raw)?;
                Ok(Self {
                    target: Target::Absolute {
                        dialog: token.dialog,
                        step: token.step,
                    },
                    context: token.context,
                })
            }
        }
    }

    /// Attach the context to carry forward, replacing any attached before
    pub fn set_context(&mut self, context: &Context) {
        self.context = Some(context.clone());
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Step name the user lands on
    pub fn step_name(&self) -> Option<&str> {
        match &self.target {
            Target::Local(step) => Some(step),
            Target::Absolute { step, .. } => step.as_deref(),
        }
    }

    /// Qualify against the dialog that is currently running
    pub fn resolve(&self, dialog: &str) -> StateToken {
        let (dialog, step) = match &self.target {
            Target::Local(step) => (dialog.to_string(), Some(step.clone())),
            Target::Absolute { dialog, step } => (dialog.clone(), step.clone()),
        };
        StateToken {
            dialog,
            step,
            context: self.context.clone(),
        }
    }
}
