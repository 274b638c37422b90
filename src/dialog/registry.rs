//! Step registry
//!
//! Ordered table from step name to handler. An entry is either a single
//! handler or a sub-table keyed by the callback values that select each
//! handler; keys list several values joined with `__`, and the empty value
//! is a wildcard used only when nothing else matches. Declaration order
//! decides both precedence and the default successor of every step.

use crate::state::DELIMITER;
use crate::utils::errors::{ConsultBotError, Result};

#[derive(Debug, Clone)]
enum Entry<T> {
    Direct(T),
    Keyed(Vec<(String, T)>),
}

#[derive(Debug, Clone)]
pub struct Registry<T> {
    name: String,
    entries: Vec<(String, Entry<T>)>,
}

impl<T> Registry<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a step served by one handler
    pub fn step(mut self, name: &str, handler: T) -> Self {
        self.entries.push((name.to_string(), Entry::Direct(handler)));
        self
    }

    /// Register a step whose handler depends on the callback
    pub fn branch(mut self, name: &str, options: Vec<(&str, T)>) -> Self {
        let options = options
            .into_iter()
            .map(|(key, handler)| (key.to_string(), handler))
            .collect();
        self.entries.push((name.to_string(), Entry::Keyed(options)));
        self
    }

    /// Handler for `name`, refined by the callback for keyed entries
    pub fn resolve(&self, name: &str, callback: Option<&str>) -> Result<&T> {
        let entry = self
            .entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
            .ok_or_else(|| ConsultBotError::UnknownStep {
                dialog: self.name.clone(),
                step: name.to_string(),
            })?;

        match entry {
            Entry::Direct(handler) => Ok(handler),
            Entry::Keyed(options) => {
                let exact = callback.and_then(|callback| {
                    options
                        .iter()
                        .find(|(key, _)| key.split(DELIMITER).any(|option| !option.is_empty() && option == callback))
                });
                let wildcard = || {
                    options
                        .iter()
                        .find(|(key, _)| key.split(DELIMITER).any(str::is_empty))
                };

                exact
                    .or_else(wildcard)
                    .map(|(_, handler)| handler)
                    .ok_or_else(|| ConsultBotError::NoMatchingEntry {
                        step: name.to_string(),
                        callback: callback.map(str::to_string),
                    })
            }
        }
    }

    /// Step declared right after `name`
    pub fn successor(&self, name: &str) -> Option<&str> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        self.entries.get(index + 1).map(|(key, _)| key.as_str())
    }
}
