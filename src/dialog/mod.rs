//! Dialog engine
//!
//! Generic machinery shared by every dialog: step handlers and their
//! lifecycle, step registries and the routers that pick a handler for an
//! inbound event.

pub mod registry;
pub mod router;
pub mod step;

pub use registry::Registry;
pub use router::{
    Command, Dialog, DialogRequest, Inbound, InboundEvent, StepDialog, TopLevelRouter, TurnOutcome,
    GENERIC_FAILURE_MESSAGE,
};
pub use step::{
    process, Notice, Redirect, StepConfig, StepHandler, StepOutcome, Turn, UserIdentity, Validation,
    DEFAULT_INVALID_MESSAGE,
};
