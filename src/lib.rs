#![allow(clippy::empty_line_after_doc_comments)]
#![allow(clippy::doc_lazy_continuation)]
#![allow(clippy::nonminimal_bool)]
// src/lib.rs

pub mod blockchain;
pub mod cli;
pub mod core;
pub mod orchestrator;

pub use crate::core::errors::BridgeError;
pub use crate::orchestrator::{BridgeOrchestrator, Collaborators, SubmissionPhase};
