//! hangar-core: squadron maintenance backend library (domain types, status
//! rollup, intent classifier, chat orchestrator, JSON file store).
//!
//! The gateway binary wires these pieces together; everything here is usable
//! without an HTTP server in front of it.

mod aggregate;
mod classify;
mod config;
mod error;
mod model;
mod orchestrator;
mod prompts;
mod store;
mod upstream;

pub use aggregate::{flight_summary, summarize, FlightStatus, FlightSummary, SquadronSummary};
pub use classify::{
    classify, classify_greeting, Classification, Intent, WeightedPattern, FLIGHT_ID_PATTERN,
    GREETING_NORMALIZER, GREETING_THRESHOLD, SCORE_NORMALIZER, SHORT_CIRCUIT_CONFIDENCE,
    SUMMARY_SIGNALS, SUMMARY_THRESHOLD,
};
pub use crate::config::{AppConfig, AzureConfig, NeuroConfig};
pub use error::HangarError;
pub use model::{ChatTurn, Component, ComponentStatus, Flight, FlightsDocument};
pub use orchestrator::{ChatOrchestrator, ChatRequest, GREETING_REPLY};
pub use prompts::PromptLibrary;
pub use store::{AuditLog, FlightStore};
pub use upstream::{
    AzureClient, CompletionClient, NeuroClient, MAX_COMPLETION_TOKENS, UPSTREAM_TIMEOUT,
};
