//! Chat orchestration: decides per request whether to answer locally from the
//! dataset or to delegate to the upstream model with an enriched system
//! prompt. No state is carried across requests.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::aggregate::{flight_summary, summarize, SquadronSummary};
use crate::classify::{classify, Classification, Intent, SHORT_CIRCUIT_CONFIDENCE};
use crate::error::HangarError;
use crate::model::{ChatTurn, ComponentStatus, Flight, FlightsDocument};
use crate::prompts::PromptLibrary;
use crate::store::{AuditLog, FlightStore};
use crate::upstream::CompletionClient;

/// Flight context sent upstream is capped to bound the payload size.
pub const MAX_CONTEXT_COMPONENTS: usize = 80;
/// How many flights are listed in the squadron-scoped system prompt.
pub const MAX_LISTED_FLIGHTS: usize = 10;

/// Canned reply for the greeting short-circuit on the alternate provider
/// route.
pub const GREETING_REPLY: &str =
    "Hello! I am the squadron maintenance assistant. How can I help you today?";

const SQUADRON_INSTRUCTION: &str = "When the user asks for overall or squadron-level health, \
provide a concise squadron-level summary first using only the provided dataset. If the user \
later requests per-flight details, provide them on follow-up. Keep the initial reply short \
and factual.";

/// Chat request body: `{ message, flightId?, history?, promptId? }`.
/// Structurally invalid bodies (wrong types, malformed turns) are rejected at
/// the boundary before classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub flight_id: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

/// Per-request chat pipeline. Constructed once per process; the prompt
/// library and client are read-only thereafter.
pub struct ChatOrchestrator {
    store: Arc<FlightStore>,
    prompts: Arc<PromptLibrary>,
    audit: AuditLog,
    client: Arc<dyn CompletionClient>,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<FlightStore>,
        prompts: Arc<PromptLibrary>,
        audit: AuditLog,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self { store, prompts, audit, client }
    }

    /// Runs the full decision policy for one request. Every path, local or
    /// upstream, is audit-logged; audit failures never alter the outcome.
    pub async fn handle(&self, req: ChatRequest) -> Result<String, HangarError> {
        if req.message.is_empty() {
            return Err(HangarError::BadRequest("missing message".to_string()));
        }
        self.audit
            .append(json!({
                "event": "request",
                "message": truncate(&req.message, 512),
                "flightId": req.flight_id,
                "promptId": req.prompt_id,
            }))
            .await;
        tracing::info!(
            flight = req.flight_id.as_deref().unwrap_or("<none>"),
            prompt = req.prompt_id.as_deref().unwrap_or("default"),
            "chat request"
        );

        // A squadron read failure here degrades to an empty dataset rather
        // than failing the chat; the data routes surface it instead.
        let doc = self.store.load_flights().await.unwrap_or_default();
        let flight = match &req.flight_id {
            Some(id) => self.store.resolve_context(&doc, id).await,
            None => None,
        };

        let cls = classify(&req.message);
        self.audit
            .append(json!({
                "event": "classification",
                "message": truncate(&req.message, 256),
                "classification": cls,
            }))
            .await;
        tracing::info!(
            intent = ?cls.intent,
            confidence = cls.confidence,
            flight_mention = cls.flight_id_mention,
            "classification"
        );

        if cls.intent == Intent::Summary && cls.confidence >= SHORT_CIRCUIT_CONFIDENCE {
            let reply = local_reply(&doc.flights, flight.as_ref());
            self.audit
                .append(json!({
                    "event": "local-reply",
                    "flightId": req.flight_id,
                    "message": truncate(&req.message, 512),
                    "reply": truncate(&reply, 2000),
                }))
                .await;
            return Ok(reply);
        }

        let system = compose_system_prompt(
            self.prompts.resolve(req.prompt_id.as_deref()),
            &cls,
            flight.as_ref(),
            &doc,
        );
        let mut messages = Vec::with_capacity(req.history.len() + 2);
        messages.push(ChatTurn::system(system));
        messages.extend(req.history.iter().cloned());
        messages.push(ChatTurn::user(req.message.clone()));

        match self.client.complete(&messages).await {
            Ok(reply) => {
                self.audit
                    .append(json!({ "event": "upstream-reply", "reply": truncate(&reply, 2000) }))
                    .await;
                tracing::info!(len = reply.len(), "upstream reply");
                Ok(reply)
            }
            Err(e) => {
                self.audit
                    .append(json!({ "event": "upstream-error", "kind": e.kind(), "detail": e.detail() }))
                    .await;
                tracing::warn!(kind = e.kind(), "upstream call failed: {e}");
                Err(e)
            }
        }
    }
}

/// Deterministic templated reply for the confident-summary short circuit.
/// With flight context, a flight-scoped sub-summary plus a scope question;
/// without, the squadron rollup.
fn local_reply(flights: &[Flight], flight: Option<&Flight>) -> String {
    let squad = summarize(flights);
    match flight {
        Some(f) => {
            let fsum = flight_summary(f);
            let deployability = if fsum.worst == ComponentStatus::Critical {
                "non-deployable"
            } else {
                "deployable"
            };
            let mut reply = format!("Context: {}\n\n", f.id);
            reply.push_str(&format!(
                "I\u{2019}m currently scoped to {}. Do you want:\n\
                 - A: a short summary for this selected aircraft, or\n\
                 - B: a squadron-level summary (aggregate across all flights)?\n\n",
                f.label()
            ));
            reply.push_str(&format!(
                "If you want the squadron summary now, here's the latest from the dataset:\n\
                 - Total aircraft: {}\n\
                 - Deployable (no Critical components): {} ({}%)\n\
                 - Non-deployable (\u{2265} 1 Critical): {} ({}%) \u{2014} IDs: {}\n\n",
                squad.total_flights,
                squad.deployable_count,
                squad.deployable_pct,
                squad.flights_with_critical,
                critical_pct(&squad),
                json!(squad.critical_ids),
            ));
            reply.push_str(&format!(
                "Quick summary for {id}:\n\
                 - Worst status: {worst}\n\
                 - Key issue: {issue} \u{2014} aircraft is {deployability} until the issue is resolved.\n\n\
                 Tell me which view you want (A or B), or ask for per-component details for {id}.",
                id = f.id,
                worst = fsum.worst,
                issue = fsum.key_issue,
            ));
            reply
        }
        None => {
            let mut reply = format!(
                "Squadron summary (from local data):\n\
                 - Total aircraft: {}\n\
                 - Flights all good: {}\n\
                 - Flights with warnings: {}\n\
                 - Flights with critical issues: {}\n\
                 - Deployable: {} ({}%)\n\
                 - In-service/maintenance planned: {}\n",
                squad.total_flights,
                squad.flights_all_good,
                squad.flights_with_warnings,
                squad.flights_with_critical,
                squad.deployable_count,
                squad.deployable_pct,
                squad.in_service_count,
            );
            if !squad.critical_ids.is_empty() {
                reply.push_str(&format!("- Non-deployable IDs: {}\n", json!(squad.critical_ids)));
            }
            reply.push_str(
                "\nIf you want details for a specific aircraft, mention its flight id \
                 (for example: A400-03).",
            );
            reply
        }
    }
}

fn critical_pct(squad: &SquadronSummary) -> u32 {
    if squad.total_flights == 0 {
        return 0;
    }
    ((squad.flights_with_critical as f64 / squad.total_flights as f64) * 100.0).round() as u32
}

/// Builds the enriched system prompt for the upstream fallback: the selected
/// template, an aggregation instruction when the classifier leaned toward
/// summary, and either the flight context or the squadron snapshot.
fn compose_system_prompt(
    template: &str,
    cls: &Classification,
    flight: Option<&Flight>,
    doc: &FlightsDocument,
) -> String {
    let mut system = template.to_string();
    if cls.intent == Intent::Summary {
        system = format!("{SQUADRON_INSTRUCTION}\n\n{system}");
    }
    let leaned_summary =
        cls.intent == Intent::Summary && cls.confidence < SHORT_CIRCUIT_CONFIDENCE;

    match flight {
        Some(f) => {
            let components: Vec<Value> = f
                .components
                .iter()
                .take(MAX_CONTEXT_COMPONENTS)
                .map(|c| {
                    json!({
                        "id": c.id,
                        "displayName": c.display_name,
                        "componentName": c.component_name,
                        "status": c.status,
                        "maintenanceDue": c.maintenance_due,
                    })
                })
                .collect();
            system.push_str(&format!(
                "\n\nFlight context (id: {}, displayName: {}): {}",
                f.id,
                f.display_name.as_deref().unwrap_or(""),
                json!({ "components": components }),
            ));
            if leaned_summary {
                let fsum = flight_summary(f);
                system.push_str(&format!(
                    "\n\nLocal flight summary: worstStatus={}; keyIssue={}",
                    fsum.worst, fsum.key_issue
                ));
            }
        }
        None => {
            let top: Vec<Value> = doc
                .flights
                .iter()
                .take(MAX_LISTED_FLIGHTS)
                .map(|f| json!({ "id": f.id, "displayName": f.display_name }))
                .collect();
            let squad = summarize(&doc.flights);
            system.push_str(&format!(
                "\n\nAvailable flights: {}\n\nSquadron summary: totalFlights={}; \
                 flightsAllGood={}; flightsWithWarnings={}; flightsWithCritical={}; \
                 deployable={} ({}%); inServiceOrMaintenancePlanned={}.",
                json!(top),
                squad.total_flights,
                squad.flights_all_good,
                squad.flights_with_warnings,
                squad.flights_with_critical,
                squad.deployable_count,
                squad.deployable_pct,
                squad.in_service_count,
            ));
            if leaned_summary {
                system.push_str(&format!(
                    "\n\nLocal squadron critical IDs: {}",
                    json!(squad.critical_ids)
                ));
            }
        }
    }
    system
}

/// Char-safe truncation for audit entries (messages and replies can be long).
fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
