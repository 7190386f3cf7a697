//! Kisan Agent - routing, agents, and the clients they call
//!
//! A farmer's question goes through one completion call in the `router`,
//! which picks an agent and extracts its parameters. The `runtime` then runs
//! that agent. Agents build a domain prompt, optionally after a `data` lookup,
//! and hand it to the completion client in `llm`.
//!
//! # Key Types
//!
//! - `AgentRuntime` - startup wiring and the dispatch table (see `runtime`)
//! - `IntentRouter` - free text to `RouteDecision`
//! - `AgentBridge` - named task requests between agents
//! - `CompletionClient` - pluggable text/vision completion, `GeminiClient` by default
//!
//! # Failure Policy
//!
//! Nothing here returns an error to the front end. Missing credentials,
//! upstream failures, and unparseable router output all come back as plain
//! text the farmer can read.

pub mod agents;
pub mod bridge;
pub mod data;
pub mod fixtures;
pub mod image;
pub mod llm;
pub mod router;
pub mod runtime;

pub use bridge::{AgentBridge, BridgeAgent, BridgeRequest, TaskOutcome};
pub use llm::{CompletionClient, GeminiClient, ImagePayload};
pub use router::IntentRouter;
pub use runtime::{AgentClients, AgentRuntime};
