// Interview engine: intake, prompt composition, phase control and the HTTP
// surface over it. All model calls go through llm_client::CompletionGateway.

pub mod composer;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod prompts;
pub mod session;
pub mod store;
pub mod transcript;
