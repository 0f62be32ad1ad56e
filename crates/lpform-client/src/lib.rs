//! lpform client: drives a linear-programming form against a remote solver
//!
//! This crate provides:
//! - Durable persistence of the last submitted request and last optimal result
//! - The solve workflow state machine, with stale responses discarded
//! - An HTTP client for the solve, graph and report endpoints
//! - Report export with several redundant delivery strategies

pub mod config;
pub mod export;
pub mod host;
pub mod orchestrator;
pub mod store;
pub mod transport;

pub use config::{ClientConfig, ConfigError, Endpoints};
pub use export::{
    ActionControl, Artifact, ArtifactError, DeliveryHost, DeliveryStrategy, ExportCoordinator,
    GraphError,
};
pub use host::{FileDeliveryHost, Message};
pub use orchestrator::{AttemptId, Outcome, ResultView, SolveOrchestrator, SolveState};
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistenceStore};
pub use transport::{HttpSolverService, SolverService, TransportError};
