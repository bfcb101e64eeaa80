//! Keeps a host object graph, a control surface and a persisted parameter
//! state in agreement across reloads.
//!
//! - [`codec`]: numeric / expanded / export-name address forms.
//! - [`params`]: saved parameter values, applied lazily as parameters appear.
//! - [`grouping`]: sorted parameter lists merged into containers and sections.
//! - [`controls`]: control endpoints queried for and seeded with initial values.
//!
//! Each component holds only its own bookkeeping; the graph and the
//! transport are passed in on every call.

pub mod address;
pub mod codec;
pub mod config;
pub mod controls;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod params;
pub mod reconcile;
pub mod session;
pub mod table;
pub mod transport;
pub mod value;

pub use address::Address;
pub use config::SyncConfig;
pub use controls::{ControlDescriptor, ControlSurfaceReconciler, ReplyOutcome};
pub use error::{SyncError, SyncResult};
pub use graph::{Endpoint, MemoryGraph, ObjectGraph};
pub use grouping::{ContainerDescriptor, GroupingEngine, ParameterDescriptor};
pub use params::{ParameterStore, SavedState};
pub use reconcile::{Change, PassSummary};
pub use session::{ReplayReport, Scenario, Session, Step};
pub use table::Table;
pub use transport::{Message, Outbox, Transport};
pub use value::Value;

pub type Result<T> = anyhow::Result<T>;
