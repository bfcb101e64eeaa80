//! A host session wiring every component to one graph and one transport.
//!
//! Scenario JSON shape:
//! {
//!   "config": { "graph_root": "/arena/composition" },   // optional
//!   "graph": [ { "path": "...", "value": 0.5 } ],        // initial endpoints
//!   "steps": [
//!     { "load": { "/composition/layers/1/video/opacity": 0.5 } },
//!     { "parameters": ["/composition/layers/1/video/opacity"] },
//!     { "controls": [ { "path": "/ui/ctrl1", "address": "/ctrl/1" } ] },
//!     { "reply": { "address": "/ctrl/1", "args": [0.5] } },
//!     { "query": "/composition/layers/1/video/opacity" },
//!     { "layout": { "containers": [...], "parameters": [...] } },
//!     { "add_endpoints": [...] }, { "remove_endpoints": ["..."] },
//!     "snapshot",
//!     "initialize"
//!   ]
//! }

use crate::Result;
use crate::address::Address;
use crate::config::SyncConfig;
use crate::controls::{
    ControlDescriptor, ControlSurfaceReconciler, INITIALIZED_CONTROL_COLUMNS, ReplyOutcome,
};
use crate::error::SyncResult;
use crate::graph::{Endpoint, MemoryGraph};
use crate::grouping::{ContainerDescriptor, GroupingEngine, GroupingView, ParameterDescriptor};
use crate::params::{INITIALIZED_COLUMNS, ParameterStore, SavedState};
use crate::table::Table;
use crate::transport::{Message, Outbox};
use crate::value::Value;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AddEndpoints(Vec<Endpoint>),
    RemoveEndpoints(Vec<String>),
    Load(Option<SavedState>),
    Parameters(Vec<Address>),
    Controls(Vec<ControlDescriptor>),
    Reply {
        address: String,
        args: Vec<Value>,
    },
    Query(Address),
    Layout {
        #[serde(default)]
        containers: Vec<ContainerDescriptor>,
        #[serde(default)]
        parameters: Vec<ParameterDescriptor>,
    },
    Snapshot,
    Initialize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<SyncConfig>,
    #[serde(default)]
    pub graph: Vec<Endpoint>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read scenario file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse scenario file {}", path.display()))
    }
}

/// Everything a replay produced, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub messages: Vec<Message>,
    pub snapshots: Vec<SavedState>,
    pub rejected_replies: Vec<String>,
    pub grouping: GroupingView,
    pub initialized_parameters: Vec<String>,
    pub initialized_controls: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct Session {
    graph: MemoryGraph,
    outbox: Outbox,
    parameters: ParameterStore,
    controls: ControlSurfaceReconciler,
    grouping: GroupingEngine,
    snapshots: Vec<SavedState>,
    rejected_replies: Vec<String>,
}

impl Session {
    /// Fresh bookkeeping tables.
    pub fn new(config: &SyncConfig, graph: MemoryGraph) -> Self {
        Self::with_tables(
            config,
            graph,
            Table::new(INITIALIZED_COLUMNS),
            Table::new(INITIALIZED_CONTROL_COLUMNS),
        )
    }

    /// Resume with tables persisted by an earlier run.
    pub fn with_tables(
        config: &SyncConfig,
        graph: MemoryGraph,
        initialized_parameters: Table,
        initialized_controls: Table,
    ) -> Self {
        Self {
            graph,
            outbox: Outbox::new(),
            parameters: ParameterStore::new(config.graph_root.clone(), initialized_parameters),
            controls: ControlSurfaceReconciler::new(
                config.query_marker.clone(),
                config.value_out_suffix.clone(),
                initialized_controls,
            ),
            grouping: GroupingEngine::new(),
            snapshots: Vec::new(),
            rejected_replies: Vec::new(),
        }
    }

    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn controls(&self) -> &ControlSurfaceReconciler {
        &self.controls
    }

    pub fn grouping(&self) -> &GroupingEngine {
        &self.grouping
    }

    /// Apply one host notification. Only precondition violations escape.
    pub fn apply(&mut self, step: Step) -> SyncResult<()> {
        match step {
            Step::AddEndpoints(endpoints) => {
                for endpoint in endpoints {
                    self.graph.insert(endpoint);
                }
            }
            Step::RemoveEndpoints(paths) => {
                for path in paths {
                    self.graph.remove(&path);
                }
            }
            Step::Load(saved) => self.parameters.load(saved),
            Step::Parameters(addresses) => {
                self.parameters.reconcile(&mut self.graph, addresses)?;
            }
            Step::Controls(controls) => {
                self.controls
                    .reconcile(&self.graph, &mut self.outbox, controls);
            }
            Step::Reply { address, args } => {
                if let ReplyOutcome::Rejected(err) =
                    self.controls.on_reply(&mut self.graph, &address, &args)
                {
                    self.rejected_replies.push(err.to_string());
                }
            }
            Step::Query(address) => {
                self.parameters
                    .reply_with_current_value(&self.graph, &mut self.outbox, &address);
            }
            Step::Layout {
                containers,
                parameters,
            } => {
                self.grouping.reconcile(containers, parameters);
            }
            Step::Snapshot => {
                let snapshot = self.parameters.snapshot_state(&self.graph);
                self.snapshots.push(snapshot);
            }
            Step::Initialize => {
                self.parameters.initialize();
                self.controls.initialize();
                self.grouping.clear();
            }
        }
        Ok(())
    }

    pub fn run(&mut self, steps: impl IntoIterator<Item = Step>) -> SyncResult<()> {
        for (i, step) in steps.into_iter().enumerate() {
            self.apply(step)?;
            tracing::trace!(step = i, "step applied");
        }
        info!(
            messages = self.outbox.messages().len(),
            snapshots = self.snapshots.len(),
            "session run complete"
        );
        Ok(())
    }

    pub fn report(&mut self) -> ReplayReport {
        ReplayReport {
            messages: self.outbox.drain(),
            snapshots: std::mem::take(&mut self.snapshots),
            rejected_replies: std::mem::take(&mut self.rejected_replies),
            grouping: self.grouping.view(),
            initialized_parameters: self
                .parameters
                .initialized()
                .keys()
                .map(str::to_string)
                .collect(),
            initialized_controls: self
                .controls
                .initialized()
                .rows()
                .map(|r| r.to_vec())
                .collect(),
        }
    }

    /// Bookkeeping tables to persist: (parameters, controls).
    pub fn tables(&self) -> (&Table, &Table) {
        (self.parameters.initialized(), self.controls.initialized())
    }
}
