//! Remote-controllable endpoints and their initial-value handshake.
//!
//! Every control seen for the first time is asked for its current value with
//! a query message. The reply is written into the control and recorded in the
//! initialized-controls table together with the control's value-out
//! companion, which is what downstream consumers watch.
//!
//! Unknown -> AwaitingInitialValue -> Initialized

use crate::address::Address;
use crate::error::SyncError;
use crate::graph::ObjectGraph;
use crate::reconcile::{Change, PassSummary, reconcile_keys};
use crate::table::Table;
use crate::transport::Transport;
use crate::value::Value;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Columns of the initialized-controls table.
pub const INITIALIZED_CONTROL_COLUMNS: &[&str] = &["address", "value_out", "kind"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlDescriptor {
    /// Graph path of the control.
    pub path: String,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlState {
    AwaitingInitialValue,
    Initialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEndpoint {
    pub address: Address,
    pub path: String,
    pub state: ControlState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// Value written; `recorded` is false if the address was already marked.
    Applied { recorded: bool },
    Rejected(SyncError),
}

#[derive(Debug)]
pub struct ControlSurfaceReconciler {
    query_marker: String,
    value_out_suffix: String,
    endpoints: BTreeMap<Address, ControlEndpoint>,
    initialized: Table,
}

impl ControlSurfaceReconciler {
    pub fn new(
        query_marker: impl Into<String>,
        value_out_suffix: impl Into<String>,
        initialized: Table,
    ) -> Self {
        Self {
            query_marker: query_marker.into(),
            value_out_suffix: value_out_suffix.into(),
            endpoints: BTreeMap::new(),
            initialized,
        }
    }

    pub fn endpoint(&self, address: &str) -> Option<&ControlEndpoint> {
        self.endpoints.get(&Address::from(address))
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &ControlEndpoint> {
        self.endpoints.values()
    }

    pub fn initialized(&self) -> &Table {
        &self.initialized
    }

    /// Forget every tracked control and all initialization metadata.
    pub fn initialize(&mut self) {
        self.endpoints.clear();
        self.initialized.clear();
        info!("control surface state initialized");
    }

    /// Run one pass over the current control list.
    pub fn reconcile<G, T, I>(&mut self, graph: &G, transport: &mut T, current: I) -> PassSummary
    where
        G: ObjectGraph + ?Sized,
        T: Transport + ?Sized,
        I: IntoIterator<Item = ControlDescriptor>,
    {
        // Rows persisted by an earlier run count as known controls too, so
        // their stale entries are cleaned up and live ones are not re-queried.
        let previous: Vec<Address> = self
            .endpoints
            .keys()
            .cloned()
            .chain(self.initialized.keys().map(Address::from))
            .collect();
        let query = Value::query(&self.query_marker);
        let endpoints = &mut self.endpoints;
        let initialized = &mut self.initialized;

        let summary = reconcile_keys(
            previous,
            current,
            |c: &ControlDescriptor| c.address.clone(),
            |change| match change {
                Change::Added(control) => {
                    debug!(address = %control.address, "initializing ui state");
                    if graph.resolve(&control.path).is_none() {
                        warn!(
                            address = %control.address,
                            path = %control.path,
                            "control has no live endpoint yet"
                        );
                    }
                    send_message(transport, control.address.as_str(), vec![query.clone()]);
                    endpoints.insert(
                        control.address.clone(),
                        ControlEndpoint {
                            address: control.address,
                            path: control.path,
                            state: ControlState::AwaitingInitialValue,
                        },
                    );
                }
                Change::Retained(control) => {
                    if !endpoints.contains_key(&control.address) {
                        debug!(address = %control.address, "restoring ui state from initialized table");
                        endpoints.insert(
                            control.address.clone(),
                            ControlEndpoint {
                                address: control.address,
                                path: control.path,
                                state: ControlState::Initialized,
                            },
                        );
                    }
                }
                Change::Removed(address) => {
                    debug!(%address, "clearing ui state");
                    endpoints.remove(&address);
                    initialized.delete_row(address.as_str());
                }
            },
        );

        debug!(
            added = summary.added,
            retained = summary.retained,
            removed = summary.removed,
            "control pass complete"
        );
        summary
    }

    /// Handle a reply to an earlier query.
    pub fn on_reply<G>(&mut self, graph: &mut G, address: &str, args: &[Value]) -> ReplyOutcome
    where
        G: ObjectGraph + ?Sized,
    {
        let Some(control) = self.endpoints.get_mut(&Address::from(address)) else {
            warn!(address, "received reply for unknown address");
            return ReplyOutcome::Rejected(SyncError::UnknownEndpoint {
                address: address.to_string(),
            });
        };

        let [value] = args else {
            let err = SyncError::MalformedReply {
                address: address.to_string(),
                count: args.len(),
            };
            warn!(%err, "ignoring reply");
            return ReplyOutcome::Rejected(err);
        };

        let Some(endpoint) = graph.resolve_mut(&control.path) else {
            let err = SyncError::unresolved(address);
            warn!(%err, path = %control.path, "cannot apply reply");
            return ReplyOutcome::Rejected(err);
        };

        debug!(address, %value, "setting value");
        if !endpoint.set(value.clone()) {
            warn!(address, %value, "control rejected replied value");
        }

        let value_out = format!("{}/{}", control.path, self.value_out_suffix);
        let kind = match graph.resolve(&value_out) {
            Some(companion) => companion.family().to_string(),
            None => {
                warn!(address, value_out = %value_out, "value-out companion not found, recording without kind");
                String::new()
            }
        };
        control.state = ControlState::Initialized;

        if self.initialized.contains(address) {
            return ReplyOutcome::Applied { recorded: false };
        }
        self.initialized.append_row([address, value_out.as_str(), kind.as_str()]);
        ReplyOutcome::Applied { recorded: true }
    }

    pub fn send_message<T>(&self, transport: &mut T, address: &str, args: Vec<Value>) -> bool
    where
        T: Transport + ?Sized,
    {
        send_message(transport, address, args)
    }
}

/// Forward to the transport unless `address` is blank.
fn send_message<T>(transport: &mut T, address: &str, args: Vec<Value>) -> bool
where
    T: Transport + ?Sized,
{
    if address.trim().is_empty() {
        warn!(address, "attempted to send to invalid address");
        return false;
    }

    debug!(address, ?args, "sending message");
    transport.send(address, args);
    true
}
