//! Parameter store: live parameter lookups plus one-shot restore of saved values.
//!
//! Saved values are not pushed into the graph on load. Parameters show up
//! whenever the host finishes building them, so each saved value is applied
//! the first time its address appears in a reconciliation pass and is then
//! forgotten. A parameter that is destroyed and later recreated under the
//! same address keeps whatever value the host gives it.

use crate::address::Address;
use crate::codec;
use crate::error::{SyncError, SyncResult};
use crate::graph::{Endpoint, ObjectGraph};
use crate::reconcile::{Change, PassSummary, reconcile_keys};
use crate::table::Table;
use crate::transport::Transport;
use crate::value::Value;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Columns of the initialized-address table.
pub const INITIALIZED_COLUMNS: &[&str] = &["address"];

pub type SavedState = BTreeMap<Address, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Loaded,
}

/// What happened to one address during lazy initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum LazyInit {
    /// Nothing saved for this address.
    NotSaved,
    /// The saved value was written to the live parameter.
    Applied(Value),
    /// The saved value was consumed but could not be applied.
    Dropped(Value),
}

#[derive(Debug)]
pub struct ParameterStore {
    graph_root: String,
    state: LoadState,
    saved: Option<SavedState>,
    initialized: Table,
    tracked: Vec<Address>,
}

impl ParameterStore {
    /// `initialized` carries addresses already initialized by an earlier run.
    pub fn new(graph_root: impl Into<String>, initialized: Table) -> Self {
        Self {
            graph_root: graph_root.into(),
            state: LoadState::Uninitialized,
            saved: None,
            initialized,
            tracked: Vec::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn initialized(&self) -> &Table {
        &self.initialized
    }

    pub fn tracked(&self) -> &[Address] {
        &self.tracked
    }

    /// Saved values not yet consumed, if loaded.
    pub fn pending(&self) -> Option<&SavedState> {
        self.saved.as_ref()
    }

    /// Forget all saved and initialized state (composition reload).
    pub fn initialize(&mut self) {
        self.state = LoadState::Uninitialized;
        self.initialized.clear();
        self.tracked.clear();
        self.saved = None;
        info!("parameter store initialized");
    }

    pub fn load(&mut self, saved: Option<SavedState>) {
        self.state = LoadState::Loading;
        let saved = saved.unwrap_or_default();
        info!(saved = saved.len(), "loading parameters");

        self.saved = Some(saved);
        self.state = LoadState::Loaded;
    }

    /// Current value of every tracked parameter. Menus report their index.
    pub fn snapshot_state<G>(&self, graph: &G) -> SavedState
    where
        G: ObjectGraph + ?Sized,
    {
        self.tracked
            .iter()
            .filter_map(|address| {
                self.resolve(graph, address)
                    .map(|endpoint| (address.clone(), endpoint.get()))
            })
            .collect()
    }

    /// Answer a `?` query on `address` with the live value.
    pub fn reply_with_current_value<G, T>(&self, graph: &G, transport: &mut T, address: &Address)
    where
        G: ObjectGraph + ?Sized,
        T: Transport + ?Sized,
    {
        let Some(endpoint) = self.resolve(graph, address) else {
            error!(%address, "could not find parameter value to reply with");
            return;
        };

        debug!(%address, "replying with current value");
        transport.reply(address.as_str(), endpoint.get());
    }

    /// Run one pass over the current parameter addresses.
    ///
    /// Addresses seen for the first time get their saved value (if any) and
    /// are marked initialized. Initialized addresses missing from this pass
    /// are unmarked, so a later reappearance counts as a new parameter.
    pub fn reconcile<G, I>(&mut self, graph: &mut G, current: I) -> SyncResult<PassSummary>
    where
        G: ObjectGraph + ?Sized,
        I: IntoIterator<Item = Address>,
    {
        self.require_loaded()?;

        let current: Vec<Address> = current.into_iter().collect();
        let previous: Vec<Address> = self.initialized.keys().map(Address::from).collect();

        let summary = reconcile_keys(previous, current.iter().cloned(), Address::clone, |change| {
            match change {
                Change::Added(address) => {
                    // Only fails before load, which was checked above.
                    if let Err(err) = self.apply_lazy_init(&mut *graph, &address) {
                        error!(%address, %err, "lazy init failed");
                    }
                    self.initialized.append_row([address.as_str()]);
                }
                Change::Retained(_) => {}
                Change::Removed(address) => {
                    debug!(%address, "parameter gone, clearing initialized mark");
                    self.initialized.delete_row(address.as_str());
                }
            }
        });

        self.tracked = current;
        debug!(
            added = summary.added,
            retained = summary.retained,
            removed = summary.removed,
            "parameter pass complete"
        );
        Ok(summary)
    }

    /// Apply and consume the saved value for `address`, if there is one.
    pub fn apply_lazy_init<G>(&mut self, graph: &mut G, address: &Address) -> SyncResult<LazyInit>
    where
        G: ObjectGraph + ?Sized,
    {
        let saved = self.saved.as_mut().ok_or_else(|| {
            SyncError::PreconditionViolated(
                "parameters cannot be initialized before saved state is loaded".to_string(),
            )
        })?;

        let Some(value) = saved.remove(address) else {
            return Ok(LazyInit::NotSaved);
        };

        let Some(endpoint) = self.resolve_mut(graph, address) else {
            warn!(%address, "attempted to initialize a parameter that does not exist");
            return Ok(LazyInit::Dropped(value));
        };

        if !endpoint.set(value.clone()) {
            warn!(%address, %value, "saved value rejected by parameter");
            return Ok(LazyInit::Dropped(value));
        }

        debug!(%address, %value, "restored saved value");
        Ok(LazyInit::Applied(value))
    }

    fn require_loaded(&self) -> SyncResult<()> {
        if self.state != LoadState::Loaded {
            return Err(SyncError::PreconditionViolated(format!(
                "parameter pass requested while {:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn endpoint_path(&self, address: &Address) -> Option<String> {
        match codec::expand_address(address.as_str(), &self.graph_root) {
            Ok(location) => Some(location.path()),
            Err(err) => {
                warn!(%address, %err, "cannot map address onto the graph");
                None
            }
        }
    }

    fn resolve<'g, G>(&self, graph: &'g G, address: &Address) -> Option<&'g Endpoint>
    where
        G: ObjectGraph + ?Sized,
    {
        let path = self.endpoint_path(address)?;
        let endpoint = graph.resolve(&path);
        if endpoint.is_none() {
            warn!(
                %address,
                err = %SyncError::unresolved(address.as_str()),
                path = %path,
                "parameter lookup failed"
            );
        }
        endpoint
    }

    fn resolve_mut<'g, G>(&self, graph: &'g mut G, address: &Address) -> Option<&'g mut Endpoint>
    where
        G: ObjectGraph + ?Sized,
    {
        let path = self.endpoint_path(address)?;
        graph.resolve_mut(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::transport::Outbox;
    use pretty_assertions::assert_eq;

    const ROOT: &str = "/arena/composition";
    const OPACITY: &str = "/composition/layers/1/video/opacity";
    const BLEND: &str = "/composition/layers/1/video/blendmode";

    fn graph() -> MemoryGraph {
        [
            Endpoint::new("/arena/composition/layers/layer1/video/opacity", 1.0),
            Endpoint::new("/arena/composition/layers/layer1/video/blendmode", 0.0)
                .with_menu(&["Add", "Alpha", "Multiply"], 0),
        ]
        .into_iter()
        .collect()
    }

    fn store() -> ParameterStore {
        ParameterStore::new(ROOT, Table::new(INITIALIZED_COLUMNS))
    }

    fn saved(entries: &[(&str, Value)]) -> SavedState {
        entries
            .iter()
            .map(|(a, v)| (Address::from(*a), v.clone()))
            .collect()
    }

    fn opacity(graph: &MemoryGraph) -> Value {
        graph
            .resolve("/arena/composition/layers/layer1/video/opacity")
            .unwrap()
            .get()
    }

    #[test]
    fn lazy_init_before_load_is_a_precondition_violation() {
        let mut graph = graph();
        let mut store = store();

        let err = store
            .apply_lazy_init(&mut graph, &Address::from(OPACITY))
            .unwrap_err();
        assert!(matches!(err, SyncError::PreconditionViolated(_)));
        assert!(store.reconcile(&mut graph, [Address::from(OPACITY)]).is_err());
        assert!(store.initialized().is_empty());
    }

    #[test]
    fn saved_value_applies_on_first_pass_only() {
        let mut graph = graph();
        let mut store = store();
        store.load(Some(saved(&[(OPACITY, Value::Float(0.5))])));

        let summary = store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(opacity(&graph), Value::Float(0.5));
        assert!(store.pending().unwrap().is_empty());

        // The host moves the value; a second pass must not touch it.
        graph
            .resolve_mut("/arena/composition/layers/layer1/video/opacity")
            .unwrap()
            .set(Value::Float(0.9));
        let summary = store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();
        assert_eq!(summary.retained, 1);
        assert_eq!(opacity(&graph), Value::Float(0.9));
        assert_eq!(store.initialized().len(), 1);
    }

    #[test]
    fn second_pass_ignores_value_still_present_in_saved_state() {
        let mut graph = graph();
        let mut store = store();
        store.load(Some(SavedState::new()));
        store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();

        // A stray entry appearing after the address was marked is ignored.
        store
            .saved
            .as_mut()
            .unwrap()
            .insert(Address::from(OPACITY), Value::Float(0.1));
        store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();
        assert_eq!(opacity(&graph), Value::Float(1.0));
    }

    #[test]
    fn recreated_parameter_does_not_get_consumed_value_again() {
        let mut graph = graph();
        let mut store = store();
        store.load(Some(saved(&[(OPACITY, Value::Float(0.5))])));
        store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();

        let summary = store.reconcile(&mut graph, Vec::<Address>::new()).unwrap();
        assert_eq!(summary.removed, 1);
        assert!(store.initialized().is_empty());

        graph.insert(Endpoint::new(
            "/arena/composition/layers/layer1/video/opacity",
            1.0,
        ));
        let summary = store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(opacity(&graph), Value::Float(1.0));
        assert_eq!(store.initialized().len(), 1);
    }

    #[test]
    fn unresolvable_parameter_drops_its_saved_value() {
        let mut graph = MemoryGraph::new();
        let mut store = store();
        store.load(Some(saved(&[(OPACITY, Value::Float(0.5))])));

        let outcome = store
            .apply_lazy_init(&mut graph, &Address::from(OPACITY))
            .unwrap();
        assert_eq!(outcome, LazyInit::Dropped(Value::Float(0.5)));
        assert!(store.pending().unwrap().is_empty());
    }

    #[test]
    fn snapshot_reports_menu_index_and_skips_missing() {
        let mut graph = graph();
        let mut store = store();
        store.load(Some(saved(&[(BLEND, Value::from("Multiply"))])));
        store
            .reconcile(
                &mut graph,
                [
                    Address::from(OPACITY),
                    Address::from(BLEND),
                    Address::from("/composition/layers/9/video/opacity"),
                ],
            )
            .unwrap();

        let snapshot = store.snapshot_state(&graph);
        assert_eq!(
            snapshot,
            saved(&[(OPACITY, Value::Float(1.0)), (BLEND, Value::Int(2))])
        );
    }

    #[test]
    fn replies_with_live_value_or_nothing() {
        let graph = graph();
        let store = store();
        let mut outbox = Outbox::new();

        store.reply_with_current_value(&graph, &mut outbox, &Address::from(OPACITY));
        store.reply_with_current_value(
            &graph,
            &mut outbox,
            &Address::from("/composition/layers/2/video/opacity"),
        );

        assert_eq!(outbox.messages().len(), 1);
        assert_eq!(outbox.messages()[0].address, OPACITY);
        assert_eq!(outbox.messages()[0].args, vec![Value::Float(1.0)]);
    }

    #[test]
    fn initialize_resets_everything() {
        let mut graph = graph();
        let mut store = store();
        store.load(None);
        store.reconcile(&mut graph, [Address::from(OPACITY)]).unwrap();

        store.initialize();
        assert_eq!(store.state(), LoadState::Uninitialized);
        assert!(store.initialized().is_empty());
        assert!(store.pending().is_none());
        assert!(store.tracked().is_empty());
        assert!(store.snapshot_state(&graph).is_empty());
    }
}
