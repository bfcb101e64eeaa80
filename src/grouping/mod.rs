//! Grouping of flat, address-sorted parameter lists into containers and sections.
//!
//! The host supplies two lists, containers and parameters, both sorted by
//! address. One merge pass over the two assigns every parameter to the
//! deepest container whose address is a path prefix of it:
//!
//! containers: /a, /a/b
//! parameters: /a/b/y, /a/b/z, /a/x
//! result:     /a -> [/a/x]   /a/b -> [/a/b/y, /a/b/z]
//!
//! Containers and widgets are only ever created or dropped here. A container
//! that survives a pass is never rebuilt; it only gains widgets for
//! parameters it has not seen before.

pub mod container;
pub mod view;

pub use container::{
    ContainerDescriptor, ParameterContainer, ParameterDescriptor, Section, Style, Widget,
    WidgetKind, titleize,
};
pub use view::{ContainerView, GroupingView, SectionView, WidgetView};

use crate::address::Address;
use crate::error::SyncError;
use crate::reconcile::{Change, PassSummary, reconcile_keys};

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupingSummary {
    pub containers: PassSummary,
    pub widgets_created: usize,
    /// Parameters with no enclosing container.
    pub unassigned: usize,
    /// Parameters skipped because their style has no widget.
    pub unsupported: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GroupingEngine {
    containers: BTreeMap<Address, ParameterContainer>,
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self, address: &str) -> Option<&ParameterContainer> {
        self.containers.get(&Address::from(address))
    }

    pub fn containers(&self) -> impl Iterator<Item = &ParameterContainer> {
        self.containers.values()
    }

    /// Container owning the widget for `address`, if any.
    pub fn owner_of(&self, address: &str) -> Option<&ParameterContainer> {
        self.containers
            .values()
            .find(|c| c.widget(address).is_some())
    }

    /// Drop all grouping state.
    pub fn clear(&mut self) {
        self.containers.clear();
    }

    /// Run one grouping pass.
    ///
    /// Both lists are expected in address order. Out-of-order input is
    /// re-sorted rather than trusted, so a parameter can never be skipped
    /// because it arrived late.
    pub fn reconcile(
        &mut self,
        mut containers: Vec<ContainerDescriptor>,
        mut parameters: Vec<ParameterDescriptor>,
    ) -> GroupingSummary {
        if !containers.is_sorted_by(|a, b| a.address <= b.address) {
            debug!("container list out of address order, sorting");
            containers.sort_by(|a, b| a.address.cmp(&b.address));
        }
        if !parameters.is_sorted_by(|a, b| a.address <= b.address) {
            debug!("parameter list out of address order, sorting");
            parameters.sort_by(|a, b| a.address.cmp(&b.address));
        }

        let previous: Vec<Address> = self.containers.keys().cloned().collect();
        let mut order: Vec<Address> = Vec::with_capacity(containers.len());

        let container_pass = reconcile_keys(
            previous,
            containers,
            |c: &ContainerDescriptor| c.address.clone(),
            |change| match change {
                Change::Added(desc) => {
                    debug!(container = %desc.address, path = %desc.path, "initializing container state");
                    order.push(desc.address.clone());
                    self.containers.insert(
                        desc.address.clone(),
                        ParameterContainer::new(desc.address, desc.path),
                    );
                }
                Change::Retained(desc) => order.push(desc.address),
                Change::Removed(address) => {
                    debug!(container = %address, "clearing container state");
                    self.containers.remove(&address);
                }
            },
        );

        let mut summary = GroupingSummary {
            containers: container_pass,
            ..GroupingSummary::default()
        };

        // Merge sweep. `open` is the chain of containers enclosing the
        // current position; both inputs only move forward.
        let mut open: Vec<&Address> = Vec::new();
        let mut next = 0;
        for param in &parameters {
            while next < order.len() && order[next] <= param.address {
                let entering = &order[next];
                while open
                    .last()
                    .is_some_and(|top| !entering.has_segment_prefix(top.as_str()))
                {
                    open.pop();
                }
                open.push(entering);
                next += 1;
            }
            while open
                .last()
                .is_some_and(|top| !param.address.has_segment_prefix(top.as_str()))
            {
                open.pop();
            }

            let Some(owner) = open.last() else {
                debug!(address = %param.address, "parameter outside every container");
                summary.unassigned += 1;
                continue;
            };
            let Some(container) = self.containers.get_mut(*owner) else {
                continue;
            };

            match container.sync_parameter(param) {
                Ok(true) => summary.widgets_created += 1,
                Ok(false) => {}
                Err(err @ SyncError::UnsupportedStyle { .. }) => {
                    debug!(%err, "skipping parameter");
                    summary.unsupported += 1;
                }
                Err(err) => warn!(%err, "could not create widget"),
            }
        }

        debug!(
            containers = self.containers.len(),
            widgets = summary.widgets_created,
            "grouping pass complete"
        );
        summary
    }

    pub fn view(&self) -> GroupingView {
        view::build_grouping_view(self.containers.values())
    }
}
