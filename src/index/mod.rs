//! The address index: four nested levels of [OctetIndex], one per octet.

mod config;
mod matcher;
mod registrar;
mod shared;

pub use config::{Config, DuplicatePolicy};
pub use matcher::Verdict;
pub use registrar::Registration;
pub use shared::SharedIndex;

use crate::common::{OctetIndex, OctetNode};
use crate::Result;

#[derive(Debug, Clone, Default)]
/// Registry of IPv4 addresses and subnets with the handlers bound to them.
///
/// Level 1 is keyed by the most significant octet, every node of levels
/// 1 to 3 owns the index of the following octet in its subtree.
pub struct AddressIndex {
    root: OctetIndex,
    config: Config,
}

impl AddressIndex {
    /// Create an empty index with the default [Config].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        AddressIndex {
            root: OctetIndex::new(),
            config,
        }
    }

    // === Getters ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The level 1 index.
    pub fn root(&self) -> &OctetIndex {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    // === Public Methods ===

    /// Debug dump of the whole index, see [node_to_json].
    pub fn to_json(&self) -> Result<String> {
        node_to_json(self.root.root())
    }
}

/// Serialize a node and everything below it as compact JSON.
///
/// Objects carry `key`, `subtree`, `left`, `right` in that order, plus
/// `signatures` listing the bound handler names when there are any.
/// A missing node is `null`.
pub fn node_to_json(node: Option<&OctetNode>) -> Result<String> {
    Ok(serde_json::to_string(&node)?)
}
