//! Matching queried addresses against the index.

use std::net::Ipv4Addr;
use std::num::NonZeroU32;

use serde::Serialize;
use tracing::{debug, trace};

use super::AddressIndex;
use crate::common::{HandlerName, OctetNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// The handler that claimed an address.
pub struct Verdict {
    /// Name the handler was registered under.
    pub name: HandlerName,
    /// Positive value the handler returned.
    pub outcome: NonZeroU32,
    /// Level (1 to 4) of the node the handler is bound to, `1` for `/8`
    /// subnets and `4` for exact addresses.
    pub level: usize,
}

impl AddressIndex {
    /// Evaluate the handlers along the path of `address`, from the most
    /// general to the most specific, and return the first positive outcome.
    ///
    /// Returns `0` if the path ends before a handler claimed the address,
    /// or if every handler on it returned `0`.
    pub fn match_addr(&self, address: impl Into<Ipv4Addr>) -> u32 {
        self.classify(address)
            .map_or(0, |verdict| verdict.outcome.get())
    }

    /// Same walk as [Self::match_addr], also telling which handler fired.
    pub fn classify(&self, address: impl Into<Ipv4Addr>) -> Option<Verdict> {
        let address = address.into();
        let mut index = &self.root;

        for (depth, key) in address.octets().into_iter().enumerate() {
            let Some(node) = index.get(key) else {
                trace!(?address, level = depth + 1, "No node for address");
                return None;
            };

            if let Some((name, outcome)) = node
                .handlers()
                .and_then(|chain| chain.first_positive(address))
            {
                debug!(?address, %name, %outcome, level = depth + 1, "Address matched");

                return Some(Verdict {
                    name: name.clone(),
                    outcome,
                    level: depth + 1,
                });
            }

            index = node.subtree();
        }

        trace!(?address, "No handler claimed address");

        None
    }

    /// The level 4 node of `address`, without evaluating any handler.
    pub fn find(&self, address: impl Into<Ipv4Addr>) -> Option<&OctetNode> {
        let [first, rest @ ..] = address.into().octets();

        rest.iter()
            .try_fold(self.root.get(first)?, |node, key| node.subtree().get(*key))
    }
}
