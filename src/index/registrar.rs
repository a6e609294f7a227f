//! Registering addresses and subnets.

use std::net::Ipv4Addr;
use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{AddressIndex, DuplicatePolicy};
use crate::common::{parse_ipv4, Cidr, Handler, HandlerName, OctetIndex, SharedHandler, LEVELS};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Outcome of a successful registration.
pub struct Registration {
    /// Nodes the handler was newly bound to.
    pub attached: usize,
    /// Nodes already carrying a handler of that name, only non zero under
    /// [DuplicatePolicy::Ignore].
    pub skipped: usize,
}

impl AddressIndex {
    /// Bind `handler` under `name` to the exact address `ip`, given as a
    /// dotted quad.
    pub fn add_address<H: Handler + 'static>(
        &mut self,
        ip: &str,
        name: &str,
        handler: H,
    ) -> Result<Registration> {
        let address = parse_ipv4(ip)?;
        let name = HandlerName::new(name)?;

        self.bind_address(address, &name, Arc::new(handler))
    }

    /// Bind `handler` under `name` to every address of the subnet `cidr`,
    /// given as `a.b.c.d/len` with `8 <= len < 32`.
    ///
    /// The prefix is expanded into the octet keys it covers at the level its
    /// boundary falls into, each key getting its own binding. `/23` binds two
    /// level-3 nodes, `/8` a single level-1 node.
    pub fn add_subnet<H: Handler + 'static>(
        &mut self,
        cidr: &str,
        name: &str,
        handler: H,
    ) -> Result<Registration> {
        let cidr = Cidr::parse(cidr)?;
        let name = HandlerName::new(name)?;

        self.bind_subnet(cidr, &name, Arc::new(handler))
    }

    /// Same as [Self::add_address] with already validated arguments, allowing
    /// one handler to be shared by many registrations.
    pub fn bind_address(
        &mut self,
        address: Ipv4Addr,
        name: &HandlerName,
        handler: SharedHandler,
    ) -> Result<Registration> {
        if self.config.reject_limited_broadcast && address == Ipv4Addr::BROADCAST {
            return Err(Error::InvalidAddress(address.to_string()));
        }

        let octets = address.octets();
        let last = octets[LEVELS - 1] as u16;
        let registration = self.bind(&octets[..LEVELS - 1], last..last + 1, name, handler)?;

        debug!(?address, %name, ?registration, "Registered address");

        Ok(registration)
    }

    /// Same as [Self::add_subnet] with already validated arguments.
    pub fn bind_subnet(
        &mut self,
        cidr: Cidr,
        name: &HandlerName,
        handler: SharedHandler,
    ) -> Result<Registration> {
        let registration = self.bind(&cidr.fixed_octets(), cidr.boundary_keys(), name, handler)?;

        debug!(%cidr, %name, ?registration, "Registered subnet");

        Ok(registration)
    }

    // === Private Methods ===

    /// Walk (creating as needed) the path of `fixed` octets, then bind the
    /// handler to every key of `keys` at the following level.
    fn bind(
        &mut self,
        fixed: &[u8],
        keys: Range<u16>,
        name: &HandlerName,
        handler: SharedHandler,
    ) -> Result<Registration> {
        if self.config.duplicate_handlers == DuplicatePolicy::Reject
            && self.any_bound(fixed, keys.clone(), name)
        {
            return Err(Error::DuplicateHandler(name.to_string()));
        }

        let mut index = &mut self.root;
        for &key in fixed {
            index = index.insert(key).subtree_mut();
        }

        let mut registration = Registration::default();
        for key in keys {
            let node = index.insert(key as u8);

            if node.handlers_mut().append(name.clone(), handler.clone()) {
                registration.attached += 1;
            } else {
                registration.skipped += 1;
            }
        }

        Ok(registration)
    }

    /// Whether any node of `keys` under the `fixed` path already binds `name`.
    fn any_bound(&self, fixed: &[u8], keys: Range<u16>, name: &HandlerName) -> bool {
        let Some(index) = self.level_below(fixed) else {
            return false;
        };

        keys.filter_map(|key| index.get(key as u8))
            .filter_map(|node| node.handlers())
            .any(|chain| chain.contains(name))
    }

    /// The index reached by following `path` from the root, if it exists.
    fn level_below(&self, path: &[u8]) -> Option<&OctetIndex> {
        path.iter()
            .try_fold(&self.root, |index, key| index.get(*key).map(|node| node.subtree()))
    }
}
