//! Named handler callbacks and the ordered chains attached to index nodes.

use std::fmt::{self, Debug, Display, Formatter};
use std::net::Ipv4Addr;
use std::num::NonZeroU32;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Maximum length of a [HandlerName] in bytes.
pub const MAX_HANDLER_NAME_LEN: usize = 49;

/// A callback invoked with every queried address that reaches its node.
///
/// Returning `0` means "no opinion" and lets the match continue, any
/// positive value stops the match and becomes its result.
///
/// Implemented for every `Fn(Ipv4Addr) -> u32 + Send + Sync`, so plain
/// functions and closures (stateful ones included) can be registered directly.
pub trait Handler: Send + Sync {
    fn handle(&self, address: Ipv4Addr) -> u32;
}

impl<F> Handler for F
where
    F: Fn(Ipv4Addr) -> u32 + Send + Sync,
{
    fn handle(&self, address: Ipv4Addr) -> u32 {
        self(address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Handler returning the same outcome for every address.
pub struct Constant(pub u32);

impl Handler for Constant {
    fn handle(&self, _address: Ipv4Addr) -> u32 {
        self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Validated handler identifier, non empty and at most [MAX_HANDLER_NAME_LEN] bytes.
pub struct HandlerName(String);

impl HandlerName {
    pub fn new(name: impl Into<String>) -> Result<HandlerName> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::EmptyHandlerName);
        }
        if name.len() > MAX_HANDLER_NAME_LEN {
            return Err(Error::HandlerNameTooLong {
                len: name.len(),
                max: MAX_HANDLER_NAME_LEN,
            });
        }

        Ok(HandlerName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for HandlerName {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        HandlerName::new(name)
    }
}

impl AsRef<str> for HandlerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for HandlerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for HandlerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerName({:?})", self.0)
    }
}

impl Serialize for HandlerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A handler shared by every node a registration expanded into.
pub type SharedHandler = Arc<dyn Handler>;

#[derive(Clone)]
/// One named binding of a handler to a node.
pub struct Binding {
    name: HandlerName,
    handler: SharedHandler,
}

impl Binding {
    pub fn new(name: HandlerName, handler: SharedHandler) -> Self {
        Binding { name, handler }
    }

    pub fn name(&self) -> &HandlerName {
        &self.name
    }

    pub fn handle(&self, address: Ipv4Addr) -> u32 {
        self.handler.handle(address)
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Default)]
/// Insertion ordered bindings with unique names.
pub struct HandlerChain {
    bindings: Vec<Binding>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    // === Getters ===

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, name: &HandlerName) -> bool {
        self.bindings.iter().any(|binding| &binding.name == name)
    }

    /// Names of the bindings in chain order.
    pub fn names(&self) -> impl Iterator<Item = &HandlerName> {
        self.bindings.iter().map(|binding| &binding.name)
    }

    // === Public Methods ===

    /// Append a binding at the tail, and return `true` if it did.
    ///
    /// Returns `false`, leaving the chain untouched, if `name` is already bound.
    pub fn append(&mut self, name: HandlerName, handler: SharedHandler) -> bool {
        if self.contains(&name) {
            return false;
        }

        self.bindings.push(Binding::new(name, handler));

        true
    }

    /// Call every handler in order until one returns a positive outcome,
    /// returning that outcome together with the handler's name.
    pub fn first_positive(&self, address: Ipv4Addr) -> Option<(&HandlerName, NonZeroU32)> {
        self.bindings.iter().find_map(|binding| {
            NonZeroU32::new(binding.handle(address)).map(|outcome| (&binding.name, outcome))
        })
    }

    /// Outcome of [Self::first_positive], or `0` if no handler claimed the address.
    pub fn evaluate(&self, address: Ipv4Addr) -> u32 {
        self.first_positive(address)
            .map_or(0, |(_, outcome)| outcome.get())
    }
}

impl Serialize for HandlerChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
