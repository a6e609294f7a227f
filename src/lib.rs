#![doc = include_str!("../README.md")]

// Public modules
mod common;
mod error;
pub mod index;
pub mod loader;

#[cfg(test)]
mod proptests;

pub use crate::common::{
    parse_ipv4, Binding, Cidr, Constant, Handler, HandlerChain, HandlerName, OctetIndex,
    OctetNode, SharedHandler, LEVELS, MAX_HANDLER_NAME_LEN, MAX_PREFIX_LEN, MIN_PREFIX_LEN,
};
pub use error::{Error, Result};
pub use index::{
    node_to_json, AddressIndex, Config, DuplicatePolicy, Registration, SharedIndex, Verdict,
};
