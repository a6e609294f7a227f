//! Main Crate Error

use std::net::Ipv4Addr;

#[derive(thiserror::Error, Debug)]
/// Octet-tree crate error enum.
pub enum Error {
    /// The text is not a strict dotted-quad IPv4 address.
    #[error("Invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    /// A subnet was given without the `/` separating address and prefix length.
    #[error("Missing '/' in subnet: {0:?}")]
    MissingPrefixSeparator(String),

    /// The prefix length of a subnet is not a number.
    #[error("Invalid prefix length: {0:?}")]
    InvalidPrefixLength(String),

    /// Only prefix lengths in `8..32` can be expanded into octet keys.
    #[error("Prefix length {0} is out of range, expected 8..32")]
    PrefixOutOfRange(u32),

    /// The subnet address has host bits set below its prefix length.
    #[error("Subnet {network}/{prefix_len} is not canonical: host bits are set")]
    NonCanonicalSubnet {
        /// The address as supplied.
        network: Ipv4Addr,
        /// The supplied prefix length.
        prefix_len: u8,
    },

    /// A handler with the same name is already bound to one of the target nodes.
    #[error("Handler {0:?} is already registered")]
    DuplicateHandler(String),

    #[error("Handler name is empty")]
    EmptyHandlerName,

    /// Handler names are bounded, see [crate::MAX_HANDLER_NAME_LEN].
    #[error("Handler name is {len} bytes long, maximum is {max}")]
    HandlerNameTooLong { len: usize, max: usize },

    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),

    #[error("Failed to serialize index: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for results returned by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
