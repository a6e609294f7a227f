//! Miscellaneous common structs used throughout the library.

mod address;
mod handler;
mod octet_index;

pub use address::*;
pub use handler::*;
pub use octet_index::*;
