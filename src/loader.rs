//! Bulk loading of handler lists.
//!
//! A list is a sequence of blocks, each a handler name on its own line
//! followed by entries prefixed with `>`:
//!
//! ```text
//! scanners
//! >10.0.0.1
//! >192.168.170.0/23
//! tor-exits
//! >185.220.101.4
//! ```
//!
//! Entries holding a `/` are registered as subnets, the rest as exact
//! addresses. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::common::{parse_ipv4, Cidr, Handler, HandlerName, SharedHandler};
use crate::index::{AddressIndex, Registration};
use crate::Result;

const ENTRY_PREFIX: char = '>';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Counters collected while loading a list.
pub struct LoadSummary {
    /// Entries registered successfully.
    pub entries: usize,
    /// Nodes a handler was bound to, a subnet entry binds several.
    pub bindings: usize,
    /// Nodes skipped because they already carried the handler name.
    pub skipped: usize,
    /// Entries that failed to parse or register.
    pub rejected: usize,
    /// Entries appearing before any valid handler name.
    pub orphaned: usize,
}

/// Register every entry of the list read from `reader` in `index`, bound to
/// `handler` under the name of its block.
///
/// Invalid names and entries are logged and counted, only I/O errors abort
/// the load.
pub fn load<R, H>(index: &mut AddressIndex, reader: R, handler: H) -> Result<LoadSummary>
where
    R: BufRead,
    H: Handler + 'static,
{
    let handler: SharedHandler = Arc::new(handler);
    let mut summary = LoadSummary::default();
    let mut current: Option<HandlerName> = None;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let number = number + 1;

        if line.is_empty() {
            continue;
        }

        let Some(entry) = line.strip_prefix(ENTRY_PREFIX) else {
            current = match HandlerName::new(line) {
                Ok(name) => Some(name),
                Err(error) => {
                    warn!(line = number, ?error, "Invalid handler name");
                    None
                }
            };
            continue;
        };

        let Some(name) = &current else {
            summary.orphaned += 1;
            continue;
        };

        match register(index, entry.trim(), name, handler.clone()) {
            Ok(registration) => {
                summary.entries += 1;
                summary.bindings += registration.attached;
                summary.skipped += registration.skipped;
            }
            Err(error) => {
                warn!(line = number, entry, %name, ?error, "Rejected entry");
                summary.rejected += 1;
            }
        }
    }

    debug!(?summary, "Loaded list");

    Ok(summary)
}

/// [load] the list stored at `path`.
pub fn load_file<P, H>(index: &mut AddressIndex, path: P, handler: H) -> Result<LoadSummary>
where
    P: AsRef<Path>,
    H: Handler + 'static,
{
    let file = File::open(path)?;

    load(index, BufReader::new(file), handler)
}

fn register(
    index: &mut AddressIndex,
    entry: &str,
    name: &HandlerName,
    handler: SharedHandler,
) -> Result<Registration> {
    if entry.contains('/') {
        index.bind_subnet(Cidr::parse(entry)?, name, handler)
    } else {
        index.bind_address(parse_ipv4(entry)?, name, handler)
    }
}
