/// What to do when a handler name is registered again on a node that
/// already carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the whole registration with [crate::Error::DuplicateHandler],
    /// leaving the index untouched.
    Reject,
    /// Skip the nodes already bound to that name and bind the rest,
    /// reporting the skipped count in [super::Registration::skipped].
    Ignore,
}

#[derive(Debug, Clone)]
/// AddressIndex Configurations
pub struct Config {
    /// Policy for re-registering a handler name on the same node.
    ///
    /// Defaults to [DuplicatePolicy::Reject]
    pub duplicate_handlers: DuplicatePolicy,
    /// Refuse to register the limited broadcast address `255.255.255.255`,
    /// which legacy `inet_addr` based loaders could not tell apart from a
    /// parse error.
    ///
    /// Defaults to `false`
    pub reject_limited_broadcast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_handlers: DuplicatePolicy::Reject,
            reject_limited_broadcast: false,
        }
    }
}
