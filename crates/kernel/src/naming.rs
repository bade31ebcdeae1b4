//! Unique-name generation.
//!
//! Internal events, and events declared without a basename, receive
//! generator-produced names of the form `base_0`, `base_1`, and so on, one
//! counter per base string. The generator is owned by the kernel session, so
//! two sessions never share counter state.

use std::collections::HashMap;

/// Per-base-string counter for generated names.
#[derive(Debug, Default)]
pub(crate) struct UniqueNameGen {
    counts: HashMap<String, u64>,
}

impl UniqueNameGen {
    /// Returns the next generated name for `base`.
    ///
    /// The first call for a given base yields `base_0`, then `base_1`, and
    /// so on. Counters never reset within a session, so a generated name is
    /// never handed out twice even after the event carrying it is destroyed.
    pub(crate) fn generate(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        let name = format!("{base}_{count}");
        *count += 1;
        name
    }
}
