use std::collections::HashSet;

use leadgen_core::{IdentityKey, QualifiedLead, RawRecord};

/// Raw records whose identity has no qualified row yet, in input order.
///
/// Matching is exact equality on normalized identity keys. An empty qualified
/// set returns every raw record.
#[must_use]
pub fn pending_records(raw: Vec<RawRecord>, qualified: &[QualifiedLead]) -> Vec<RawRecord> {
    let known: HashSet<&IdentityKey> = qualified.iter().map(|q| &q.identity).collect();
    raw.into_iter()
        .filter(|record| !known.contains(&record.identity()))
        .collect()
}
