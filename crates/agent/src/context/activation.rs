//! Which registered entries take part in a composition.
//!
//! Forced entries are the roots. A cascading root also pulls in every
//! entry whose keys occur in its text, and transitively the entries
//! those mention, up to a depth cap. A pair that mention each other is
//! taken once and not followed further.

use std::cmp::Reverse;

use super::entry::ContextEntry;

/// True if any non-empty key of `b` occurs in `a`'s text.
pub fn key_lookup(a: &ContextEntry, b: &ContextEntry) -> bool {
    a.mentions(b)
}

/// Indices of the entries cascaded from `entries[root]`, in discovery order.
///
/// The root itself is never part of the result. Expansion stops at a
/// mutual mention or once `max_depth` levels have been followed.
pub fn cascade_lookup(entries: &[ContextEntry], root: usize, max_depth: usize) -> Vec<usize> {
    let mut walk = Cascade {
        entries,
        root,
        max_depth,
        expanded_at: vec![None; entries.len()],
        found: Vec::new(),
    };
    walk.expand(root, 0);
    walk.found
}

struct Cascade<'a> {
    entries: &'a [ContextEntry],
    root: usize,
    max_depth: usize,
    // Shallowest depth each entry was expanded from.
    expanded_at: Vec<Option<usize>>,
    found: Vec<usize>,
}

impl Cascade<'_> {
    fn expand(&mut self, current: usize, depth: usize) {
        let entries = self.entries;
        let source = &entries[current];

        for (idx, candidate) in entries.iter().enumerate() {
            if idx == current || idx == self.root || !key_lookup(source, candidate) {
                continue;
            }
            if !self.found.contains(&idx) {
                self.found.push(idx);
            }
            if key_lookup(candidate, source) {
                continue;
            }

            let next = depth + 1;
            if next > self.max_depth || self.expanded_at[idx].is_some_and(|d| d <= next) {
                continue;
            }
            self.expanded_at[idx] = Some(next);
            self.expand(idx, next);
        }
    }
}

/// Indices of the active entries, ordered for composition.
///
/// Higher `insertion_order` comes first; ties keep registration order.
pub fn resolve(entries: &[ContextEntry], max_depth: usize) -> Vec<usize> {
    let mut ordered: Vec<usize> = (0..entries.len()).collect();
    ordered.sort_by_key(|&idx| (Reverse(entries[idx].insertion_order), idx));

    let mut active = vec![false; entries.len()];
    for &idx in &ordered {
        let entry = &entries[idx];
        if !entry.forced_activation {
            continue;
        }
        active[idx] = true;
        if entry.cascading_activation {
            for cascaded in cascade_lookup(entries, idx, max_depth) {
                active[cascaded] = true;
            }
        }
    }

    let activated: Vec<usize> = ordered.into_iter().filter(|&idx| active[idx]).collect();
    tracing::debug!(
        registered = entries.len(),
        activated = activated.len(),
        "Resolved active entries"
    );
    activated
}
