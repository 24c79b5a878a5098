//! Identifier generation injected into every operation that creates nodes,
//! edges or figures, so geometry stays deterministic under test.

use crate::model::Figure;

pub trait IdSource {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Monotonic counter producing `"{prefix}-{n}"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn starting_at(next: u64) -> Self {
        SequentialIds { next }
    }

    /// Counter seeded above every numeric id suffix found in `figures`, so
    /// ids minted after loading a document never collide with stored ones.
    pub fn after(figures: &[Figure]) -> Self {
        let mut max = 0u64;
        let mut see = |id: &str| {
            if let Some(n) = id.rsplit('-').next().and_then(|s| s.parse::<u64>().ok()) {
                max = max.max(n + 1);
            }
        };
        for f in figures {
            see(&f.id);
            f.nodes.iter().for_each(|n| see(&n.id));
            f.edges.iter().for_each(|e| see(&e.id));
        }
        SequentialIds { next: max }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{prefix}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Tool};

    #[test]
    fn sequential_ids_are_unique() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id("n"), "n-0");
        assert_eq!(ids.next_id("e"), "e-1");
    }

    #[test]
    fn after_skips_existing_suffixes() {
        let mut f = Figure::new("fig-3", Tool::Line);
        f.nodes.push(Node::new("n-41", 0.0, 0.0));
        f.nodes.push(Node::new("custom", 0.0, 0.0));
        let mut ids = SequentialIds::after(&[f]);
        assert_eq!(ids.next_id("n"), "n-42");
    }
}
