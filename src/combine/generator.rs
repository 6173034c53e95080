use std::collections::BTreeSet;

use crate::combine::combination::{Combination, Pick, Picks};
use crate::combine::mutex::{MutexConflict, MutexEvaluator};
use crate::combine::sequence::{SequenceIndex, TagCandidates};
use crate::model::stack::LayerSnapshot;
use crate::model::tag::SequenceTag;

/// Upper bound on distinct conflicts kept when every combination is excluded.
pub const MAX_REPORTED_CONFLICTS: usize = 32;

/// Why a snapshot produced nothing to combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    /// No group is enabled.
    NoEnabledGroups,
    /// Enabled groups exist but hold no variants.
    NoVariants,
    /// Every variant is a wildcard, so no tag forms a combination.
    NoSequenceTags,
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoEnabledGroups => "no enabled layer groups",
            Self::NoVariants => "enabled layer groups hold no images",
            Self::NoSequenceTags => "only wildcard (00) images, no sequence tag to combine",
        })
    }
}

/// Result of enumerating a snapshot.
#[derive(Clone, Debug)]
pub enum GenerationOutcome<'a> {
    /// At least one legal combination, in generation order.
    Ready(Vec<Combination<'a>>),
    /// Nothing to combine.
    ConfigurationEmpty(EmptyReason),
    /// Combinations existed but mutex rules removed all of them.
    AllCombinationsExcluded {
        /// Number of rejected combinations.
        rejected: usize,
        /// Distinct violated rules, at most [`MAX_REPORTED_CONFLICTS`].
        conflicts: Vec<MutexConflict>,
    },
}

impl<'a> GenerationOutcome<'a> {
    /// Legal combinations, empty for the non-ready statuses.
    pub fn combinations(&self) -> &[Combination<'a>] {
        match self {
            Self::Ready(c) => c,
            _ => &[],
        }
    }

    /// Consume into the legal combinations.
    pub fn into_combinations(self) -> Vec<Combination<'a>> {
        match self {
            Self::Ready(c) => c,
            _ => Vec::new(),
        }
    }
}

/// Enumerates every legal combination of a snapshot, one cartesian product per tag.
///
/// Tags are visited in ascending order and their products are emitted independently, so
/// two tags resolving to the same picks (all-wildcard groups) both appear.
#[derive(Clone, Debug)]
pub struct CombinationGenerator<'a> {
    snapshot: &'a LayerSnapshot,
    index: SequenceIndex<'a>,
    evaluator: MutexEvaluator,
}

impl<'a> CombinationGenerator<'a> {
    /// Index `snapshot` for generation.
    pub fn new(snapshot: &'a LayerSnapshot) -> Self {
        Self {
            snapshot,
            index: SequenceIndex::build(snapshot),
            evaluator: MutexEvaluator,
        }
    }

    /// The underlying sequence index.
    pub fn index(&self) -> &SequenceIndex<'a> {
        &self.index
    }

    /// Unfiltered cartesian product for one tag; first group varies slowest.
    pub fn product(&self, tag: &SequenceTag) -> CartesianProduct<'a> {
        CartesianProduct::new(self.index.candidates(tag))
    }

    /// Lazily stream legal combinations across all tags.
    pub fn iter(&self) -> impl Iterator<Item = Combination<'a>> + '_ {
        self.index
            .tags()
            .flat_map(move |tag| {
                self.product(tag)
                    .filter(move |picks| self.evaluator.picks_are_legal(picks))
                    .map(move |picks| (tag.clone(), picks))
            })
            .enumerate()
            .map(|(id, (tag, picks))| Combination {
                id,
                tag: Some(tag),
                picks,
            })
    }

    /// Enumerate everything and classify the result.
    #[tracing::instrument(skip(self), fields(tags = self.index.tag_count()))]
    pub fn generate(&self) -> GenerationOutcome<'a> {
        if let Some(reason) = self.empty_reason() {
            tracing::info!(%reason, "nothing to combine");
            return GenerationOutcome::ConfigurationEmpty(reason);
        }

        let mut legal = Vec::new();
        let mut rejected = 0usize;
        let mut conflicts = BTreeSet::new();
        for tag in self.index.tags() {
            let mut kept = 0usize;
            for picks in self.product(tag) {
                if self.evaluator.picks_are_legal(&picks) {
                    legal.push(Combination {
                        id: legal.len(),
                        tag: Some(tag.clone()),
                        picks,
                    });
                    kept += 1;
                } else {
                    rejected += 1;
                    if conflicts.len() < MAX_REPORTED_CONFLICTS {
                        conflicts.extend(self.evaluator.conflicts(&picks));
                    }
                }
            }
            tracing::debug!(%tag, kept, "tag enumerated");
        }

        if legal.is_empty() {
            tracing::info!(rejected, "every combination excluded by mutex rules");
            return GenerationOutcome::AllCombinationsExcluded {
                rejected,
                conflicts: conflicts.into_iter().take(MAX_REPORTED_CONFLICTS).collect(),
            };
        }
        tracing::info!(legal = legal.len(), rejected, "combinations generated");
        GenerationOutcome::Ready(legal)
    }

    fn empty_reason(&self) -> Option<EmptyReason> {
        if self.snapshot.enabled_groups().next().is_none() {
            return Some(EmptyReason::NoEnabledGroups);
        }
        if self.snapshot.enabled_variant_count() == 0 {
            return Some(EmptyReason::NoVariants);
        }
        if self.index.tag_count() == 0 {
            return Some(EmptyReason::NoSequenceTags);
        }
        None
    }
}

/// Odometer over per-group candidate lists.
#[derive(Clone, Debug)]
pub struct CartesianProduct<'a> {
    lists: Vec<TagCandidates<'a>>,
    cursor: Vec<usize>,
    done: bool,
}

impl<'a> CartesianProduct<'a> {
    fn new(lists: Vec<TagCandidates<'a>>) -> Self {
        // candidate lists are never empty; an empty product means no groups at all
        let done = lists.is_empty();
        Self {
            cursor: vec![0; lists.len()],
            lists,
            done,
        }
    }

    /// Total number of tuples, saturating on overflow.
    pub fn len_hint(&self) -> usize {
        if self.lists.is_empty() {
            return 0;
        }
        self.lists
            .iter()
            .fold(1usize, |acc, l| acc.saturating_mul(l.variants.len()))
    }
}

impl<'a> Iterator for CartesianProduct<'a> {
    type Item = Picks<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let picks: Picks<'a> = self
            .lists
            .iter()
            .zip(&self.cursor)
            .map(|(l, &i)| Pick::new(l.group, l.variants[i]))
            .collect();

        // advance, last list fastest
        self.done = true;
        for pos in (0..self.cursor.len()).rev() {
            self.cursor[pos] += 1;
            if self.cursor[pos] < self.lists[pos].variants.len() {
                self.done = false;
                break;
            }
            self.cursor[pos] = 0;
        }
        Some(picks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/combine/generator.rs"]
mod tests;
