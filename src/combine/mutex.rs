use std::fmt;

use crate::combine::combination::{Combination, Pick};
use crate::model::layer::{MutexTarget, VariantId};

/// One violated exclusion: `declared_by` names `excluded` through `target`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutexConflict {
    /// Group declaring the rule.
    pub group: String,
    /// Variant declaring the rule.
    pub variant: VariantId,
    /// Group of the excluded pick.
    pub other_group: String,
    /// Excluded pick.
    pub other_variant: VariantId,
    /// Rule that matched.
    pub target: MutexTarget,
}

impl fmt::Display for MutexConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} excludes {}:{} ({})",
            self.group, self.variant, self.other_group, self.other_variant, self.target
        )
    }
}

/// Stateless legality checks over picks borrowed from an immutable snapshot.
///
/// A pick's rules are compared against every *other* pick; a rule naming its own group
/// never fires. Checking every pick's rules makes the relation symmetric: a rule declared
/// only on A still rejects A+B.
#[derive(Clone, Copy, Debug, Default)]
pub struct MutexEvaluator;

impl MutexEvaluator {
    /// `true` when no pick excludes another pick of the same combination.
    pub fn is_legal(&self, combination: &Combination<'_>) -> bool {
        self.picks_are_legal(&combination.picks)
    }

    /// Slice form of [`MutexEvaluator::is_legal`].
    pub fn picks_are_legal(&self, picks: &[Pick<'_>]) -> bool {
        picks.iter().enumerate().all(|(i, pick)| {
            let Some(rules) = pick.group.mutex_for(&pick.variant.id) else {
                return true;
            };
            !picks
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .any(|(_, other)| {
                    rules
                        .iter()
                        .any(|t| t.matches(&other.group.name, &other.variant.id))
                })
        })
    }

    /// Every violated rule, in pick order.
    pub fn conflicts(&self, picks: &[Pick<'_>]) -> Vec<MutexConflict> {
        let mut out = Vec::new();
        for (i, pick) in picks.iter().enumerate() {
            let Some(rules) = pick.group.mutex_for(&pick.variant.id) else {
                continue;
            };
            for (j, other) in picks.iter().enumerate() {
                if i == j {
                    continue;
                }
                for target in rules {
                    if target.matches(&other.group.name, &other.variant.id) {
                        out.push(MutexConflict {
                            group: pick.group.name.clone(),
                            variant: pick.variant.id.clone(),
                            other_group: other.group.name.clone(),
                            other_variant: other.variant.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/combine/mutex.rs"]
mod tests;
