use std::collections::BTreeSet;

use crate::model::layer::{ImageVariant, LayerGroup};
use crate::model::stack::LayerSnapshot;
use crate::model::tag::SequenceTag;

/// Variants of one group eligible for a requested tag.
#[derive(Clone, Debug)]
pub struct TagCandidates<'a> {
    /// Owning group.
    pub group: &'a LayerGroup,
    /// Eligible variants in display order; never empty.
    pub variants: Vec<&'a ImageVariant>,
}

/// Tag lookup over an immutable snapshot.
#[derive(Clone, Debug)]
pub struct SequenceIndex<'a> {
    snapshot: &'a LayerSnapshot,
    tags: BTreeSet<SequenceTag>,
}

impl<'a> SequenceIndex<'a> {
    /// Collect the distinct non-wildcard tags of all enabled groups.
    pub fn build(snapshot: &'a LayerSnapshot) -> Self {
        let tags = snapshot
            .enabled_groups()
            .flat_map(|g| g.variants.iter())
            .map(|v| &v.sequence_tag)
            .filter(|t| !t.is_wildcard())
            .cloned()
            .collect();
        Self { snapshot, tags }
    }

    /// Distinct tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = &SequenceTag> + '_ {
        self.tags.iter()
    }

    /// Number of distinct tags.
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Per enabled group (ascending order), the variants matching `tag` or the wildcard.
    ///
    /// Groups without a match are left out rather than reported.
    pub fn candidates(&self, tag: &SequenceTag) -> Vec<TagCandidates<'a>> {
        self.snapshot
            .enabled_groups()
            .filter_map(|group| {
                let variants: Vec<_> = group.candidates_for(tag).collect();
                (!variants.is_empty()).then_some(TagCandidates { group, variants })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/combine/sequence.rs"]
mod tests;
