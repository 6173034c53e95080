use smallvec::SmallVec;

use crate::model::layer::{ImageVariant, LayerGroup};
use crate::model::stack::LayerSnapshot;
use crate::model::tag::SequenceTag;

/// One chosen variant of one group.
#[derive(Clone, Copy, Debug)]
pub struct Pick<'a> {
    /// Owning group.
    pub group: &'a LayerGroup,
    /// Chosen variant.
    pub variant: &'a ImageVariant,
}

impl<'a> Pick<'a> {
    /// Pair a group with one of its variants.
    pub fn new(group: &'a LayerGroup, variant: &'a ImageVariant) -> Self {
        Self { group, variant }
    }
}

/// Inline capacity covers typical sprite rigs without spilling to the heap.
pub type Picks<'a> = SmallVec<[Pick<'a>; 8]>;

/// One concrete selection of exactly one variant per participating group.
///
/// Borrows the [`LayerSnapshot`] it was generated from.
#[derive(Clone, Debug)]
pub struct Combination<'a> {
    /// Position in generation order; stable for a given snapshot.
    pub id: usize,
    /// Tag this combination was generated for. `None` for hand-assembled selections.
    pub tag: Option<SequenceTag>,
    /// Picks in ascending group order.
    pub picks: Picks<'a>,
}

impl<'a> Combination<'a> {
    /// Assemble a combination from explicit picks.
    pub fn new(
        id: usize,
        tag: Option<SequenceTag>,
        picks: impl IntoIterator<Item = Pick<'a>>,
    ) -> Self {
        Self {
            id,
            tag,
            picks: picks.into_iter().collect(),
        }
    }

    /// The editor's current selection: each enabled group's selected variant.
    ///
    /// Groups without variants are omitted.
    pub fn current_selection(snapshot: &'a LayerSnapshot) -> Self {
        let picks = snapshot
            .enabled_groups()
            .filter_map(|g| g.current_variant().map(|v| Pick::new(g, v)));
        Self::new(0, None, picks)
    }

    /// Number of participating groups.
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    /// Return `true` when no group participates.
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Human-readable `group=variant` listing, for logs and reports.
    pub fn describe(&self) -> String {
        self.picks
            .iter()
            .map(|p| format!("{}={}", p.group.name, p.variant.base_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
