use std::collections::BTreeSet;

use crate::model::layer::{ImageVariant, MutexTarget, VariantId};

/// Discrete edit applied to a [`crate::LayerStack`] between runs.
///
/// Commands either apply fully or leave the stack untouched.
#[derive(Clone, Debug)]
pub enum LayerCommand {
    /// Append an empty, enabled group.
    AddGroup {
        /// New unique name.
        name: String,
        /// Render order, must not collide with another enabled group.
        order: i32,
    },
    /// Delete a group and every exclusion that names it.
    RemoveGroup {
        /// Group to delete.
        name: String,
    },
    /// Rename a group, rewriting exclusions that reference it.
    RenameGroup {
        /// Current name.
        from: String,
        /// New unique name.
        to: String,
    },
    /// Change a group's render order.
    SetOrder {
        /// Target group.
        group: String,
        /// New order.
        order: i32,
    },
    /// Enable or disable a group.
    SetEnabled {
        /// Target group.
        group: String,
        /// New state.
        enabled: bool,
    },
    /// Flip a group's enabled flag.
    ToggleEnabled {
        /// Target group.
        group: String,
    },
    /// Append a variant to a group.
    AddVariant {
        /// Target group.
        group: String,
        /// Variant to append; its id must be new to the group.
        variant: ImageVariant,
    },
    /// Remove a variant together with its exclusions and any exclusion naming it.
    RemoveVariant {
        /// Owning group.
        group: String,
        /// Variant identity.
        id: VariantId,
    },
    /// Replace the exclusions declared on one variant. An empty set clears them.
    SetMutex {
        /// Owning group.
        group: String,
        /// Declaring variant.
        id: VariantId,
        /// New exclusion set.
        targets: BTreeSet<MutexTarget>,
    },
    /// Sort a group's variants by natural file-name order.
    SortVariants {
        /// Target group.
        group: String,
    },
    /// Move the editor selection of a group.
    SelectVariant {
        /// Target group.
        group: String,
        /// Variant index inside the group.
        index: usize,
    },
}

impl LayerCommand {
    /// Name of the group the command addresses.
    pub fn group_name(&self) -> &str {
        match self {
            Self::AddGroup { name, .. } | Self::RemoveGroup { name } => name,
            Self::RenameGroup { from, .. } => from,
            Self::SetOrder { group, .. }
            | Self::SetEnabled { group, .. }
            | Self::ToggleEnabled { group }
            | Self::AddVariant { group, .. }
            | Self::RemoveVariant { group, .. }
            | Self::SetMutex { group, .. }
            | Self::SortVariants { group }
            | Self::SelectVariant { group, .. } => group,
        }
    }
}
