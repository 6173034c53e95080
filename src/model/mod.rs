//! Layer model: groups owning image variants, editor commands and run snapshots.

pub(crate) mod command;
pub(crate) mod layer;
pub(crate) mod stack;
pub(crate) mod tag;
