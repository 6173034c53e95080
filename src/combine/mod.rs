//! Sequence-tag indexing, mutex evaluation and combination enumeration.

pub(crate) mod combination;
pub(crate) mod generator;
pub(crate) mod mutex;
pub(crate) mod sequence;
