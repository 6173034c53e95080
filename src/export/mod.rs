//! Bulk export of combinations to PNG files.

pub(crate) mod coordinator;
pub(crate) mod naming;
pub(crate) mod report;
pub(crate) mod write;
