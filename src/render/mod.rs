//! Back-to-front alpha compositing of combinations.

pub(crate) mod blend;
pub(crate) mod composite;
