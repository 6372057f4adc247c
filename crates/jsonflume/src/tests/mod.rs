mod arbitrary;
pub(crate) mod support;
