//! Per-codepoint text attributes.

mod attrs;
pub(crate) mod lang;

pub use self::attrs::{AttrFlags, AttrIndex, Attrs, Shadow};
pub use self::lang::Lang;
