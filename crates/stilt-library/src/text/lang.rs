use std::fmt::{self, Debug, Formatter};

use ecow::EcoString;

/// A BCP-47-style language tag, e.g. `en` or `zh-Hans`.
///
/// The empty tag means "unknown" and matches nothing.
#[derive(Default, Clone, Eq, PartialEq, Hash)]
pub struct Lang(EcoString);

impl Lang {
    /// Create a tag from its textual form.
    pub fn new(tag: impl Into<EcoString>) -> Self {
        Self(tag.into())
    }

    /// The textual form of the tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no language is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the tag equals `prefix` or starts with `prefix`
    /// followed by a subtag separator. This is the `|=` matching rule.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        lang_prefix_eq(&self.0, prefix)
    }
}

/// Whether `tag` equals `prefix` or starts with `prefix-`.
pub(crate) fn lang_prefix_eq(tag: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && tag
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

impl Debug for Lang {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        assert!(Lang::new("en").matches_prefix("en"));
        assert!(Lang::new("en-US").matches_prefix("en"));
        assert!(!Lang::new("enx").matches_prefix("en"));
        assert!(!Lang::new("en").matches_prefix(""));
    }
}
