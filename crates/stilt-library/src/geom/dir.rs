use std::fmt::{self, Debug, Formatter};

/// The dominant direction of a run of text.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Text flows from left to right.
    #[default]
    LTR,
    /// Text flows from right to left.
    RTL,
}

impl Dir {
    /// Parse a CSS `direction` value. Unknown values fall back to
    /// left-to-right.
    pub fn from_css(value: &str) -> Self {
        match value {
            "rtl" => Self::RTL,
            "ltr" | "" => Self::LTR,
            other => {
                log::warn!("unknown direction {other:?}, assuming ltr");
                Self::LTR
            }
        }
    }

    /// Whether this is the right-to-left direction.
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::RTL)
    }
}

impl Debug for Dir {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::LTR => "ltr",
            Self::RTL => "rtl",
        })
    }
}
