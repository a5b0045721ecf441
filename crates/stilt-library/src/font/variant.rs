use std::fmt::{self, Debug, Formatter};

/// Properties that distinguish a face from other faces in the same
/// family.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FontVariant {
    /// The style of the face (normal / italic / oblique).
    pub style: FontStyle,
    /// Whether the face renders lowercase as small capitals.
    pub caps: FontCaps,
    /// How heavy the face is (100 - 900).
    pub weight: FontWeight,
}

impl FontVariant {
    /// Create a variant from its three components.
    pub const fn new(style: FontStyle, caps: FontCaps, weight: FontWeight) -> Self {
        Self { style, caps, weight }
    }

    /// Parse a variant from its CSS `font-style`, `font-variant` and
    /// `font-weight` values. Returns `None` if any value is unknown.
    pub fn from_css(style: &str, caps: &str, weight: &str) -> Option<Self> {
        Some(Self {
            style: FontStyle::from_css(style)?,
            caps: FontCaps::from_css(caps)?,
            weight: FontWeight::from_css(weight)?,
        })
    }
}

impl Debug for FontVariant {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}-{:?}-{:?}", self.style, self.caps, self.weight)
    }
}

/// The style of a font face.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FontStyle {
    /// The default, upright style.
    #[default]
    Normal,
    /// A cursive style with custom letterforms.
    Italic,
    /// A slanted version of the normal style.
    Oblique,
}

impl FontStyle {
    /// Parse a CSS `font-style` value.
    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "" | "normal" => Some(Self::Normal),
            "italic" => Some(Self::Italic),
            "oblique" => Some(Self::Oblique),
            _ => None,
        }
    }
}

impl Debug for FontStyle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        })
    }
}

/// The capitalization treatment of a font face.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FontCaps {
    /// The default letterforms.
    #[default]
    Normal,
    /// Lowercase rendered as scaled-down capitals.
    SmallCaps,
}

impl FontCaps {
    /// Parse a CSS `font-variant` value.
    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "" | "normal" => Some(Self::Normal),
            "small-caps" => Some(Self::SmallCaps),
            _ => None,
        }
    }
}

impl Debug for FontCaps {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::Normal => "normal",
            Self::SmallCaps => "small-caps",
        })
    }
}

/// The weight of a font face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FontWeight(u16);

impl FontWeight {
    /// Regular weight (400).
    pub const REGULAR: Self = Self(400);

    /// Bold weight (700).
    pub const BOLD: Self = Self(700);

    /// Create a font weight from a number between 100 and 900,
    /// clamping it if necessary.
    pub fn from_number(weight: u16) -> Self {
        Self(weight.clamp(100, 900))
    }

    /// The number between 100 and 900.
    pub const fn to_number(self) -> u16 {
        self.0
    }

    /// Parse a CSS `font-weight` value.
    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "" | "normal" => Some(Self::REGULAR),
            "bold" => Some(Self::BOLD),
            _ => value.parse().ok().map(Self::from_number),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::REGULAR
    }
}

impl Debug for FontWeight {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_css() {
        assert_eq!(
            FontVariant::from_css("italic", "", "bold"),
            Some(FontVariant::new(
                FontStyle::Italic,
                FontCaps::Normal,
                FontWeight::BOLD
            ))
        );
        assert_eq!(
            FontVariant::from_css("", "", "350"),
            Some(FontVariant::new(
                FontStyle::Normal,
                FontCaps::Normal,
                FontWeight::from_number(350)
            ))
        );
        assert_eq!(FontVariant::from_css("wavy", "", ""), None);
    }
}
