//! Error handling.

use std::fmt::{self, Display, Formatter};

use ecow::EcoString;

use crate::font::FontVariant;

/// A result of a layout operation.
pub type LayoutResult<T> = Result<T, Error>;

/// Everything that can go wrong while laying out a document.
///
/// Errors abort the whole layout; there is no partial-result mode.
/// Variants carrying a `path` report the slash-separated DOM ancestry
/// of the offending element (e.g. `/html/body/table/tr/td`).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The XHTML input is not well-formed.
    Parse {
        /// The parser's own description of the problem.
        description: EcoString,
        /// 1-based line and column of the error.
        line: u32,
        col: u32,
        /// A window of up to 40 characters around the error offset.
        context: EcoString,
    },
    /// An element that is not allowed at its position.
    UnexpectedTag { path: EcoString },
    /// An attribute that is not allowed on its element.
    UnexpectedAttribute { path: EcoString },
    /// A property value that cannot be interpreted.
    BadValue { property: EcoString, value: EcoString },
    /// No face in the family matches the requested variant.
    FontNotFound {
        family: EcoString,
        variant: FontVariant,
        path: EcoString,
    },
    /// The shape is too narrow to fit even a single cluster.
    ShapeTooNarrow,
    /// A table row has more cells than the colgroup defines columns.
    TooManyColumns { path: EcoString },
    /// A `span`, `rowspan` or `colspan` attribute that is zero or
    /// unparsable.
    BadSpan { path: EcoString },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Parse { description, line, col, context } => {
                write!(f, "parse error at {line}:{col}: {description} near {context:?}")
            }
            Self::UnexpectedTag { path } => {
                write!(f, "unexpected tag at {path}")
            }
            Self::UnexpectedAttribute { path } => {
                write!(f, "unexpected attribute at {path}")
            }
            Self::BadValue { property, value } => {
                write!(f, "bad value {value:?} for property {property:?}")
            }
            Self::FontNotFound { family, variant, path } => {
                write!(
                    f,
                    "no face for family {family:?} with variant {variant:?} \
                     required at {path}"
                )
            }
            Self::ShapeTooNarrow => {
                write!(f, "shape is too narrow to fit a single cluster")
            }
            Self::TooManyColumns { path } => {
                write!(f, "row has more cells than the colgroup has columns at {path}")
            }
            Self::BadSpan { path } => {
                write!(f, "malformed span attribute at {path}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Wrap an XML parser error, extracting a context window from the
    /// source text.
    pub fn from_xml(error: roxmltree::Error, source: &str) -> Self {
        let pos = error.pos();
        let offset = byte_offset(source, pos.row, pos.col);
        let mut start = offset.saturating_sub(20);
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        let context: EcoString = source[start..].chars().take(40).collect();

        Self::Parse {
            description: error.to_string().into(),
            line: pos.row,
            col: pos.col,
            context,
        }
    }
}

/// Translate a 1-based row/column pair into a byte offset.
fn byte_offset(source: &str, row: u32, col: u32) -> usize {
    let mut line = 1;
    let mut offset = 0;
    for (i, c) in source.char_indices() {
        if line == row {
            offset = i;
            break;
        }
        if c == '\n' {
            line += 1;
            offset = i + 1;
        }
    }

    // Columns count characters, not bytes.
    source[offset..]
        .char_indices()
        .nth(col.saturating_sub(1) as usize)
        .map(|(i, _)| offset + i)
        .unwrap_or(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_context() {
        let source = "<html><body><p>broken";
        let error = roxmltree::Document::parse(source).unwrap_err();
        match Error::from_xml(error, source) {
            Error::Parse { context, .. } => assert!(!context.is_empty()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
