//! The stilt layout engine.
//!
//! Lays out styled, internationalized text inside arbitrary container
//! shapes and produces a flat list of drawing commands (positioned
//! glyphs, filled rectangles and image placeholders) for a downstream
//! renderer, with all positions in 26.6 fixed point.
//!
//! The two main entry points are:
//!
//! - [`layout_xhtml`]: lay out an XHTML document against a style
//!   sheet, dispatching block elements through flow, table, list and
//!   image layout down to paragraphs.
//! - [`layout_paragraph`]: the paragraph shaper and line breaker
//!   underneath, usable directly with pre-built attribute runs.
//!
//! A finished [`Layout`] can be written to and read back from a
//! simple XML format with [`write_layout`] and [`read_layout`].
//!
//! [`Layout`]: stilt_library::Layout

mod flow;
mod grid;
mod image;
mod inline;
mod lists;
mod xhtml;
mod xml;

pub use self::flow::layout_flow;
pub use self::inline::{Align, ParProps, layout_paragraph};
pub use self::xhtml::layout_xhtml;
pub use self::xml::{read_layout, write_layout};
