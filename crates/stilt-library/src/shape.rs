//! Container shapes.
//!
//! A shape bounds the horizontal extent of laid-out content: for any
//! vertical band `[top, bottom]`, measured from the top of the layout,
//! it reports the leftmost and rightmost x coordinate content may
//! occupy. Irregular containers (circles, pull-quote cutouts, ...)
//! implement [`Shape`] directly; the decorators in this module derive
//! narrowed shapes from an existing one without allocating.

use crate::geom::Fixed;

/// Bounds the horizontal extent of content per vertical band.
pub trait Shape {
    /// The left boundary for content within `[top, bottom]`.
    fn left(&self, top: Fixed, bottom: Fixed) -> Fixed;

    /// The right boundary for content within `[top, bottom]`.
    fn right(&self, top: Fixed, bottom: Fixed) -> Fixed;

    /// The outer left boundary.
    ///
    /// List bullets are measured against the outer boundaries, which
    /// ignore the indent applied for the item body.
    fn left_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.left(top, bottom)
    }

    /// The outer right boundary.
    fn right_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.right(top, bottom)
    }
}

/// A plain rectangular container of fixed width starting at x = 0.
#[derive(Debug, Copy, Clone)]
pub struct Rectangle {
    width: Fixed,
}

impl Rectangle {
    /// Create a rectangle of the given width.
    pub const fn new(width: Fixed) -> Self {
        Self { width }
    }
}

impl Shape for Rectangle {
    fn left(&self, _: Fixed, _: Fixed) -> Fixed {
        Fixed::ZERO
    }

    fn right(&self, _: Fixed, _: Fixed) -> Fixed {
        self.width
    }
}

/// A base shape narrowed from both sides.
#[derive(Copy, Clone)]
pub struct Indent<'a> {
    base: &'a dyn Shape,
    left: Fixed,
    right: Fixed,
}

impl<'a> Indent<'a> {
    /// Narrow `base` by `left` from the left and `right` from the
    /// right.
    pub fn new(base: &'a dyn Shape, left: Fixed, right: Fixed) -> Self {
        Self { base, left, right }
    }
}

impl Shape for Indent<'_> {
    fn left(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left(top, bottom) + self.left
    }

    fn right(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right(top, bottom) - self.right
    }

    fn left_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left_outer(top, bottom) + self.left
    }

    fn right_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right_outer(top, bottom) - self.right
    }
}

/// A strip at the left edge of a base shape.
///
/// Both boundaries are measured from the base shape's left edge.
#[derive(Copy, Clone)]
pub struct StripLeft<'a> {
    base: &'a dyn Shape,
    left: Fixed,
    right: Fixed,
}

impl<'a> StripLeft<'a> {
    /// The strip covering `left..right` past the base's left edge.
    pub fn new(base: &'a dyn Shape, left: Fixed, right: Fixed) -> Self {
        Self { base, left, right }
    }
}

impl Shape for StripLeft<'_> {
    fn left(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left(top, bottom) + self.left
    }

    fn right(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left(top, bottom) + self.right
    }

    fn left_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left_outer(top, bottom) + self.left
    }

    fn right_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.left_outer(top, bottom) + self.right
    }
}

/// A strip at the right edge of a base shape.
///
/// Both boundaries are measured backwards from the base shape's right
/// edge.
#[derive(Copy, Clone)]
pub struct StripRight<'a> {
    base: &'a dyn Shape,
    left: Fixed,
    right: Fixed,
}

impl<'a> StripRight<'a> {
    /// The strip covering the band `left..right` before the base's
    /// right edge.
    pub fn new(base: &'a dyn Shape, left: Fixed, right: Fixed) -> Self {
        Self { base, left, right }
    }
}

impl Shape for StripRight<'_> {
    fn left(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right(top, bottom) - self.left
    }

    fn right(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right(top, bottom) - self.right
    }

    fn left_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right_outer(top, bottom) - self.left
    }

    fn right_outer(&self, top: Fixed, bottom: Fixed) -> Fixed {
        self.base.right_outer(top, bottom) - self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorators() {
        let base = Rectangle::new(Fixed::from_px(100));
        let indent = Indent::new(&base, Fixed::from_px(10), Fixed::from_px(20));
        assert_eq!(indent.left(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(10));
        assert_eq!(indent.right(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(80));

        let strip = StripLeft::new(&base, Fixed::from_px(4), Fixed::from_px(14));
        assert_eq!(strip.left(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(4));
        assert_eq!(strip.right(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(14));

        let strip = StripRight::new(&base, Fixed::from_px(14), Fixed::from_px(4));
        assert_eq!(strip.left(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(86));
        assert_eq!(strip.right(Fixed::ZERO, Fixed::ZERO), Fixed::from_px(96));
    }
}
