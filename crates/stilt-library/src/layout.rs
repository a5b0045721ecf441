//! Finished layouts.

use std::fmt::{self, Debug, Formatter};

use ecow::EcoString;

use crate::font::Font;
use crate::geom::{Color, Fixed};

/// A single drawing command of a finished layout.
///
/// All coordinates are absolute within the layout, in 26.6 fixed
/// point; `y` grows downwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Draw a glyph.
    Glyph {
        /// The face to take the glyph from.
        font: Font,
        /// The glyph's index in the face.
        glyph: u16,
        /// The horizontal position of the glyph origin.
        x: Fixed,
        /// The baseline position of the glyph origin.
        y: Fixed,
        /// The fill color.
        color: Color,
        /// A blur radius; non-zero only for shadow copies.
        blur: Fixed,
        /// An index into the layout's link table.
        link: Option<usize>,
    },
    /// Fill an axis-aligned rectangle.
    Rect {
        x: Fixed,
        y: Fixed,
        w: Fixed,
        h: Fixed,
        color: Color,
        /// A blur radius; non-zero only for shadow copies.
        blur: Fixed,
    },
    /// Reserve space for an external image.
    Image {
        x: Fixed,
        y: Fixed,
        w: Fixed,
        h: Fixed,
        /// Where the renderer finds the image data.
        url: EcoString,
        /// An index into the layout's link table.
        link: Option<usize>,
    },
}

impl Command {
    /// Move the command by a vector.
    pub fn translate(&mut self, dx: Fixed, dy: Fixed) {
        match self {
            Self::Glyph { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Self::Rect { x, y, .. } | Self::Image { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
        }
    }

    /// Shift the command's link index by `base`.
    fn rebase_link(&mut self, base: usize) {
        match self {
            Self::Glyph { link, .. } | Self::Image { link, .. } => {
                if let Some(index) = link {
                    *index += base;
                }
            }
            Self::Rect { .. } => {}
        }
    }
}

/// A finished layout: an ordered list of drawing commands plus the
/// geometry the commands cover.
///
/// Layouts are append-only value builders. Sub-layouts move into their
/// parent via [`append`](Self::append), which translates the child's
/// commands and rebases its link indices onto the parent's table.
#[derive(Default, Clone)]
pub struct Layout {
    commands: Vec<Command>,
    left: Fixed,
    right: Fixed,
    height: Fixed,
    first_baseline: Option<Fixed>,
    links: Vec<EcoString>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands in drawing order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The leftmost extent.
    pub fn left(&self) -> Fixed {
        self.left
    }

    /// The rightmost extent.
    pub fn right(&self) -> Fixed {
        self.right
    }

    /// The total height, measured from the top of the surrounding
    /// layout run (not from this layout's first command).
    pub fn height(&self) -> Fixed {
        self.height
    }

    /// The baseline of the first line, if any text was laid out.
    pub fn first_baseline(&self) -> Option<Fixed> {
        self.first_baseline
    }

    /// The link targets referenced by the commands.
    pub fn links(&self) -> &[EcoString] {
        &self.links
    }

    pub fn set_left(&mut self, left: Fixed) {
        self.left = left;
    }

    pub fn set_right(&mut self, right: Fixed) {
        self.right = right;
    }

    pub fn set_height(&mut self, height: Fixed) {
        self.height = height;
    }

    pub fn set_first_baseline(&mut self, baseline: Fixed) {
        self.first_baseline = Some(baseline);
    }

    /// Register a link target and return its index.
    pub fn add_link(&mut self, url: impl Into<EcoString>) -> usize {
        self.links.push(url.into());
        self.links.len() - 1
    }

    /// Add a command in the foreground.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Add a command in the background, before everything added so
    /// far.
    pub fn push_front(&mut self, command: Command) {
        self.commands.insert(0, command);
    }

    /// Move every command by a vector.
    pub fn translate(&mut self, dx: Fixed, dy: Fixed) {
        if dx.is_zero() && dy.is_zero() {
            return;
        }
        for command in &mut self.commands {
            command.translate(dx, dy);
        }
        if let Some(baseline) = &mut self.first_baseline {
            *baseline += dy;
        }
    }

    /// Append a child layout, keeping its coordinates.
    pub fn append(&mut self, child: Layout) {
        self.append_at(child, Fixed::ZERO, Fixed::ZERO);
    }

    /// Append a child layout translated by a vector.
    pub fn append_at(&mut self, mut child: Layout, dx: Fixed, dy: Fixed) {
        child.translate(dx, dy);

        let was_empty = self.commands.is_empty();
        let base = self.links.len();
        self.links.append(&mut child.links);
        for mut command in child.commands {
            command.rebase_link(base);
            self.commands.push(command);
        }

        if was_empty {
            self.left = child.left + dx;
            self.right = child.right + dx;
        } else {
            self.left.set_min(child.left + dx);
            self.right.set_max(child.right + dx);
        }
        self.height.set_max(child.height + dy);
        if self.first_baseline.is_none() {
            self.first_baseline = child.first_baseline;
        }
    }
}

impl Debug for Layout {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Layout({:?}..{:?}, height {:?}, {} commands)",
            self.left,
            self.right,
            self.height,
            self.commands.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32) -> Command {
        Command::Rect {
            x: Fixed::from_px(x),
            y: Fixed::from_px(y),
            w: Fixed::from_px(1),
            h: Fixed::from_px(1),
            color: Color::BLACK,
            blur: Fixed::ZERO,
        }
    }

    #[test]
    fn test_append_translates_and_rebases_links() {
        let mut parent = Layout::new();
        parent.add_link("https://one");
        parent.push(rect(0, 0));
        parent.set_height(Fixed::from_px(10));

        let mut child = Layout::new();
        let index = child.add_link("https://two");
        child.push(Command::Image {
            x: Fixed::ZERO,
            y: Fixed::ZERO,
            w: Fixed::from_px(5),
            h: Fixed::from_px(5),
            url: "img.png".into(),
            link: Some(index),
        });
        child.set_height(Fixed::from_px(5));

        parent.append_at(child, Fixed::from_px(2), Fixed::from_px(10));
        assert_eq!(parent.height(), Fixed::from_px(15));
        assert_eq!(parent.links(), ["https://one", "https://two"]);
        match &parent.commands()[1] {
            Command::Image { x, y, link, .. } => {
                assert_eq!(*x, Fixed::from_px(2));
                assert_eq!(*y, Fixed::from_px(10));
                assert_eq!(*link, Some(1));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
