//! Image placeholder layout.

use roxmltree::Node;
use stilt_library::diag::LayoutResult;
use stilt_library::geom::Fixed;
use stilt_library::layout::{Command, Layout};
use stilt_library::shape::Shape;
use stilt_library::style::parse_size;

/// Lay out an `<img>` as a placeholder command of the size its
/// attributes request. The renderer resolves the URL.
pub(crate) fn layout_image(
    node: Node,
    shape: &dyn Shape,
    y_start: Fixed,
) -> LayoutResult<Layout> {
    let width = parse_size("width", node.attribute("width").unwrap_or(""))?;
    let height = parse_size("height", node.attribute("height").unwrap_or(""))?;
    let url = node.attribute("src").unwrap_or("");

    let x = shape.left(y_start, y_start);
    let mut layout = Layout::new();
    layout.push(Command::Image {
        x,
        y: y_start,
        w: width,
        h: height,
        url: url.into(),
        link: None,
    });
    layout.set_height(y_start + height);
    layout.set_left(x);
    layout.set_right(x + width);
    Ok(layout)
}
