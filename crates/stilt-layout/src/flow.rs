//! Block flow layout and the box model.

use ecow::eco_format;
use roxmltree::Node;
use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::{Color, Fixed};
use stilt_library::layout::{Command, Layout};
use stilt_library::shape::{Indent, Shape};
use stilt_library::style::{Stylesheet, parse_color, parse_size};

use crate::grid::layout_table;
use crate::lists::layout_list;
use crate::xhtml::{is_inline_tag, node_path, phrasing};

/// The values of a four-sided box property.
#[derive(Default, Copy, Clone)]
struct Sides {
    left: Fixed,
    right: Fixed,
    top: Fixed,
    bottom: Fixed,
}

/// The surroundings a box is placed in: the node above it and the node
/// to its line-start side, for margin and border collapsing, plus the
/// minimum height the box must reach.
#[derive(Default, Copy, Clone)]
pub(crate) struct BoxContext<'a, 'input> {
    pub above: Option<Node<'a, 'input>>,
    pub start_side: Option<Node<'a, 'input>>,
    pub collapse_border: bool,
    pub min_height: Fixed,
}

/// Lay out a flow container: dispatch the node's children by tag and
/// stack the resulting boxes vertically.
pub fn layout_flow(
    node: Node,
    sheet: &Stylesheet,
    shape: &dyn Shape,
    y_start: Fixed,
) -> LayoutResult<Layout> {
    let mut layout = Layout::new();
    layout.set_height(y_start);

    let mut above: Option<Node> = None;
    let mut child = node.first_child();

    while let Some(cur) = child {
        // Whitespace between blocks is insignificant, as are comments.
        if cur.is_comment()
            || (cur.is_text() && cur.text().unwrap_or("").trim().is_empty())
        {
            child = cur.next_sibling();
            continue;
        }

        let y = layout.height();
        let tag = cur.tag_name().name();

        if cur.is_element() && is_block_paragraph(tag) {
            let ctx = BoxContext { above, ..Default::default() };
            layout.append(box_it(cur, sheet, shape, y, ctx, |inner, ys| {
                let (para, leftover) =
                    phrasing(cur.first_child(), cur, sheet, inner, ys)?;
                if let Some(extra) = leftover {
                    return Err(Error::UnexpectedTag { path: node_path(extra) });
                }
                Ok(para)
            })?);
            above = Some(cur);
            child = cur.next_sibling();
        } else if cur.is_text() || (cur.is_element() && is_inline_tag(tag)) {
            // Inline content at flow level continues as an implicit
            // paragraph until the next block element.
            let (para, next) = phrasing(Some(cur), cur, sheet, shape, y)?;
            layout.append(para);
            above = None;
            child = next;
        } else if cur.is_element() && tag == "table" {
            let ctx = BoxContext { above, ..Default::default() };
            layout.append(box_it(cur, sheet, shape, y, ctx, |inner, ys| {
                layout_table(cur, sheet, inner, ys)
            })?);
            above = Some(cur);
            child = cur.next_sibling();
        } else if cur.is_element() && tag == "ul" {
            let ctx = BoxContext { above, ..Default::default() };
            layout.append(box_it(cur, sheet, shape, y, ctx, |inner, ys| {
                layout_list(cur, sheet, inner, ys)
            })?);
            above = Some(cur);
            child = cur.next_sibling();
        } else if cur.is_element() && tag == "div" {
            let ctx = BoxContext { above, ..Default::default() };
            layout.append(box_it(cur, sheet, shape, y, ctx, |inner, ys| {
                layout_flow(cur, sheet, inner, ys)
            })?);
            above = Some(cur);
            child = cur.next_sibling();
        } else {
            return Err(Error::UnexpectedTag { path: node_path(cur) });
        }
    }

    let height = layout.height();
    layout.set_left(shape.left(y_start, height));
    layout.set_right(shape.right(y_start, height));
    Ok(layout)
}

fn is_block_paragraph(tag: &str) -> bool {
    matches!(tag, "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Wrap a box around laid-out content: padding, border and margin with
/// vertical and horizontal margin collapsing, optional border
/// collapsing, a background rect over the content + padding box,
/// border rects, and vertical alignment inside a minimum height.
pub(crate) fn box_it(
    node: Node,
    sheet: &Stylesheet,
    shape: &dyn Shape,
    y_start: Fixed,
    ctx: BoxContext,
    content: impl FnOnce(&dyn Shape, Fixed) -> LayoutResult<Layout>,
) -> LayoutResult<Layout> {
    let padding = sides(sheet, node, "padding", |side| eco_format!("padding-{side}"))?;
    let border = sides(sheet, node, "border-width", |side| {
        eco_format!("border-{side}-width")
    })?;
    let margin = sides(sheet, node, "margin", |side| eco_format!("margin-{side}"))?;

    // Collapse the top margin against the bottom margin of the element
    // above, and the start-side margin against the neighbor's end-side
    // margin. Borders collapse the same way when the caller (a table)
    // says so, but only where no margin separates the two elements.
    let margin_above = neighbor_side(sheet, ctx.above, "margin", "margin-bottom")?;
    let margin_before = neighbor_side(sheet, ctx.start_side, "margin", "margin-right")?;

    let mut border_above = Fixed::ZERO;
    if margin.top.is_zero() && margin_above.is_zero() {
        border_above =
            neighbor_side(sheet, ctx.above, "border-width", "border-bottom-width")?;
    }
    let mut border_before = Fixed::ZERO;
    if margin.left.is_zero() && margin_before.is_zero() {
        border_before =
            neighbor_side(sheet, ctx.start_side, "border-width", "border-right-width")?;
    }

    let margin_top = margin.top.max(margin_above) - margin_above;
    let margin_left = margin.left.max(margin_before) - margin_before;
    let (border_top, border_left) = if ctx.collapse_border {
        (
            border.top.max(border_above) - border_above,
            border.left.max(border_before) - border_before,
        )
    } else {
        (border.top, border.left)
    };

    let inner_shape = Indent::new(
        shape,
        padding.left + border_left + margin_left,
        padding.right + border.right + margin.right,
    );
    let mut inner = content(
        &inner_shape,
        y_start + padding.top + border_top + margin_top,
    )?;

    let mut height = inner.height() + padding.bottom + border.bottom + margin.bottom;

    // Distribute leftover space inside a taller box per
    // `vertical-align` by shifting the content down.
    if ctx.min_height > height {
        let slack = ctx.min_height - height;
        let shift = match sheet.value_of(Some(node), "vertical-align") {
            "top" => Fixed::ZERO,
            "middle" => slack / 2,
            "bottom" => slack,
            other => {
                return Err(Error::BadValue {
                    property: "vertical-align".into(),
                    value: other.into(),
                });
            }
        };
        inner.translate(Fixed::ZERO, shift);
        height = ctx.min_height;
    }
    inner.set_height(height);

    let box_left = inner.left() - padding.left - border_left;
    let box_width = inner.right() - inner.left()
        + padding.left
        + padding.right
        + border_left
        + border.right;

    // Border rects go behind the content, each side's color resolved
    // through border-<side>-color, border-color, color.
    let edge_y = y_start + margin_top;
    let edge_h = height - y_start - margin.bottom - margin_top;

    if !border_top.is_zero()
        && let Some(color) = border_color(sheet, node, "border-top-color")?
    {
        inner.push_front(Command::Rect {
            x: box_left,
            y: y_start + margin_top,
            w: box_width,
            h: border_top,
            color,
            blur: Fixed::ZERO,
        });
    }

    if !border.bottom.is_zero()
        && let Some(color) = border_color(sheet, node, "border-bottom-color")?
    {
        inner.push_front(Command::Rect {
            x: box_left,
            y: height - border.bottom - margin.bottom,
            w: box_width,
            h: border.bottom,
            color,
            blur: Fixed::ZERO,
        });
    }

    if !border.right.is_zero()
        && let Some(color) = border_color(sheet, node, "border-right-color")?
    {
        inner.push_front(Command::Rect {
            x: inner.right() + padding.right,
            y: edge_y,
            w: border.right,
            h: edge_h,
            color,
            blur: Fixed::ZERO,
        });
    }

    if !border_left.is_zero()
        && let Some(color) = border_color(sheet, node, "border-left-color")?
    {
        inner.push_front(Command::Rect {
            x: box_left,
            y: edge_y,
            w: border_left,
            h: edge_h,
            color,
            blur: Fixed::ZERO,
        });
    }

    // The background covers the content + padding box.
    let background =
        parse_color("background-color", sheet.value_of(Some(node), "background-color"))?;
    if !background.is_transparent() {
        let y0 = y_start + margin_top;
        let left = shape.left(y0, y0) + border_left + margin_left;
        let right = shape.right(y0, y0) - border.right - margin.right;
        inner.push_front(Command::Rect {
            x: left,
            y: y_start + border_top + margin_top,
            w: right - left,
            h: height - y_start - border_top - border.bottom - margin_top - margin.bottom,
            color: background,
            blur: Fixed::ZERO,
        });
    }

    inner.set_left(inner.left() - padding.left - border_left - margin_left);
    inner.set_right(inner.right() + padding.right + border.right + margin.right);
    Ok(inner)
}

/// Resolve a shorthand box property and its per-side overrides.
fn sides(
    sheet: &Stylesheet,
    node: Node,
    shorthand: &str,
    name: impl Fn(&str) -> ecow::EcoString,
) -> LayoutResult<Sides> {
    let all = parse_size(shorthand, sheet.value_of(Some(node), shorthand))?;
    let mut sides = Sides { left: all, right: all, top: all, bottom: all };

    for (side, value) in [
        ("left", &mut sides.left),
        ("right", &mut sides.right),
        ("top", &mut sides.top),
        ("bottom", &mut sides.bottom),
    ] {
        let property = name(side);
        let raw = sheet.value_of(Some(node), &property);
        if !raw.is_empty() {
            *value = parse_size(&property, raw)?;
        }
    }

    Ok(sides)
}

/// The resolved size of one side of a neighboring element's box
/// property, zero without a neighbor.
fn neighbor_side(
    sheet: &Stylesheet,
    node: Option<Node>,
    shorthand: &str,
    side: &str,
) -> LayoutResult<Fixed> {
    let Some(node) = node else { return Ok(Fixed::ZERO) };
    let mut value = parse_size(shorthand, sheet.value_of(Some(node), shorthand))?;
    let raw = sheet.value_of(Some(node), side);
    if !raw.is_empty() {
        value = parse_size(side, raw)?;
    }
    Ok(value)
}

/// A border side's color: `border-<side>-color`, then `border-color`,
/// then `color`. `None` when the resolved color is transparent.
fn border_color(
    sheet: &Stylesheet,
    node: Node,
    side: &str,
) -> LayoutResult<Option<Color>> {
    let mut raw = sheet.value_of(Some(node), side);
    if raw.is_empty() {
        raw = sheet.value_of(Some(node), "border-color");
    }
    if raw.is_empty() {
        raw = sheet.value_of(Some(node), "color");
    }
    let color = parse_color(side, raw)?;
    Ok((!color.is_transparent()).then_some(color))
}
