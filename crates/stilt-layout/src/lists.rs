//! List layout.

use roxmltree::Node;
use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::{Dir, Fixed};
use stilt_library::layout::Layout;
use stilt_library::shape::{Indent, Shape, StripLeft, StripRight};
use stilt_library::style::{Stylesheet, parse_color, parse_shadows, parse_size};
use stilt_library::text::{AttrIndex, Attrs};

use crate::flow::{BoxContext, box_it, layout_flow};
use crate::inline::{Align, ParProps, layout_paragraph};
use crate::xhtml::{node_path, resolve_font};

/// Lay out a `<ul>`: each item gets a narrow bullet column on the
/// line-start side and its content flowed in the remaining width,
/// with the bullet's baseline matched to the content's first
/// baseline.
pub(crate) fn layout_list(
    node: Node,
    sheet: &Stylesheet,
    shape: &dyn Shape,
    y_start: Fixed,
) -> LayoutResult<Layout> {
    let mut layout = Layout::new();
    layout.set_height(y_start);

    let rtl = Dir::from_css(sheet.value_of(Some(node), "direction")).is_rtl();
    let mut above: Option<Node> = None;

    for item in node.children() {
        if item.is_comment()
            || (item.is_text() && item.text().unwrap_or("").trim().is_empty())
        {
            continue;
        }
        if !item.is_element() || item.tag_name().name() != "li" {
            return Err(Error::UnexpectedTag { path: node_path(item) });
        }

        let font = resolve_font(sheet, Some(item))?;
        let y = layout.height();
        let padding = parse_size("padding", sheet.value_of(Some(item), "padding"))?;

        // The bullet column is as wide as the item font's ascender.
        let indent = font.metrics().ascender;

        let bullet_attrs = Attrs {
            font: Some(font),
            color: parse_color("color", sheet.value_of(Some(node), "color"))?,
            shadows: parse_shadows(sheet.value_of(Some(node), "text-shadow"))?,
            ..Default::default()
        };
        let bullet_props = ParProps {
            align: Align::Center,
            rounding: sheet.rounding(),
            ..Default::default()
        };

        let ctx = BoxContext { above, ..Default::default() };
        let (bullet, content) = if rtl {
            let bullet_shape = StripRight::new(shape, padding + indent, padding);
            let content_shape = Indent::new(shape, Fixed::ZERO, indent);
            let bullet = layout_paragraph(
                "\u{2022}",
                &AttrIndex::uniform(bullet_attrs),
                &bullet_shape,
                &bullet_props,
                y + padding,
            )?;
            let content = box_it(item, sheet, &content_shape, y, ctx, |inner, ys| {
                layout_flow(item, sheet, inner, ys)
            })?;
            (bullet, content)
        } else {
            let bullet_shape = StripLeft::new(shape, padding, padding + indent);
            let content_shape = Indent::new(shape, indent, Fixed::ZERO);
            let bullet = layout_paragraph(
                "\u{2022}",
                &AttrIndex::uniform(bullet_attrs),
                &bullet_shape,
                &bullet_props,
                y + padding,
            )?;
            let content = box_it(item, sheet, &content_shape, y, ctx, |inner, ys| {
                layout_flow(item, sheet, inner, ys)
            })?;
            (bullet, content)
        };

        // Align the bullet's baseline with the content's first line.
        let mut shift = Fixed::ZERO;
        if let (Some(bullet_base), Some(content_base)) =
            (bullet.first_baseline(), content.first_baseline())
        {
            shift = content_base - bullet_base;
        }
        layout.append_at(bullet, Fixed::ZERO, shift);
        layout.append(content);

        above = Some(item);
    }

    let height = layout.height();
    layout.set_left(shape.left_outer(y_start, height));
    layout.set_right(shape.right_outer(y_start, height));
    Ok(layout)
}
