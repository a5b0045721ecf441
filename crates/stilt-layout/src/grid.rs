//! Table layout.
//!
//! Two passes: the colgroup fixes column starts (absolute widths
//! first, the remainder split among starred columns), then every cell
//! is laid out once to find row heights and a second time with its
//! final minimum height so vertical alignment and backgrounds stretch.

use roxmltree::Node;
use stilt_library::diag::{Error, LayoutResult};
use stilt_library::geom::{Dir, Fixed};
use stilt_library::layout::Layout;
use stilt_library::shape::{Rectangle, Shape};
use stilt_library::style::{Stylesheet, parse_size};

use crate::flow::{BoxContext, box_it, layout_flow};
use crate::xhtml::node_path;

/// The width request of one column.
#[derive(Copy, Clone)]
enum ColWidth {
    /// A fixed width in pixels.
    Abs(Fixed),
    /// A share of the leftover container width.
    Star(u32),
}

/// One `<th>`/`<td>` with its grid position.
struct Cell<'a, 'input> {
    node: Node<'a, 'input>,
    row: usize,
    col: usize,
    rowspan: usize,
    colspan: usize,
    layout: Layout,
}

/// A growable occupancy grid marking which cell covers a slot, so
/// cells shadowed by spans are skipped.
#[derive(Default)]
struct Occupancy<'a, 'input> {
    slots: Vec<Vec<Option<Node<'a, 'input>>>>,
}

impl<'a, 'input> Occupancy<'a, 'input> {
    fn set(&mut self, col: usize, row: usize, node: Node<'a, 'input>) {
        if self.slots.len() <= row {
            self.slots.resize(row + 1, Vec::new());
        }
        if self.slots[row].len() <= col {
            self.slots[row].resize(col + 1, None);
        }
        self.slots[row][col] = Some(node);
    }

    fn get(&self, col: usize, row: usize) -> Option<Node<'a, 'input>> {
        self.slots.get(row)?.get(col).copied()?
    }

    fn get_signed(&self, col: isize, row: isize) -> Option<Node<'a, 'input>> {
        if col < 0 || row < 0 {
            return None;
        }
        self.get(col as usize, row as usize)
    }
}

/// Lay out a `<table>` inside a shape.
pub(crate) fn layout_table(
    node: Node,
    sheet: &Stylesheet,
    shape: &dyn Shape,
    y_start: Fixed,
) -> LayoutResult<Layout> {
    let rtl = Dir::from_css(sheet.value_of(Some(node), "direction")).is_rtl();
    let collapse = sheet.value_of(Some(node), "border-collapse") == "collapse";

    let mut widths: Vec<ColWidth> = Vec::new();
    let mut cells: Vec<Cell> = Vec::new();
    let mut occupancy = Occupancy::default();
    let mut row = 0;

    for child in node.children() {
        if skippable(child) {
            continue;
        }
        match child.tag_name().name() {
            "colgroup" if child.is_element() => {
                collect_columns(child, sheet, &mut widths)?;
            }
            "tr" if child.is_element() => {
                if widths.is_empty() {
                    return Err(Error::TooManyColumns { path: node_path(child) });
                }
                collect_row(child, row, &mut cells, &mut occupancy)?;
                row += 1;
            }
            _ => return Err(Error::UnexpectedTag { path: node_path(child) }),
        }
    }

    // Turn the width requests into column start positions.
    let container = shape.right(y_start, y_start) - shape.left(y_start, y_start);
    let col_start = column_starts(&widths, container);
    let table_width = *col_start.last().unwrap_or(&Fixed::ZERO);

    for cell in &cells {
        if cell.col + cell.colspan > widths.len() {
            return Err(Error::TooManyColumns { path: node_path(cell.node) });
        }
    }

    // First pass: lay out every cell at its column width to learn the
    // row heights.
    for i in 0..cells.len() {
        let width = col_start[cells[i].col + cells[i].colspan] - col_start[cells[i].col];
        let laid =
            cell_layout(sheet, &cells[i], &occupancy, rtl, collapse, width, Fixed::ZERO)?;
        cells[i].layout = laid;
    }

    // Row heights: single-row cells first; a spanning cell that is
    // still taller than its rows expands the last row it occupies.
    let max_row = cells.iter().map(|c| c.row + c.rowspan).max().unwrap_or(0);
    let mut row_heights = vec![Fixed::ZERO; max_row];
    for cell in &cells {
        if cell.rowspan == 1 {
            row_heights[cell.row].set_max(cell.layout.height());
        }
    }
    for cell in &cells {
        if cell.rowspan > 1 {
            let spanned: Fixed =
                row_heights[cell.row..cell.row + cell.rowspan].iter().copied().sum();
            if spanned < cell.layout.height() {
                row_heights[cell.row + cell.rowspan - 1] +=
                    cell.layout.height() - spanned;
            }
        }
    }

    // Center the table in its container, clamped so it never starts
    // left of zero.
    let mut x_indent = shape.left(y_start, y_start)
        + (shape.right(y_start, y_start) - shape.left(y_start, y_start) - table_width)
            / 2;
    x_indent.set_max(Fixed::ZERO);

    // Second pass: re-lay cells whose final height differs, then place
    // everything.
    let mut layout = Layout::new();
    let mut y = y_start;
    let mut current_row = 0;

    for i in 0..cells.len() {
        let cell = &cells[i];
        while current_row < cell.row {
            y += row_heights[current_row];
            current_row += 1;
        }

        let spanned: Fixed =
            row_heights[cell.row..cell.row + cell.rowspan].iter().copied().sum();
        let width = col_start[cell.col + cell.colspan] - col_start[cell.col];

        let finished = if spanned != cell.layout.height() {
            cell_layout(sheet, cell, &occupancy, rtl, collapse, width, spanned)?
        } else {
            cells[i].layout.clone()
        };

        let x = if rtl {
            x_indent + table_width - col_start[cell.col + cell.colspan]
        } else {
            x_indent + col_start[cell.col]
        };
        layout.append_at(finished, x, y);
    }

    let remaining: Fixed = row_heights[current_row.min(row_heights.len())..]
        .iter()
        .copied()
        .sum();
    layout.set_height(y + remaining);
    layout.set_left(x_indent);
    layout.set_right(x_indent + table_width);
    Ok(layout)
}

/// Lay out one cell's flow inside a rectangle of its column width.
fn cell_layout(
    sheet: &Stylesheet,
    cell: &Cell,
    occupancy: &Occupancy,
    rtl: bool,
    collapse: bool,
    width: Fixed,
    min_height: Fixed,
) -> LayoutResult<Layout> {
    let above = occupancy.get_signed(cell.col as isize, cell.row as isize - 1);
    let start_side = if rtl {
        occupancy.get_signed((cell.col + cell.colspan) as isize, cell.row as isize)
    } else {
        occupancy.get_signed(cell.col as isize - 1, cell.row as isize)
    };

    let rect = Rectangle::new(width);
    let ctx = BoxContext {
        above,
        start_side,
        collapse_border: collapse,
        min_height,
    };
    box_it(cell.node, sheet, &rect, Fixed::ZERO, ctx, |inner, ys| {
        layout_flow(cell.node, sheet, inner, ys)
    })
}

/// Read the `<col>` children of a colgroup into width requests.
fn collect_columns(
    colgroup: Node,
    sheet: &Stylesheet,
    widths: &mut Vec<ColWidth>,
) -> LayoutResult<()> {
    for col in colgroup.children() {
        if skippable(col) {
            continue;
        }
        if !col.is_element() || col.tag_name().name() != "col" {
            return Err(Error::UnexpectedTag { path: node_path(col) });
        }

        let span = match col.attribute("span") {
            None => 1,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|&span| span > 0)
                .ok_or_else(|| Error::BadSpan { path: node_path(col) })?,
        };

        // The width comes from the attribute, with the CSS `width`
        // property as fallback.
        let raw = match col.attribute("width") {
            Some(value) => value,
            None => sheet.value_of(Some(col), "width"),
        };
        let width = parse_col_width(raw, col)?;
        widths.extend(std::iter::repeat_n(width, span));
    }
    Ok(())
}

/// Parse a column width: `<n>px` or `<n>*` (a bare `*` counts one
/// share).
fn parse_col_width(raw: &str, col: Node) -> LayoutResult<ColWidth> {
    if let Some(stars) = raw.strip_suffix('*') {
        let count = if stars.is_empty() {
            1
        } else {
            stars.trim().parse::<u32>().ok().filter(|&n| n > 0).ok_or_else(|| {
                Error::BadValue { property: "width".into(), value: raw.into() }
            })?
        };
        return Ok(ColWidth::Star(count));
    }
    if raw.is_empty() {
        return Err(Error::BadValue {
            property: "width".into(),
            value: format!("missing column width at {}", node_path(col)).into(),
        });
    }
    Ok(ColWidth::Abs(parse_size("width", raw)?))
}

/// Resolve width requests into column start positions: absolute
/// widths first, the remaining container width split proportionally
/// among the starred columns.
fn column_starts(widths: &[ColWidth], container: Fixed) -> Vec<Fixed> {
    let absolute: Fixed = widths
        .iter()
        .map(|w| match w {
            ColWidth::Abs(abs) => *abs,
            ColWidth::Star(_) => Fixed::ZERO,
        })
        .sum();
    let stars: u32 = widths
        .iter()
        .map(|w| match w {
            ColWidth::Abs(_) => 0,
            ColWidth::Star(count) => *count,
        })
        .sum();
    let leftover = (container - absolute).max(Fixed::ZERO);
    if stars > 0 && leftover.is_zero() {
        log::warn!("absolute column widths leave no room for starred columns");
    }

    let mut starts = Vec::with_capacity(widths.len() + 1);
    let mut x = Fixed::ZERO;
    starts.push(x);
    for width in widths {
        x += match width {
            ColWidth::Abs(abs) => *abs,
            ColWidth::Star(count) => leftover * *count as i32 / stars as i32,
        };
        starts.push(x);
    }
    starts
}

/// Collect the cells of one `<tr>`, skipping slots shadowed by
/// earlier spans.
fn collect_row<'a, 'input>(
    tr: Node<'a, 'input>,
    row: usize,
    cells: &mut Vec<Cell<'a, 'input>>,
    occupancy: &mut Occupancy<'a, 'input>,
) -> LayoutResult<()> {
    let mut col = 0;

    for child in tr.children() {
        if skippable(child) {
            continue;
        }
        if !child.is_element() || !matches!(child.tag_name().name(), "th" | "td") {
            return Err(Error::UnexpectedTag { path: node_path(child) });
        }

        while occupancy.get(col, row).is_some() {
            col += 1;
        }

        let span_attr = |name: &str| -> LayoutResult<usize> {
            match child.attribute(name) {
                None => Ok(1),
                Some(raw) => raw
                    .parse::<usize>()
                    .ok()
                    .filter(|&span| span > 0)
                    .ok_or_else(|| Error::BadSpan { path: node_path(child) }),
            }
        };
        let rowspan = span_attr("rowspan")?;
        let colspan = span_attr("colspan")?;

        for x in col..col + colspan {
            for y in row..row + rowspan {
                occupancy.set(x, y, child);
            }
        }

        cells.push(Cell {
            node: child,
            row,
            col,
            rowspan,
            colspan,
            layout: Layout::new(),
        });
        col += colspan;
    }

    Ok(())
}

/// Whitespace and comments between table elements are insignificant.
fn skippable(node: Node) -> bool {
    node.is_comment() || (node.is_text() && node.text().unwrap_or("").trim().is_empty())
}
