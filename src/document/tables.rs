//! Table post-processing: rebuild row spans from raw merge flags.
//!
//! DOCX stores vertical merges as per-cell flags (`restart` opens a merged
//! region, `continue` extends the cell above). Output formats want a single
//! cell with a `rowspan`, so after a table is read its rows are scanned
//! top-to-bottom, tracking the currently-open cell per column.

use std::collections::HashMap;

use crate::diagnostics::Diagnostics;
use crate::document::{DocumentElement, TableCell, TableRow};

/// Resolve vertical merges across a table's rows.
///
/// If any table child is not a row, or any row child is not a cell, the
/// structure is not one this scan understands: the children are returned
/// unmodified and a single warning is recorded.
pub fn calculate_row_spans(
    children: Vec<DocumentElement>,
    diagnostics: &mut Diagnostics,
) -> Vec<DocumentElement> {
    if let Some(message) = structure_error(&children) {
        diagnostics.warning(message);
        return children;
    }

    let rows: Vec<TableRow> = children
        .into_iter()
        .filter_map(|child| match child {
            DocumentElement::TableRow(row) => Some(row),
            _ => None,
        })
        .collect();

    merge_rows(rows)
        .into_iter()
        .map(DocumentElement::TableRow)
        .collect()
}

fn structure_error(children: &[DocumentElement]) -> Option<&'static str> {
    if children
        .iter()
        .any(|child| !matches!(child, DocumentElement::TableRow(_)))
    {
        return Some("unexpected non-row element in table, cell merging may be incorrect");
    }
    for child in children {
        if let DocumentElement::TableRow(row) = child
            && row
                .children
                .iter()
                .any(|cell| !matches!(cell, DocumentElement::TableCell(_)))
        {
            return Some("unexpected non-cell element in table row, cell merging may be incorrect");
        }
    }
    None
}

fn merge_rows(rows: Vec<TableRow>) -> Vec<TableRow> {
    // Typed grid; the structure check guarantees every child is a cell.
    let mut grid: Vec<(bool, Vec<TableCell>)> = rows
        .into_iter()
        .map(|row| {
            let cells = row
                .children
                .into_iter()
                .filter_map(|child| match child {
                    DocumentElement::TableCell(cell) => Some(cell),
                    _ => None,
                })
                .collect();
            (row.is_header, cells)
        })
        .collect();

    // Column index -> (row, cell) of the currently-open cell. Scoped to
    // this table; discarded once spans are final.
    let mut open: HashMap<u32, (usize, usize)> = HashMap::new();
    let mut dropped: Vec<Vec<bool>> = grid
        .iter()
        .map(|(_, cells)| vec![false; cells.len()])
        .collect();

    for row_index in 0..grid.len() {
        let mut column = 0u32;
        for cell_index in 0..grid[row_index].1.len() {
            let continues = grid[row_index].1[cell_index].vmerge;
            let colspan = grid[row_index].1[cell_index].colspan.max(1);

            match open.get(&column) {
                Some(&(open_row, open_cell)) if continues => {
                    grid[open_row].1[open_cell].rowspan += 1;
                    dropped[row_index][cell_index] = true;
                }
                // A continue-cell whose column has no open predecessor
                // starts a new open cell; misaligned spans stay lenient.
                _ => {
                    grid[row_index].1[cell_index].vmerge = false;
                    open.insert(column, (row_index, cell_index));
                }
            }

            column += colspan;
        }
    }

    grid.into_iter()
        .zip(dropped)
        .map(|((is_header, cells), flags)| {
            let children = cells
                .into_iter()
                .zip(flags)
                .filter(|(_, dropped)| !dropped)
                .map(|(cell, _)| DocumentElement::TableCell(cell))
                .collect();
            TableRow {
                is_header,
                children,
            }
        })
        .collect()
}
