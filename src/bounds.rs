//! Active-region engine: which part of a template is live, and how to cut it
//! out without splitting merge groups.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::coord::Coord;
use crate::template::{BLOCK_COLS, BLOCK_ROWS, Template};
use crate::visual::VisualTemplate;

lazy_static! {
    static ref EXPR_TOKEN_REGEX: Regex = Regex::new(r"r(\d+)c(\d+)").unwrap();
}

/// An inclusive rectangle of a template, with its size cached.
///
/// Deserialized bounds must be ordered and lie inside a block; the cached
/// size is always recomputed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredBounds")]
pub struct ActiveBounds {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Default for ActiveBounds {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl ActiveBounds {
    pub const fn new(min_row: usize, max_row: usize, min_col: usize, max_col: usize) -> Self {
        ActiveBounds {
            min_row,
            max_row,
            min_col,
            max_col,
            rows: max_row.saturating_sub(min_row).saturating_add(1),
            cols: max_col.saturating_sub(min_col).saturating_add(1),
        }
    }

    /// The part of the rectangle inside a `rows × cols` matrix; a rectangle
    /// lying fully outside collapses onto the nearest edge cell.
    pub fn clamp_to(&self, rows: usize, cols: usize) -> Self {
        let last_row = rows.saturating_sub(1);
        let last_col = cols.saturating_sub(1);
        let min_row = self.min_row.min(last_row);
        let min_col = self.min_col.min(last_col);
        Self::new(
            min_row,
            self.max_row.clamp(min_row, last_row),
            min_col,
            self.max_col.clamp(min_col, last_col),
        )
    }

    pub fn origin(&self) -> Coord {
        Coord::new(self.min_row, self.min_col)
    }

    pub fn contains(&self, at: Coord) -> bool {
        (self.min_row..=self.max_row).contains(&at.row)
            && (self.min_col..=self.max_col).contains(&at.col)
    }

    /// Position of `at` relative to the rectangle, when inside it.
    pub fn to_local(&self, at: Coord) -> Option<Coord> {
        self.contains(at).then(|| Coord::new(at.row - self.min_row, at.col - self.min_col))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBounds {
    min_row: usize,
    max_row: usize,
    min_col: usize,
    max_col: usize,
}

impl TryFrom<StoredBounds> for ActiveBounds {
    type Error = String;

    fn try_from(b: StoredBounds) -> Result<Self, Self::Error> {
        if b.min_row > b.max_row || b.min_col > b.max_col {
            return Err(format!(
                "bounds rows {}..{} cols {}..{} are out of order",
                b.min_row, b.max_row, b.min_col, b.max_col
            ));
        }
        if b.max_row >= BLOCK_ROWS || b.max_col >= BLOCK_COLS {
            return Err(format!(
                "bounds reach {}-{}, outside the {BLOCK_ROWS}x{BLOCK_COLS} block",
                b.max_row, b.max_col
            ));
        }
        Ok(ActiveBounds::new(b.min_row, b.max_row, b.min_col, b.max_col))
    }
}

/// Running min/max accumulator.
struct BoxBuilder {
    min_row: usize,
    max_row: usize,
    min_col: usize,
    max_col: usize,
}

impl BoxBuilder {
    fn from_bounds(b: &ActiveBounds) -> Self {
        BoxBuilder {
            min_row: b.min_row,
            max_row: b.max_row,
            min_col: b.min_col,
            max_col: b.max_col,
        }
    }

    fn seeded(at: Coord) -> Self {
        BoxBuilder {
            min_row: at.row,
            max_row: at.row,
            min_col: at.col,
            max_col: at.col,
        }
    }

    /// Grow to cover `at`; reports whether anything changed.
    fn cover(&mut self, at: Coord) -> bool {
        let before = (self.min_row, self.max_row, self.min_col, self.max_col);
        self.min_row = self.min_row.min(at.row);
        self.max_row = self.max_row.max(at.row);
        self.min_col = self.min_col.min(at.col);
        self.max_col = self.max_col.max(at.col);
        before != (self.min_row, self.max_row, self.min_col, self.max_col)
    }

    fn build(&self) -> ActiveBounds {
        ActiveBounds::new(self.min_row, self.max_row, self.min_col, self.max_col)
    }
}

/// Smallest rectangle covering every active cell together with every member
/// of any merge group that has an active cell. A template with no active
/// cell yields the 1×1 box at the origin.
pub fn get_active_bounds(template: &Template) -> ActiveBounds {
    let mut acc: Option<BoxBuilder> = None;

    for (at, cell) in template.iter() {
        if !cell.active {
            continue;
        }
        let group = template.group_of(at).unwrap_or_else(|| vec![at]);
        for member in group {
            match acc.as_mut() {
                Some(b) => {
                    b.cover(member);
                }
                None => acc = Some(BoxBuilder::seeded(member)),
            }
        }
    }

    let bounds = acc.map_or_else(ActiveBounds::default, |b| b.build());
    log::debug!("active bounds {bounds:?}");
    bounds
}

/// Rewrite the `r<row>c<col>` tokens of `expr` relative to `bounds`.
/// References falling outside become the literal `0`.
pub fn rebase_expression(expr: &str, bounds: &ActiveBounds) -> String {
    EXPR_TOKEN_REGEX
        .replace_all(expr, |caps: &Captures| {
            let local = Coord::parse_token(&caps[0]).and_then(|at| bounds.to_local(at));
            match local {
                Some(at) => at.token(),
                None => "0".to_string(),
            }
        })
        .into_owned()
}

/// Copy the cells covered by `bounds` into a new `rows × cols` template.
///
/// Merge pointers are rebased onto the crop; a pointer whose base falls
/// outside is dropped so the crop never references a missing cell.
/// Expressions are rebased with [`rebase_expression`].
pub fn crop_template(template: &Template, bounds: &ActiveBounds) -> Template {
    let origin = bounds.origin();
    let rows = (0..bounds.rows)
        .map(|r| {
            (0..bounds.cols)
                .map(|c| {
                    let src = Coord::new(r, c).offset_by(origin);
                    let mut cell = template.cell(src).cloned().unwrap_or_else(Cell::blank);
                    cell.merged_with = cell.merged_with.and_then(|base| bounds.to_local(base));
                    if let Some(expr) = cell.expression.as_deref() {
                        cell.expression = Some(rebase_expression(expr, bounds));
                    }
                    cell
                })
                .collect()
        })
        .collect();
    log::debug!("cropped template to {}x{}", bounds.rows, bounds.cols);
    Template::from_rows(rows)
}

/// Keep the styles inside `bounds`, re-keyed relative to its origin.
pub fn crop_visual_template(visual: &VisualTemplate, bounds: &ActiveBounds) -> VisualTemplate {
    visual
        .iter()
        .filter_map(|(at, style)| Some((bounds.to_local(at)?, style.clone())))
        .collect()
}

/// Grow a (possibly stale) rectangle until every merge group intersecting it
/// lies fully inside. Bounds only grow and are capped by the matrix, so the
/// iteration reaches a fixed point.
///
/// The input is first clamped to the template, so the result always lies
/// inside it.
pub fn expand_bounds_to_merges(template: &Template, bounds: &ActiveBounds) -> ActiveBounds {
    let mut acc = BoxBuilder::from_bounds(&bounds.clamp_to(template.rows(), template.cols()));

    let mut changed = true;
    while changed {
        changed = false;
        let current = acc.build();
        for row in current.min_row..=current.max_row {
            for col in current.min_col..=current.max_col {
                let at = Coord::new(row, col);
                if !template.contains(at) {
                    continue;
                }
                let Some(members) = template.group_of(at) else {
                    continue;
                };
                for member in members {
                    changed |= acc.cover(member);
                }
            }
        }
    }

    acc.build()
}

/// Rectangle spanned by the merge group containing `at`, if it is grouped.
pub fn merge_span(template: &Template, at: Coord) -> Option<ActiveBounds> {
    let members = template.group_of(at)?;
    let mut acc = BoxBuilder::seeded(*members.first()?);
    for member in members {
        acc.cover(member);
    }
    Some(acc.build())
}
