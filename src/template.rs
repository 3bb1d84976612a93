use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellUpdate, InputType};
use crate::coord::Coord;
use crate::error::MergeError;
use crate::visual::{BlockAspect, VisualTemplate};

pub const BLOCK_ROWS: usize = 10;
pub const BLOCK_COLS: usize = 10;

/// A row-major matrix of cells, indexed `[row][col]`.
///
/// Every editing operation is copy-on-write: it returns a new template and
/// leaves the receiver untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    rows: Vec<Vec<Cell>>,
}

impl Default for Template {
    fn default() -> Self {
        Self::blank()
    }
}

impl Template {
    /// A 10×10 template with every cell inactive.
    pub fn blank() -> Self {
        Self::filled(BLOCK_ROWS, BLOCK_COLS, Cell::blank())
    }

    pub fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Template {
            rows: vec![vec![cell; cols]; rows],
        }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Template { rows }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn as_rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.rows() && at.col < self.cols()
    }

    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.rows.get(at.row).and_then(|row| row.get(at.col))
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (Coord::new(r, c), cell))
        })
    }

    pub fn active_count(&self) -> usize {
        self.iter().filter(|(_, cell)| cell.active).count()
    }

    // ---- merge groups ----------------------------------------------------

    /// Whether some other cell points at `at` as its base.
    pub fn is_base(&self, at: Coord) -> bool {
        self.iter().any(|(_, cell)| cell.merged_with == Some(at))
    }

    /// Base of the merge group containing `at`, if any.
    ///
    /// Pointers that leave the matrix are treated as absent.
    pub fn base_of(&self, at: Coord) -> Option<Coord> {
        let cell = self.cell(at)?;
        match cell.merged_with {
            Some(base) => self.contains(base).then_some(base),
            None => self.is_base(at).then_some(at),
        }
    }

    /// The base followed by every cell pointing at it.
    pub fn group_members(&self, base: Coord) -> Vec<Coord> {
        let mut members = vec![base];
        members.extend(
            self.iter()
                .filter(|(_, cell)| cell.merged_with == Some(base))
                .map(|(at, _)| at),
        );
        members
    }

    /// Members of the merge group containing `at`; `None` for independent cells.
    pub fn group_of(&self, at: Coord) -> Option<Vec<Coord>> {
        self.base_of(at).map(|base| self.group_members(base))
    }

    // ---- copy-on-write edits --------------------------------------------

    fn with_cell(&self, at: Coord, edit: impl FnOnce(&mut Cell)) -> Self {
        let mut next = self.clone();
        match next.rows.get_mut(at.row).and_then(|row| row.get_mut(at.col)) {
            Some(cell) => edit(cell),
            None => log::warn!("ignoring edit of cell {at} outside the template"),
        }
        next
    }

    pub fn apply_cell_update(&self, at: Coord, update: CellUpdate) -> Self {
        self.with_cell(at, |cell| cell.apply(update))
    }

    pub fn with_active(&self, at: Coord, active: bool) -> Self {
        self.with_cell(at, |cell| cell.active = active)
    }

    pub fn toggle_active(&self, at: Coord) -> Self {
        self.with_cell(at, |cell| cell.active = !cell.active)
    }

    pub fn set_input_type(&self, at: Coord, input_type: Option<InputType>) -> Self {
        self.with_cell(at, |cell| cell.set_input_type(input_type))
    }

    /// Merge `selection` into one group based at its top-left cell.
    ///
    /// At most one selected cell may already be configured. Every selected
    /// cell becomes active.
    pub fn combine(&self, selection: &[Coord]) -> Result<Self, MergeError> {
        if selection.len() < 2 {
            return Err(MergeError::TooFewCells);
        }
        if let Some(&outside) = selection.iter().find(|at| !self.contains(**at)) {
            return Err(MergeError::OutOfRange(outside));
        }
        let configured = selection
            .iter()
            .filter_map(|at| self.cell(*at))
            .filter(|cell| cell.is_configured())
            .count();
        if configured > 1 {
            return Err(MergeError::MultipleConfigured);
        }

        // min row first, then min col
        let base = selection.iter().copied().min().unwrap_or_default();

        let mut next = self.clone();
        for at in selection {
            let cell = &mut next.rows[at.row][at.col];
            cell.active = true;
            cell.merged_with = (*at != base).then_some(base);
        }
        log::debug!("combined {} cells into group based at {base}", selection.len());
        Ok(next)
    }

    /// Break the groups touched by `selection`: selected cells lose their
    /// pointer, and so does every cell pointing at a selected cell.
    pub fn separate(&self, selection: &[Coord]) -> Self {
        let mut next = self.clone();
        for row in next.rows.iter_mut() {
            for cell in row.iter_mut() {
                if cell.merged_with.is_some_and(|base| selection.contains(&base)) {
                    cell.merged_with = None;
                }
            }
        }
        for at in selection {
            if let Some(cell) = next.rows.get_mut(at.row).and_then(|row| row.get_mut(at.col)) {
                cell.merged_with = None;
            }
        }
        next
    }
}

/// A complete block: template, styles and aspect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockData {
    pub template: Template,
    pub visual: VisualTemplate,
    pub aspect: BlockAspect,
}

/// Persisted entry of the master repository.
pub type MasterBlockData = BlockData;

impl BlockData {
    pub fn new(template: Template, visual: VisualTemplate, aspect: BlockAspect) -> Self {
        BlockData {
            template,
            visual,
            aspect,
        }
    }

    /// An independent deep copy.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}
