//! Piece placement engine.
//!
//! A [`Malla`] is an immutable value: every operation returns a new malla
//! (or an error, in which case nothing changed).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calc::{CalcValues, FieldValue, evaluate_expression};
use crate::cell::InputType;
use crate::coord::Coord;
use crate::error::{MallaError, ResizeError};
use crate::piece::CurricularPiece;
use crate::template::BlockData;

/// Dimensions of the coarse placement grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize { cols: 5, rows: 5 }
    }
}

impl GridSize {
    pub fn new(cols: u32, rows: u32) -> Self {
        GridSize { cols, rows }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.cols && y < self.rows
    }

    /// Every `(x, y)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| (x, y)))
    }
}

/// Values entered into one piece, keyed by the `"row-col"` key of the cell
/// within the piece's content.
pub type PieceValues = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct Malla {
    master: BlockData,
    grid: GridSize,
    pieces: Vec<CurricularPiece>,
    values: BTreeMap<String, PieceValues>,
    floating: Vec<String>,
    next_id: u64,
}

fn manhattan(a: (u32, u32), b: (u32, u32)) -> u64 {
    u64::from(a.0.abs_diff(b.0)) + u64::from(a.1.abs_diff(b.1))
}

impl Malla {
    pub fn new(master: BlockData, grid: GridSize) -> Self {
        Self::from_parts(master, grid, Vec::new(), BTreeMap::new(), Vec::new())
    }

    pub fn from_parts(
        master: BlockData,
        grid: GridSize,
        pieces: Vec<CurricularPiece>,
        values: BTreeMap<String, PieceValues>,
        floating: Vec<String>,
    ) -> Self {
        let next_id = pieces.len() as u64 + 1;
        Malla {
            master,
            grid,
            pieces,
            values,
            floating,
            next_id,
        }
    }

    pub fn master(&self) -> &BlockData {
        &self.master
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn pieces(&self) -> &[CurricularPiece] {
        &self.pieces
    }

    pub fn piece(&self, id: &str) -> Option<&CurricularPiece> {
        self.pieces.iter().find(|p| p.id() == id)
    }

    pub fn values(&self) -> &BTreeMap<String, PieceValues> {
        &self.values
    }

    pub fn piece_values(&self, id: &str) -> Option<&PieceValues> {
        self.values.get(id)
    }

    /// Pieces flagged as not yet confirmed in place.
    pub fn floating(&self) -> &[String] {
        &self.floating
    }

    pub fn is_floating(&self, id: &str) -> bool {
        self.floating.iter().any(|f| f == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, MallaError> {
        self.pieces
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| MallaError::UnknownPiece(id.to_string()))
    }

    // ---- occupancy -------------------------------------------------------

    pub fn occupant(&self, x: u32, y: u32) -> Option<&CurricularPiece> {
        self.pieces.iter().find(|p| p.position() == (x, y))
    }

    /// Whether `(x, y)` holds a piece other than `ignoring`.
    pub fn is_occupied(&self, x: u32, y: u32, ignoring: Option<&str>) -> bool {
        self.pieces
            .iter()
            .any(|p| p.position() == (x, y) && Some(p.id()) != ignoring)
    }

    /// First unoccupied cell in row-major order.
    pub fn find_free_cell(&self) -> Option<(u32, u32)> {
        self.grid
            .cells()
            .find(|&(x, y)| !self.is_occupied(x, y, None))
    }

    /// Unoccupied cell closest to `desired` by Manhattan distance; ties go
    /// to the first candidate in row-major order.
    pub fn nearest_free_cell(
        &self,
        desired: (u32, u32),
        ignoring: Option<&str>,
    ) -> Option<(u32, u32)> {
        let mut best: Option<((u32, u32), u64)> = None;
        for cell in self.grid.cells() {
            if self.is_occupied(cell.0, cell.1, ignoring) {
                continue;
            }
            let dist = manhattan(cell, desired);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((cell, dist)),
            }
        }
        best.map(|(cell, _)| cell)
    }

    // ---- creation --------------------------------------------------------

    fn allocate_id(&self) -> (String, u64) {
        let mut n = self.next_id.max(1);
        loop {
            let id = format!("p{n}");
            if self.piece(&id).is_none() {
                return (id, n + 1);
            }
            n += 1;
        }
    }

    fn insert_floating(
        &self,
        build: impl FnOnce(String, u32, u32) -> CurricularPiece,
    ) -> Result<(Malla, String), MallaError> {
        let Some((x, y)) = self.find_free_cell() else {
            log::warn!("no free cell left in {}x{} grid", self.grid.cols, self.grid.rows);
            return Err(MallaError::NoSpace);
        };
        let (id, next_id) = self.allocate_id();
        let mut next = self.clone();
        next.pieces.push(build(id.clone(), x, y));
        next.floating.push(id.clone());
        next.next_id = next_id;
        Ok((next, id))
    }

    /// Add a live reference to the master's active region at the first free cell.
    pub fn add_referenced(&self) -> Result<(Malla, String), MallaError> {
        let (next, id) =
            self.insert_floating(|id, x, y| CurricularPiece::new_ref(id, &self.master, x, y))?;
        log::info!("added reference piece {id}");
        Ok((next, id))
    }

    /// Add a frozen copy of the master's active region at the first free cell.
    pub fn add_snapshot(&self) -> Result<(Malla, String), MallaError> {
        let (next, id) =
            self.insert_floating(|id, x, y| CurricularPiece::new_snapshot(id, &self.master, x, y))?;
        log::info!("added snapshot piece {id}");
        Ok((next, id))
    }

    /// Copy `src` (content and entered values) to the first free cell.
    pub fn duplicate_piece(&self, src: &str) -> Result<(Malla, String), MallaError> {
        let source = self.pieces[self.index_of(src)?].clone();
        let (mut next, id) = self.insert_floating(|id, x, y| {
            let mut copy = source;
            copy.set_id(id);
            copy.set_position(x, y);
            copy
        })?;
        if let Some(values) = self.values.get(src) {
            next.values.insert(id.clone(), values.clone());
        }
        log::info!("duplicated piece {src} as {id}");
        Ok((next, id))
    }

    /// Remove a piece with its values and floating flag. Unknown ids leave
    /// the malla as is.
    pub fn delete_piece(&self, id: &str) -> Malla {
        let mut next = self.clone();
        next.pieces.retain(|p| p.id() != id);
        next.values.remove(id);
        next.floating.retain(|f| f != id);
        if next.pieces.len() < self.pieces.len() {
            log::info!("deleted piece {id}");
        } else {
            log::debug!("delete of unknown piece {id} ignored");
        }
        next
    }

    /// Freeze a reference, or unfreeze a snapshot that kept its origin.
    /// The position is preserved either way.
    pub fn toggle_piece_kind(&self, id: &str) -> Result<Malla, MallaError> {
        let idx = self.index_of(id)?;
        let toggled: CurricularPiece = match &self.pieces[idx] {
            CurricularPiece::Ref(p) => p.freeze(&self.master).into(),
            CurricularPiece::Snapshot(p) => p
                .unfreeze()
                .ok_or_else(|| MallaError::NoOrigin(id.to_string()))?
                .into(),
        };
        log::info!(
            "piece {id} is now a {}",
            if toggled.is_ref() { "reference" } else { "snapshot" }
        );
        let mut next = self.clone();
        next.pieces[idx] = toggled;
        Ok(next)
    }

    // ---- grid ------------------------------------------------------------

    /// Resize the row count; shrinking is refused while a piece sits in a
    /// row that would be dropped (the lowest such row is reported).
    pub fn set_rows(&self, rows: u32) -> Result<Malla, ResizeError> {
        if rows == 0 {
            return Err(ResizeError::Empty);
        }
        let lowest = self.pieces.iter().map(|p| p.position().1).filter(|y| *y >= rows).min();
        if let Some(blocking) = lowest {
            log::warn!("refusing to shrink to {rows} rows: row {blocking} is occupied");
            return Err(ResizeError::RowOccupied(blocking));
        }
        let mut next = self.clone();
        next.grid.rows = rows;
        log::info!("grid resized to {}x{}", next.grid.cols, rows);
        Ok(next)
    }

    /// Column counterpart of [`Malla::set_rows`].
    pub fn set_cols(&self, cols: u32) -> Result<Malla, ResizeError> {
        if cols == 0 {
            return Err(ResizeError::Empty);
        }
        let leftmost = self.pieces.iter().map(|p| p.position().0).filter(|x| *x >= cols).min();
        if let Some(blocking) = leftmost {
            log::warn!("refusing to shrink to {cols} columns: column {blocking} is occupied");
            return Err(ResizeError::ColOccupied(blocking));
        }
        let mut next = self.clone();
        next.grid.cols = cols;
        log::info!("grid resized to {}x{}", cols, next.grid.rows);
        Ok(next)
    }

    /// Put a reference piece on every unoccupied cell.
    pub fn fill_grid(&self) -> Malla {
        let mut next = self.clone();
        let free: Vec<(u32, u32)> = self
            .grid
            .cells()
            .filter(|&(x, y)| !self.is_occupied(x, y, None))
            .collect();
        for (x, y) in free.iter().copied() {
            let (id, next_id) = next.allocate_id();
            next.next_id = next_id;
            next.pieces.push(CurricularPiece::new_ref(id, &self.master, x, y));
        }
        log::info!("filled {} free cells", free.len());
        next
    }

    pub fn clear_grid(&self) -> Malla {
        let mut next = self.clone();
        next.pieces.clear();
        next.values.clear();
        next.floating.clear();
        next
    }

    // ---- placement -------------------------------------------------------

    /// Move `id` to `(x, y)`, or to the nearest free cell when that one is
    /// taken by another piece. Confirms the piece (clears its floating flag).
    ///
    /// Returns the cell actually used.
    pub fn place_piece(&self, id: &str, x: u32, y: u32) -> Result<(Malla, (u32, u32)), MallaError> {
        let idx = self.index_of(id)?;
        let target = if self.grid.contains(x, y) && !self.is_occupied(x, y, Some(id)) {
            (x, y)
        } else {
            let Some(found) = self.nearest_free_cell((x, y), Some(id)) else {
                log::warn!("no free cell to place piece {id}");
                return Err(MallaError::NoSpace);
            };
            log::debug!("({x}, {y}) taken, relocating piece {id} to {found:?}");
            found
        };
        let mut next = self.clone();
        next.pieces[idx].set_position(target.0, target.1);
        next.floating.retain(|f| f != id);
        Ok((next, target))
    }

    /// Set or clear the floating flag of a piece.
    pub fn with_floating(&self, id: &str, floating: bool) -> Malla {
        let mut next = self.clone();
        next.floating.retain(|f| f != id);
        if floating && self.piece(id).is_some() {
            next.floating.push(id.to_string());
        }
        next
    }

    // ---- content and values ---------------------------------------------

    /// Replace the master. References see the change on their next
    /// resolution; snapshots are unaffected.
    pub fn with_master(&self, master: BlockData) -> Malla {
        let mut next = self.clone();
        next.master = master;
        next
    }

    /// Content currently shown by piece `id`.
    pub fn resolve_piece(&self, id: &str) -> Option<BlockData> {
        self.piece(id).map(|p| p.resolve(&self.master))
    }

    pub fn set_piece_value(
        &self,
        id: &str,
        field: Coord,
        value: FieldValue,
    ) -> Result<Malla, MallaError> {
        self.index_of(id)?;
        let mut next = self.clone();
        next.values
            .entry(id.to_string())
            .or_default()
            .insert(field.key(), value);
        Ok(next)
    }

    /// The evaluator's view of a piece's values: `"row-col"` keys become
    /// `r<row>c<col>` tokens; keys that already are tokens pass through.
    pub fn calc_values(&self, id: &str) -> CalcValues {
        let Some(values) = self.values.get(id) else {
            return CalcValues::new();
        };
        values
            .iter()
            .filter_map(|(key, value)| {
                let token = match Coord::parse_key(key) {
                    Some(at) => at.token(),
                    None => Coord::parse_token(key)?.token(),
                };
                Some((token, value.clone()))
            })
            .collect()
    }

    /// Result of the calculated cell at `at` within piece `id`.
    ///
    /// `None` when there is no such piece or the cell is not a calculated
    /// field; `NaN` when its expression cannot be evaluated.
    pub fn calculated_value(&self, id: &str, at: Coord) -> Option<f64> {
        let content = self.resolve_piece(id)?;
        let cell = content.template.cell(at)?;
        if cell.input_type != Some(InputType::Calculated) {
            return None;
        }
        let expr = cell.expression.as_deref().unwrap_or_default();
        Some(evaluate_expression(expr, &self.calc_values(id)))
    }
}
