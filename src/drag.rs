//! Drag placement protocol.
//!
//! `Idle → Dragging` on pointer-down over a piece (not over one of its form
//! controls), pixel tracking while dragging, and `Dragging → Idle` on
//! pointer-up, where the drop position snaps to a coarse cell.

use crate::bounds::get_active_bounds;
use crate::error::MallaError;
use crate::malla::Malla;
use crate::visual::block_outer_size;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }
}

/// Pixel geometry of the coarse grid: one coarse cell is `cell` pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MallaLayout {
    pub cell: Size,
    pub cols: u32,
    pub rows: u32,
}

impl MallaLayout {
    /// Coarse cells sized to the master block's active region.
    pub fn for_malla(malla: &Malla) -> Self {
        let master = malla.master();
        let bounds = get_active_bounds(&master.template);
        let (w, h) = block_outer_size(bounds.rows, bounds.cols, master.aspect);
        let grid = malla.grid();
        MallaLayout {
            cell: Size::new(w as f64, h as f64),
            cols: grid.cols,
            rows: grid.rows,
        }
    }

    pub fn pixel_size(&self) -> Size {
        Size::new(
            self.cell.w * self.cols as f64,
            self.cell.h * self.rows as f64,
        )
    }

    pub fn cell_origin(&self, x: u32, y: u32) -> Point {
        Point::new(x as f64 * self.cell.w, y as f64 * self.cell.h)
    }

    /// Coarse cell nearest to a pixel position.
    pub fn snap(&self, p: Point) -> (u32, u32) {
        let snap_axis = |v: f64, cell: f64, count: u32| {
            if cell <= 0.0 || count == 0 {
                return 0;
            }
            let idx = (v / cell).round().max(0.0) as u32;
            idx.min(count - 1)
        };
        (
            snap_axis(p.x, self.cell.w, self.cols),
            snap_axis(p.y, self.cell.h, self.rows),
        )
    }

    /// Keep a footprint of `size` at `p` fully inside the grid.
    pub fn clamp(&self, p: Point, size: Size) -> Point {
        let grid = self.pixel_size();
        Point::new(
            p.x.min(grid.w - size.w).max(0.0),
            p.y.min(grid.h - size.h).max(0.0),
        )
    }
}

/// What the pointer went down on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// The piece body: starts a drag.
    Body,
    /// An embedded form control: never starts a drag.
    Control,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        piece_id: String,
        pointer_offset: Point,
        outer_size: Size,
        position: Point,
    },
}

/// Result of a pointer-up.
#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    /// Nothing was being dragged.
    Ignored,
    /// Landed on the cell it was dropped on.
    Placed { x: u32, y: u32 },
    /// Dropped on a taken cell and moved to the nearest free one.
    Relocated { desired: (u32, u32), x: u32, y: u32 },
    /// No free cell anywhere: the piece stays put and floats again.
    NoSpace,
}

#[derive(Clone, Debug)]
pub struct DragController {
    layout: MallaLayout,
    state: DragState,
}

impl DragController {
    pub fn new(layout: MallaLayout) -> Self {
        DragController {
            layout,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn layout(&self) -> &MallaLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: MallaLayout) {
        self.layout = layout;
    }

    /// Start dragging `piece_id` if the pointer went down on its body.
    /// The piece stops floating as soon as it is picked up.
    pub fn pointer_down(
        &mut self,
        malla: &Malla,
        piece_id: &str,
        pointer: Point,
        outer_size: Size,
        target: PointerTarget,
    ) -> Malla {
        if target == PointerTarget::Control {
            return malla.clone();
        }
        let Some(piece) = malla.piece(piece_id) else {
            return malla.clone();
        };
        let (x, y) = piece.position();
        let origin = self.layout.cell_origin(x, y);
        self.state = DragState::Dragging {
            piece_id: piece_id.to_string(),
            pointer_offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
            outer_size,
            position: origin,
        };
        log::debug!("dragging piece {piece_id} from ({x}, {y})");
        malla.with_floating(piece_id, false)
    }

    /// Track the pointer; the footprint is clamped inside the grid.
    pub fn pointer_move(&mut self, pointer: Point) {
        let layout = self.layout;
        if let DragState::Dragging {
            pointer_offset,
            outer_size,
            position,
            ..
        } = &mut self.state
        {
            let raw = Point::new(pointer.x - pointer_offset.x, pointer.y - pointer_offset.y);
            *position = layout.clamp(raw, *outer_size);
        }
    }

    /// Drop the piece on the coarse cell nearest to its current position.
    pub fn pointer_up(&mut self, malla: &Malla) -> (Malla, DropOutcome) {
        let DragState::Dragging {
            piece_id, position, ..
        } = std::mem::take(&mut self.state)
        else {
            return (malla.clone(), DropOutcome::Ignored);
        };

        let desired = self.layout.snap(position);
        match malla.place_piece(&piece_id, desired.0, desired.1) {
            Ok((next, (x, y))) if (x, y) == desired => (next, DropOutcome::Placed { x, y }),
            Ok((next, (x, y))) => (next, DropOutcome::Relocated { desired, x, y }),
            Err(MallaError::NoSpace) => {
                log::warn!("no space to drop piece {piece_id}");
                (malla.with_floating(&piece_id, true), DropOutcome::NoSpace)
            }
            Err(err) => {
                log::warn!("drop of piece {piece_id} failed: {err}");
                (malla.clone(), DropOutcome::Ignored)
            }
        }
    }
}
