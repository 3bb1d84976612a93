/*!
# Malla

Design a reusable grid "block" and compose many instances of it into a
larger placement grid (a *malla*).

## Overview

A block is a 10×10 template of cells. Cells can be activated, merged into
rectangular groups, and typed as static text, free text, checkbox, dropdown,
number or calculated field. A malla is a coarse grid of pieces, each piece
being either a live reference to a region of the master block or a frozen
snapshot of it.

## Architecture

### Grid Model
- **cell** / **template**: cells, merge pointers and copy-on-write editing
- **visual**: per-cell view styles, aspect ratios and pixel geometry
- **coord**: structured coordinates and the only place where `"row-col"`
  keys and `r<row>c<col>` tokens are encoded or decoded

### Core Engines
- **bounds**: active region of a template, crops that never split a merge
  group, and re-expansion of stale rectangles
- **calc**: evaluator for calculated cells; never fails, yields `NaN`
- **piece** / **malla**: reference/snapshot pieces, free-cell search,
  nearest-cell relocation, duplication, resizing, freeze/unfreeze
- **drag**: the pointer-driven drag placement state machine

### Persistence Layer
- **document**: versioned JSON import/export of blocks and mallas
- **store**: key-value stores (in memory, or a gzip-compressed bincode file)
- **repo**: master block and project repositories
- **autosave**: debounced writes of the current malla to a draft slot

## Design Highlights

- Every model type is an immutable value; edits return a new value
- Imports validate completely before anything is applied
- Crops drop merge pointers and expression references that would dangle
- Single-threaded: the caller drives time (drag events, debounce deadlines)
*/

pub mod autosave;
pub mod bounds;
pub mod calc;
pub mod cell;
pub mod config;
pub mod coord;
pub mod document;
pub mod drag;
pub mod error;
pub mod malla;
pub mod palette;
pub mod piece;
pub mod repo;
pub mod store;
pub mod template;
pub mod visual;

/// Re-export the commonly used items at the crate root.
pub use autosave::{AutoSaver, Debouncer};
pub use bounds::{
    ActiveBounds, crop_template, crop_visual_template, expand_bounds_to_merges,
    get_active_bounds, merge_span, rebase_expression,
};
pub use calc::{CalcValues, FieldValue, evaluate_expression};
pub use cell::{Cell, CellStyle, CellUpdate, InputType};
pub use config::EditorConfig;
pub use coord::Coord;
pub use document::{
    BLOCK_SCHEMA_VERSION, BlockExport, MALLA_SCHEMA_VERSION, MallaExport, ProjectDocument,
    export_block, export_malla, import_block, import_malla,
};
pub use drag::{DragController, DragState, DropOutcome, MallaLayout, Point, PointerTarget, Size};
pub use error::{ConfigError, DocumentError, MallaError, MergeError, ResizeError, StoreError};
pub use malla::{GridSize, Malla, PieceValues};
pub use palette::generate_palette;
pub use piece::{CurricularPiece, MASTER_SOURCE_ID, PieceRef, RefPiece, SnapshotPiece};
pub use repo::{MasterRepository, ProjectEntry, ProjectMeta, ProjectRepository, ProjectSummary};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use template::{BLOCK_COLS, BLOCK_ROWS, BlockData, MasterBlockData, Template};
pub use visual::{
    BlockAspect, ConditionalBg, FontSize, ResolvedStyle, SelectSource, TextAlign, VisualStyle,
    VisualTemplate, block_outer_size,
};
