#![allow(dead_code)]

use malla::{BlockAspect, BlockData, Cell, Coord, Template, VisualTemplate};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(row: usize, col: usize) -> Coord {
    Coord::new(row, col)
}

/// A blank 10×10 template with the given cells activated.
pub fn template_with_active(cells: &[(usize, usize)]) -> Template {
    cells
        .iter()
        .fold(Template::blank(), |t, &(r, c)| t.with_active(at(r, c), true))
}

/// A template built from raw rows, for shapes the editing API refuses to make.
pub fn template_from_fn(edit: impl FnOnce(&mut Vec<Vec<Cell>>)) -> Template {
    let mut rows = Template::blank().as_rows().to_vec();
    edit(&mut rows);
    Template::from_rows(rows)
}

pub fn master_with_active(cells: &[(usize, usize)]) -> BlockData {
    BlockData::new(
        template_with_active(cells),
        VisualTemplate::new(),
        BlockAspect::Square,
    )
}
