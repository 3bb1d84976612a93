mod common;

use common::{init_logger, master_with_active};
use malla::{
    CurricularPiece, DragController, DragState, DropOutcome, GridSize, Malla, MallaLayout, Point,
    PointerTarget, Size,
};
use pretty_assertions::assert_eq;

// one active cell, square aspect: every coarse cell is 58×58 pixels
const CELL: f64 = 58.0;

fn setup(cols: u32, rows: u32) -> (Malla, DragController) {
    let m = Malla::new(master_with_active(&[(4, 4)]), GridSize::new(cols, rows));
    let controller = DragController::new(MallaLayout::for_malla(&m));
    (m, controller)
}

fn piece_size() -> Size {
    Size::new(CELL, CELL)
}

#[test]
fn layout_matches_the_master_region() {
    init_logger();
    let (m, controller) = setup(3, 2);
    let layout = controller.layout();
    assert_eq!(layout.cell, Size::new(CELL, CELL));
    assert_eq!(layout.pixel_size(), Size::new(3.0 * CELL, 2.0 * CELL));
    assert_eq!(layout.snap(Point::new(CELL * 1.4, CELL * 0.6)), (1, 1));
    assert_eq!(layout.snap(Point::new(-30.0, 1e6)), (0, 1));
    assert_eq!(MallaLayout::for_malla(&m), *layout);
}

#[test]
fn dragging_a_piece_onto_a_free_cell() {
    let (m, mut controller) = setup(3, 3);
    let (m, id) = m.add_referenced().unwrap();
    assert!(m.is_floating(&id));

    let m = controller.pointer_down(
        &m,
        &id,
        Point::new(10.0, 10.0),
        piece_size(),
        PointerTarget::Body,
    );
    assert!(!m.is_floating(&id));
    assert!(matches!(controller.state(), DragState::Dragging { piece_id, .. } if *piece_id == id));

    controller.pointer_move(Point::new(2.0 * CELL + 15.0, CELL + 7.0));
    let (m, outcome) = controller.pointer_up(&m);

    assert_eq!(outcome, DropOutcome::Placed { x: 2, y: 1 });
    assert_eq!(m.piece(&id).unwrap().position(), (2, 1));
    assert_eq!(*controller.state(), DragState::Idle);
}

#[test]
fn pressing_a_form_control_does_not_drag() {
    let (m, mut controller) = setup(3, 3);
    let (m, id) = m.add_referenced().unwrap();

    let after = controller.pointer_down(
        &m,
        &id,
        Point::new(5.0, 5.0),
        piece_size(),
        PointerTarget::Control,
    );
    assert_eq!(*controller.state(), DragState::Idle);
    assert_eq!(after, m);

    let (after, outcome) = controller.pointer_up(&m);
    assert_eq!(outcome, DropOutcome::Ignored);
    assert_eq!(after, m);
}

#[test]
fn dropping_on_a_taken_cell_relocates() {
    let (m, mut controller) = setup(3, 1);
    let m = m.fill_grid().delete_piece("p2");
    // p3 sits at (2, 0); drop it onto p1 at (0, 0)
    let m = controller.pointer_down(
        &m,
        "p3",
        Point::new(2.0 * CELL + 1.0, 1.0),
        piece_size(),
        PointerTarget::Body,
    );
    controller.pointer_move(Point::new(1.0, 1.0));
    let (m, outcome) = controller.pointer_up(&m);

    assert_eq!(
        outcome,
        DropOutcome::Relocated {
            desired: (0, 0),
            x: 1,
            y: 0
        }
    );
    assert_eq!(m.occupant(1, 0).map(|p| p.id()), Some("p3"));
}

#[test]
fn position_is_clamped_inside_the_grid() {
    let (m, mut controller) = setup(3, 3);
    let (m, id) = m.add_referenced().unwrap();

    let m = controller.pointer_down(
        &m,
        &id,
        Point::new(20.0, 20.0),
        piece_size(),
        PointerTarget::Body,
    );
    controller.pointer_move(Point::new(5000.0, -400.0));
    let DragState::Dragging { position, .. } = controller.state().clone() else {
        panic!("expected a drag in progress");
    };
    assert_eq!(position, Point::new(2.0 * CELL, 0.0));

    let (m, outcome) = controller.pointer_up(&m);
    assert_eq!(outcome, DropOutcome::Placed { x: 2, y: 0 });
    assert_eq!(m.piece(&id).unwrap().position(), (2, 0));
}

#[test]
fn no_space_leaves_the_piece_floating_where_it_was() {
    let master = master_with_active(&[(0, 0)]);
    let pieces = vec![
        CurricularPiece::new_ref("a".into(), &master, 0, 0),
        // stranded outside a 1×1 grid, e.g. by an older document
        CurricularPiece::new_ref("b".into(), &master, 5, 5),
    ];
    let m = Malla::from_parts(master, GridSize::new(1, 1), pieces, Default::default(), Vec::new());
    let mut controller = DragController::new(MallaLayout::for_malla(&m));

    let m = controller.pointer_down(
        &m,
        "b",
        Point::new(5.0 * CELL, 5.0 * CELL),
        piece_size(),
        PointerTarget::Body,
    );
    let (m, outcome) = controller.pointer_up(&m);

    assert_eq!(outcome, DropOutcome::NoSpace);
    assert!(m.is_floating("b"));
    assert_eq!(m.piece("b").unwrap().position(), (5, 5));
}
