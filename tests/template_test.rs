mod common;

use common::{at, init_logger};
use malla::{
    BlockAspect, BlockData, Cell, CellUpdate, ConditionalBg, InputType, MergeError, ResolvedStyle,
    Template, VisualStyle, VisualTemplate, generate_palette,
};
use pretty_assertions::assert_eq;

#[test]
fn blank_template_is_ten_by_ten_and_inactive() {
    init_logger();
    let template = Template::blank();
    assert_eq!((template.rows(), template.cols()), (10, 10));
    assert_eq!(template.active_count(), 0);
    assert!(template.iter().all(|(_, cell)| *cell == Cell::blank()));
}

#[test]
fn edits_leave_the_original_untouched() {
    let original = Template::blank();
    let edited = original
        .toggle_active(at(1, 1))
        .set_input_type(at(2, 2), Some(InputType::Select));

    assert_eq!(original.active_count(), 0);
    assert_eq!(edited.active_count(), 2);
    assert_eq!(
        edited.cell(at(2, 2)).unwrap().dropdown_options,
        Some(Vec::new())
    );
}

#[test]
fn edits_outside_the_matrix_are_ignored() {
    let template = Template::blank();
    assert_eq!(template.with_active(at(12, 0), true), template);
}

#[test]
fn cell_update_touches_only_given_fields() {
    let template = Template::blank()
        .set_input_type(at(0, 0), Some(InputType::Text))
        .apply_cell_update(
            at(0, 0),
            CellUpdate {
                placeholder: Some("Course code".into()),
                ..CellUpdate::default()
            },
        );
    let cell = template.cell(at(0, 0)).unwrap();
    assert_eq!(cell.input_type, Some(InputType::Text));
    assert_eq!(cell.placeholder.as_deref(), Some("Course code"));
    assert!(cell.active);
}

#[test]
fn combine_bases_the_group_at_the_top_left() {
    let template = Template::blank()
        .combine(&[at(3, 4), at(2, 5), at(2, 4), at(3, 5)])
        .unwrap();

    assert!(template.is_base(at(2, 4)));
    assert_eq!(template.cell(at(2, 4)).unwrap().merged_with, None);
    for member in [at(2, 5), at(3, 4), at(3, 5)] {
        assert_eq!(template.cell(member).unwrap().merged_with, Some(at(2, 4)));
        assert!(template.cell(member).unwrap().active);
    }
    assert_eq!(template.group_of(at(3, 5)).map(|g| g.len()), Some(4));
}

#[test]
fn combine_rejects_bad_selections() {
    let configured = Template::blank()
        .set_input_type(at(0, 0), Some(InputType::Number))
        .set_input_type(at(0, 1), Some(InputType::Checkbox));

    assert_eq!(
        configured.combine(&[at(0, 0), at(0, 1)]),
        Err(MergeError::MultipleConfigured)
    );
    assert_eq!(configured.combine(&[at(0, 0)]), Err(MergeError::TooFewCells));
    assert_eq!(
        configured.combine(&[at(0, 0), at(10, 0)]),
        Err(MergeError::OutOfRange(at(10, 0)))
    );
    // one configured cell is fine and becomes part of the group
    assert!(configured.combine(&[at(0, 0), at(1, 0)]).is_ok());
}

#[test]
fn separate_breaks_the_whole_group_from_its_base() {
    let merged = Template::blank()
        .combine(&[at(0, 0), at(0, 1), at(1, 0)])
        .unwrap();
    let split = merged.separate(&[at(0, 0)]);

    assert!(split.iter().all(|(_, cell)| cell.merged_with.is_none()));
    assert_eq!(split.group_of(at(0, 1)), None);
    // activation survives the split
    assert_eq!(split.active_count(), 3);
}

#[test]
fn separate_from_a_member_only_frees_that_member() {
    let merged = Template::blank()
        .combine(&[at(0, 0), at(0, 1), at(1, 0)])
        .unwrap();
    let split = merged.separate(&[at(1, 0)]);

    assert_eq!(split.cell(at(1, 0)).unwrap().merged_with, None);
    assert_eq!(split.cell(at(0, 1)).unwrap().merged_with, Some(at(0, 0)));
}

#[test]
fn duplicated_block_is_independent() {
    let block = BlockData::new(
        Template::blank().with_active(at(0, 0), true),
        VisualTemplate::new(),
        BlockAspect::Wide,
    );
    let mut copy = block.duplicate();
    copy.template = copy.template.with_active(at(0, 0), false);

    assert_eq!(block.template.active_count(), 1);
    assert_eq!(copy.template.active_count(), 0);
    assert_eq!(copy.aspect, BlockAspect::Wide);
}

#[test]
fn dropdown_colours_follow_the_palette() {
    let options: Vec<String> = ["Core", "Elective"].iter().map(|s| s.to_string()).collect();
    let rule = ConditionalBg::for_options(at(0, 0), &options);
    let palette = generate_palette(2);

    let source = rule.select_source.as_ref().unwrap();
    assert_eq!(source.coord, at(0, 0));
    assert_eq!(source.colors.get("Core"), Some(&palette[0]));
    assert_eq!(source.colors.get("Elective"), Some(&palette[1]));

    let style = VisualStyle {
        background_color: Some("#fafafa".into()),
        conditional_bg: Some(rule),
        ..VisualStyle::default()
    };
    let chosen =
        ResolvedStyle::resolve(Some(&style), false, |c| (c == at(0, 0)).then_some("Elective"));
    assert_eq!(chosen.background, palette[1]);
    let unknown = ResolvedStyle::resolve(Some(&style), false, |_| Some("Other"));
    assert_eq!(unknown.background, "#fafafa");
}
