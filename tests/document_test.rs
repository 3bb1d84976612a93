mod common;

use std::collections::BTreeMap;

use common::{at, init_logger, master_with_active};
use malla::{
    ActiveBounds, BlockAspect, BlockData, Cell, ConditionalBg, DocumentError, FieldValue, GridSize,
    InputType, MALLA_SCHEMA_VERSION, Malla, MallaError, MallaExport, PieceRef, ProjectDocument,
    RefPiece, Template, TextAlign, VisualStyle, VisualTemplate, export_block, export_malla,
    import_block, import_malla,
};
use pretty_assertions::assert_eq;

fn sample_block() -> (Template, VisualTemplate) {
    let template = Template::blank()
        .set_input_type(at(0, 0), Some(InputType::Select))
        .combine(&[at(0, 0), at(0, 1)])
        .unwrap()
        .set_input_type(at(1, 0), Some(InputType::Checkbox));
    let visual = VisualTemplate::new()
        .set_style(
            at(0, 0),
            Some(VisualStyle {
                text_align: Some(TextAlign::Center),
                font_size_px: Some(16.0),
                ..VisualStyle::default()
            }),
        )
        .set_style(
            at(1, 0),
            Some(VisualStyle {
                conditional_bg: Some(ConditionalBg {
                    checked_color: Some("#00ff00".into()),
                    ..ConditionalBg::default()
                }),
                ..VisualStyle::default()
            }),
        );
    (template, visual)
}

#[test]
fn block_export_imports_back_unchanged() {
    init_logger();
    let (template, visual) = sample_block();
    let json = export_block(&template, &visual, BlockAspect::Tall).unwrap();
    let doc = import_block(&json).unwrap();

    assert_eq!(doc.version, 1);
    assert_eq!(doc.template, template);
    assert_eq!(doc.visual, visual);
    assert_eq!(doc.aspect, BlockAspect::Tall);
}

#[test]
fn block_wire_format_uses_string_keys() {
    let (template, visual) = sample_block();
    let json = export_block(&template, &visual, BlockAspect::Wide).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(raw["aspect"], "2/1");
    assert_eq!(raw["template"][0][1]["mergedWith"], "0-0");
    assert_eq!(raw["template"][0][0]["type"], "select");
    assert_eq!(raw["visual"]["1-0"]["conditionalBg"]["checkedColor"], "#00ff00");
}

#[test]
fn block_import_rejections() {
    assert!(matches!(import_block("{not json"), Err(DocumentError::InvalidJson(_))));
    assert!(matches!(import_block("[1, 2]"), Err(DocumentError::InvalidJson(_))));
    assert!(matches!(
        import_block(r#"{"version": 2, "template": [], "visual": {}, "aspect": "1/1"}"#),
        Err(DocumentError::IncompatibleVersion {
            expected: 1,
            found: Some(2)
        })
    ));
    assert!(matches!(
        import_block(r#"{"template": [], "visual": {}, "aspect": "1/1"}"#),
        Err(DocumentError::IncompatibleVersion { found: None, .. })
    ));
    assert!(matches!(
        import_block(r#"{"version": 1, "template": [], "aspect": "1/1"}"#),
        Err(DocumentError::IncompleteData("visual"))
    ));
    assert!(matches!(
        import_block(r#"{"version": 1, "template": [], "visual": {}, "aspect": "3/1"}"#),
        Err(DocumentError::Malformed(_))
    ));
}

#[test]
fn malla_round_trip_keeps_boolean_values() {
    let master = BlockData::new(
        Template::from_rows(vec![vec![Cell {
            active: true,
            ..Cell::default()
        }]]),
        VisualTemplate::new(),
        BlockAspect::Square,
    );
    let piece = RefPiece {
        id: "p1".into(),
        reference: PieceRef {
            source_id: "master".into(),
            bounds: ActiveBounds::new(0, 0, 0, 0),
            aspect: BlockAspect::Square,
        },
        x: 0,
        y: 0,
    };
    let values = BTreeMap::from([(
        "p1".to_string(),
        BTreeMap::from([("done".to_string(), FieldValue::Bool(true))]),
    )]);
    let original = Malla::from_parts(
        master,
        GridSize::new(1, 1),
        vec![piece.into()],
        values,
        vec!["p1".to_string()],
    );

    let json = export_malla(&original).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(raw["values"]["p1"]["done"], true);
    assert_eq!(raw["pieces"][0]["kind"], "ref");
    assert_eq!(raw["floatingPieces"][0], "p1");

    let doc = import_malla(&json).unwrap();
    assert_eq!(doc, MallaExport::from_malla(&original));
    assert_eq!(doc.into_malla(), original);
}

#[test]
fn malla_import_defaults_optional_fields() {
    let json = r#"{
        "version": 1,
        "master": { "template": [[{"active": true}]], "visual": {}, "aspect": "1/1" },
        "pieces": null
    }"#;
    let doc = import_malla(json).unwrap();

    assert_eq!(doc.version, MALLA_SCHEMA_VERSION);
    assert_eq!(doc.grid, GridSize::new(5, 5));
    assert!(doc.pieces.is_empty());
    assert!(doc.values.is_empty());
    assert!(doc.floating_pieces.is_empty());
}

#[test]
fn malla_import_rejections() {
    assert!(matches!(
        import_malla(r#"{"version": 1}"#),
        Err(DocumentError::IncompleteData("master"))
    ));
    assert!(matches!(
        import_malla(r#"{"version": 1, "master": {"template": [], "visual": {}}}"#),
        Err(DocumentError::IncompleteData("master.aspect"))
    ));
    assert!(matches!(
        import_malla(r#"{"version": "1", "master": {}}"#),
        Err(DocumentError::IncompatibleVersion { found: None, .. })
    ));
    assert!(matches!(import_malla(""), Err(DocumentError::InvalidJson(_))));
}

#[test]
fn legacy_documents_load_leniently() {
    let json = r##"{
        "version": 1,
        "master": {
            "template": [[{"active": true, "mergedWith": "garbage"}, {"active": true}]],
            "visual": { "0-1": {"backgroundColor": "#eee"}, "oops": {}, "0-0": null },
            "aspect": "1/1"
        },
        "grid": { "cols": 2, "rows": 1 },
        "pieces": [
            { "kind": "snapshot", "id": "s1", "x": 1, "y": 0,
              "template": [[{"active": true}]], "visual": {}, "aspect": "2/1" }
        ]
    }"##;
    let m = import_malla(json).unwrap().into_malla();

    assert_eq!(m.master().template.cell(at(0, 0)).unwrap().merged_with, None);
    assert_eq!(m.master().visual.len(), 1);
    assert!(m.master().visual.get(at(0, 1)).is_some());
    assert_eq!(
        m.toggle_piece_kind("s1").unwrap_err(),
        MallaError::NoOrigin("s1".into())
    );
}

#[test]
fn imported_malla_keeps_allocating_fresh_ids() {
    let (m, _) = Malla::new(master_with_active(&[(0, 0)]), GridSize::new(3, 1))
        .add_referenced()
        .unwrap();
    let restored = import_malla(&export_malla(&m).unwrap()).unwrap().into_malla();
    let (_, id) = restored.add_referenced().unwrap();
    assert_eq!(id, "p2");
}

#[test]
fn project_documents_tell_blocks_from_mallas() {
    let (template, visual) = sample_block();
    let block_json = export_block(&template, &visual, BlockAspect::Square).unwrap();
    let malla = Malla::new(master_with_active(&[(0, 0)]), GridSize::default());
    let malla_json = export_malla(&malla).unwrap();

    let block: ProjectDocument = serde_json::from_str(&block_json).unwrap();
    let malla_doc: ProjectDocument = serde_json::from_str(&malla_json).unwrap();
    assert!(matches!(block, ProjectDocument::Block(_)));
    assert!(matches!(malla_doc, ProjectDocument::Malla(_)));
}

fn malla_with_ref_bounds(bounds: &str) -> String {
    format!(
        r#"{{
            "version": 1,
            "master": {{ "template": [[{{"active": true}}]], "visual": {{}}, "aspect": "1/1" }},
            "pieces": [
                {{ "kind": "ref", "id": "p1", "x": 0, "y": 0,
                   "ref": {{ "sourceId": "master", "aspect": "1/1", "bounds": {bounds} }} }}
            ]
        }}"#
    )
}

#[test]
fn reference_bounds_are_validated_on_import() {
    let ok = malla_with_ref_bounds(
        r#"{"minRow": 1, "maxRow": 2, "minCol": 0, "maxCol": 9, "rows": 2, "cols": 10}"#,
    );
    let doc = import_malla(&ok).unwrap();
    let malla = doc.into_malla();
    assert!(malla.resolve_piece("p1").is_some());

    let reversed = malla_with_ref_bounds(
        r#"{"minRow": 3, "maxRow": 1, "minCol": 0, "maxCol": 0, "rows": 1, "cols": 1}"#,
    );
    assert!(matches!(import_malla(&reversed), Err(DocumentError::Malformed(_))));

    let oversized = malla_with_ref_bounds(
        r#"{"minRow": 0, "maxRow": 4000000000, "minCol": 0, "maxCol": 0, "rows": 1, "cols": 1}"#,
    );
    assert!(matches!(import_malla(&oversized), Err(DocumentError::Malformed(_))));
}

#[test]
fn stale_cached_size_is_recomputed_on_import() {
    let json = malla_with_ref_bounds(
        r#"{"minRow": 0, "maxRow": 0, "minCol": 0, "maxCol": 1, "rows": 7, "cols": 7}"#,
    );
    let doc = import_malla(&json).unwrap();
    let malla::CurricularPiece::Ref(piece) = &doc.pieces[0] else {
        panic!("expected a reference piece");
    };
    assert_eq!(piece.reference.bounds, ActiveBounds::new(0, 0, 0, 1));
}
