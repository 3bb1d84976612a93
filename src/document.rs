//! Versioned JSON documents for blocks and mallas.
//!
//! Imports validate in three steps (JSON syntax, schema version, required
//! fields) before anything typed is built, and never apply partially.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::malla::{GridSize, Malla, PieceValues};
use crate::piece::CurricularPiece;
use crate::template::{BlockData, Template};
use crate::visual::{BlockAspect, VisualTemplate};

pub const BLOCK_SCHEMA_VERSION: u32 = 1;
pub const MALLA_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockExport {
    pub version: u32,
    pub template: Template,
    pub visual: VisualTemplate,
    pub aspect: BlockAspect,
}

impl BlockExport {
    pub fn into_block(self) -> BlockData {
        BlockData::new(self.template, self.visual, self.aspect)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MallaExport {
    pub version: u32,
    pub master: BlockData,
    #[serde(default)]
    pub grid: GridSize,
    #[serde(default)]
    pub pieces: Vec<CurricularPiece>,
    #[serde(default)]
    pub values: BTreeMap<String, PieceValues>,
    #[serde(default)]
    pub floating_pieces: Vec<String>,
}

impl MallaExport {
    pub fn from_malla(malla: &Malla) -> Self {
        MallaExport {
            version: MALLA_SCHEMA_VERSION,
            master: malla.master().clone(),
            grid: malla.grid(),
            pieces: malla.pieces().to_vec(),
            values: malla.values().clone(),
            floating_pieces: malla.floating().to_vec(),
        }
    }

    pub fn into_malla(self) -> Malla {
        Malla::from_parts(
            self.master,
            self.grid,
            self.pieces,
            self.values,
            self.floating_pieces,
        )
    }
}

/// Parse `json` into an object and check its version tag.
fn parse_versioned(json: &str, expected: u32) -> Result<Value, DocumentError> {
    let parsed: Value =
        serde_json::from_str(json).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
    if !parsed.is_object() {
        return Err(DocumentError::InvalidJson("not an object".to_string()));
    }
    let found = parsed.get("version").and_then(Value::as_u64);
    if found != Some(u64::from(expected)) {
        log::warn!("rejecting document with version {found:?}");
        return Err(DocumentError::IncompatibleVersion { expected, found });
    }
    Ok(parsed)
}

fn require(
    obj: &Value,
    field: &'static str,
    reported_as: &'static str,
) -> Result<(), DocumentError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DocumentError::IncompleteData(reported_as)),
        Some(_) => Ok(()),
    }
}

pub fn export_block(
    template: &Template,
    visual: &VisualTemplate,
    aspect: BlockAspect,
) -> Result<String, DocumentError> {
    let doc = BlockExport {
        version: BLOCK_SCHEMA_VERSION,
        template: template.clone(),
        visual: visual.clone(),
        aspect,
    };
    let json = serde_json::to_string_pretty(&doc).map_err(DocumentError::Serialize)?;
    log::info!("exported block ({} bytes)", json.len());
    Ok(json)
}

pub fn import_block(json: &str) -> Result<BlockExport, DocumentError> {
    let parsed = parse_versioned(json, BLOCK_SCHEMA_VERSION)?;
    for field in ["template", "visual", "aspect"] {
        require(&parsed, field, field)?;
    }
    let doc: BlockExport = serde_json::from_value(parsed).map_err(DocumentError::Malformed)?;
    log::info!("imported block {}x{}", doc.template.rows(), doc.template.cols());
    Ok(doc)
}

/// Serialize a malla; the version tag is always the current one.
pub fn export_malla(malla: &Malla) -> Result<String, DocumentError> {
    let json = serde_json::to_string_pretty(&MallaExport::from_malla(malla))
        .map_err(DocumentError::Serialize)?;
    log::info!(
        "exported malla with {} pieces ({} bytes)",
        malla.pieces().len(),
        json.len()
    );
    Ok(json)
}

/// Parse a malla document. Missing `grid`, `pieces`, `values` and
/// `floatingPieces` default to a 5×5 grid and empty collections.
pub fn import_malla(json: &str) -> Result<MallaExport, DocumentError> {
    let parsed = parse_versioned(json, MALLA_SCHEMA_VERSION)?;
    let master = parsed
        .get("master")
        .filter(|m| m.is_object())
        .ok_or(DocumentError::IncompleteData("master"))?;
    require(master, "template", "master.template")?;
    require(master, "visual", "master.visual")?;
    require(master, "aspect", "master.aspect")?;

    let mut doc: MallaExport = serde_json::from_value(strip_nulls(parsed))
        .map_err(DocumentError::Malformed)?;
    doc.version = MALLA_SCHEMA_VERSION;
    log::info!("imported malla with {} pieces", doc.pieces.len());
    Ok(doc)
}

/// Treat explicit `null` in the optional top-level fields as absent.
fn strip_nulls(mut doc: Value) -> Value {
    if let Value::Object(map) = &mut doc {
        map.retain(|_, v| !v.is_null());
    }
    doc
}

/// Anything stored in the project repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectDocument {
    Malla(MallaExport),
    Block(BlockExport),
}
