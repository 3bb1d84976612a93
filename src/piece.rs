use serde::{Deserialize, Serialize};

use crate::bounds::{
    ActiveBounds, crop_template, crop_visual_template, expand_bounds_to_merges, get_active_bounds,
};
use crate::template::{BlockData, Template};
use crate::visual::{BlockAspect, VisualTemplate};

/// Source id of the malla's own master block.
pub const MASTER_SOURCE_ID: &str = "master";

/// Where a piece's content comes from: a rectangle of a master block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRef {
    pub source_id: String,
    pub bounds: ActiveBounds,
    pub aspect: BlockAspect,
}

impl PieceRef {
    /// A reference to the current active region of `master`.
    pub fn to_master(master: &BlockData) -> Self {
        PieceRef {
            source_id: MASTER_SOURCE_ID.to_string(),
            bounds: get_active_bounds(&master.template),
            aspect: master.aspect,
        }
    }

    /// Content of this reference against the master as it is now.
    ///
    /// The stored rectangle is first re-expanded against the current
    /// template so that merge groups created or grown since the reference
    /// was taken are never sliced.
    pub fn resolve(&self, master: &BlockData) -> BlockData {
        let bounds = expand_bounds_to_merges(&master.template, &self.bounds);
        BlockData {
            template: crop_template(&master.template, &bounds),
            visual: crop_visual_template(&master.visual, &bounds),
            aspect: self.aspect,
        }
    }
}

/// A piece whose content is derived live from the master.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefPiece {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: PieceRef,
    pub x: u32,
    pub y: u32,
}

/// A piece holding its own frozen copy of a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPiece {
    pub id: String,
    pub template: Template,
    pub visual: VisualTemplate,
    pub aspect: BlockAspect,
    pub x: u32,
    pub y: u32,
    /// Reference this snapshot was frozen from; without it the snapshot can
    /// never be turned back into a reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<PieceRef>,
}

impl RefPiece {
    /// Freeze into an independent snapshot of the master as it is now.
    /// Position and id are kept; the reference is kept as `origin`.
    pub fn freeze(&self, master: &BlockData) -> SnapshotPiece {
        let BlockData {
            template,
            visual,
            aspect,
        } = self.reference.resolve(master);
        SnapshotPiece {
            id: self.id.clone(),
            template,
            visual,
            aspect,
            x: self.x,
            y: self.y,
            origin: Some(self.reference.clone()),
        }
    }
}

impl SnapshotPiece {
    /// Back to a live reference; only possible when an origin was retained.
    pub fn unfreeze(&self) -> Option<RefPiece> {
        let origin = self.origin.clone()?;
        Some(RefPiece {
            id: self.id.clone(),
            reference: origin,
            x: self.x,
            y: self.y,
        })
    }

    pub fn content(&self) -> BlockData {
        BlockData::new(self.template.clone(), self.visual.clone(), self.aspect)
    }
}

/// One placed item of the malla.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurricularPiece {
    Ref(RefPiece),
    Snapshot(SnapshotPiece),
}

impl CurricularPiece {
    pub fn id(&self) -> &str {
        match self {
            CurricularPiece::Ref(p) => &p.id,
            CurricularPiece::Snapshot(p) => &p.id,
        }
    }

    pub fn position(&self) -> (u32, u32) {
        match self {
            CurricularPiece::Ref(p) => (p.x, p.y),
            CurricularPiece::Snapshot(p) => (p.x, p.y),
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, CurricularPiece::Ref(_))
    }

    pub(crate) fn set_position(&mut self, x: u32, y: u32) {
        match self {
            CurricularPiece::Ref(p) => (p.x, p.y) = (x, y),
            CurricularPiece::Snapshot(p) => (p.x, p.y) = (x, y),
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        match self {
            CurricularPiece::Ref(p) => p.id = id,
            CurricularPiece::Snapshot(p) => p.id = id,
        }
    }

    /// A new reference piece to the master's current active region.
    pub fn new_ref(id: String, master: &BlockData, x: u32, y: u32) -> Self {
        CurricularPiece::Ref(RefPiece {
            id,
            reference: PieceRef::to_master(master),
            x,
            y,
        })
    }

    /// A new snapshot of the master's current active region, remembering the
    /// region as its origin.
    pub fn new_snapshot(id: String, master: &BlockData, x: u32, y: u32) -> Self {
        RefPiece {
            id,
            reference: PieceRef::to_master(master),
            x,
            y,
        }
        .freeze(master)
        .into()
    }

    /// Content to render: live crop of the master for references, the
    /// stored copy for snapshots.
    pub fn resolve(&self, master: &BlockData) -> BlockData {
        match self {
            CurricularPiece::Ref(p) => p.reference.resolve(master),
            CurricularPiece::Snapshot(p) => p.content(),
        }
    }
}

impl From<RefPiece> for CurricularPiece {
    fn from(p: RefPiece) -> Self {
        CurricularPiece::Ref(p)
    }
}

impl From<SnapshotPiece> for CurricularPiece {
    fn from(p: SnapshotPiece) -> Self {
        CurricularPiece::Snapshot(p)
    }
}
