//! Paint traversal output.
//!
//! The scene does not rasterize; a paint pass walks mapped actors in
//! stacking order and records what each one would draw. Embedders hand the
//! resulting op list to whatever renderer they sit on; tests assert on it
//! directly.

use graft_geometry::{Affine, Rect};

use crate::actor::ActorId;

#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    /// A texture actor sampled its bound pixel source.
    Texture {
        actor: ActorId,
        source_id: u64,
        generation: u64,
        width: u32,
        height: u32,
    },
    /// A plain actor covering its allocation.
    Solid { actor: ActorId, area: Rect },
}

/// Accumulates the ops of one paint pass.
#[derive(Default)]
pub struct PaintContext {
    ops: Vec<PaintOp>,
    transform: Affine,
}

impl PaintContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform from the actor currently being painted to stage space.
    pub fn current_transform(&self) -> Affine {
        self.transform
    }

    pub(crate) fn set_current_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn push(&mut self, op: PaintOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Ops recorded by texture actors, in paint order.
    pub fn texture_ops(&self) -> impl Iterator<Item = &PaintOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Texture { .. }))
    }
}
