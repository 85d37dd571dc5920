use tracing::debug;

use crate::board::{MoveOutcome, PipelineBoard};
use crate::error::BoardResult;
use crate::model::{DealId, StageId};

/// Transient state of a card drag: which deal, if any, is being carried.
///
/// Every drop or cancel clears the session, whether or not the resulting move
/// succeeded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DragSession {
    dragged: Option<DealId>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up a deal card. Replaces any drag left over from an earlier gesture.
    pub fn begin(&mut self, deal: DealId) {
        if let Some(stale) = self.dragged.replace(deal) {
            debug!(deal = %stale, "discarding stale drag");
        }
    }

    pub fn dragged(&self) -> Option<&DealId> {
        self.dragged.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }

    pub fn cancel(&mut self) -> Option<DealId> {
        self.dragged.take()
    }

    /// Release over `stage`, issuing a single move for the carried deal.
    /// `Ok(None)` means nothing was being dragged.
    pub fn drop_on(
        &mut self,
        board: &mut PipelineBoard,
        stage: &StageId,
    ) -> BoardResult<Option<MoveOutcome>> {
        let Some(deal) = self.dragged.take() else {
            return Ok(None);
        };
        board.move_deal(&deal, stage).map(Some)
    }
}
