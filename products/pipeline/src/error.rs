use thiserror::Error;

use crate::model::{DealId, StageId};

pub type BoardResult<T> = Result<T, BoardError>;

/// Failures raised by board operations. The board is left untouched whenever
/// one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("deal {0} not found")]
    DealNotFound(DealId),
    #[error("stage {0} not found")]
    StageNotFound(StageId),
    #[error("stage {stage} still holds {deals} deal(s)")]
    PreconditionFailed { stage: StageId, deals: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid board document: {0}")]
    InvalidDocument(String),
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DealNotFound(_) | Self::StageNotFound(_))
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}
