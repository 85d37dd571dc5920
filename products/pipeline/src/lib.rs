//! Sales pipeline board.
//!
//! A [`PipelineBoard`] owns ordered stages, each holding ordered deals. Moving
//! a deal between stages rewrites its stage label and recomputes its win
//! probability from the target stage name; the board also reports total,
//! weighted and average deal values.

mod board;
mod drag;
mod error;
mod model;
pub mod probability;
mod seed;

pub use board::{MoveOutcome, PipelineBoard, PipelineSummary, StageTransition};
pub use drag::DragSession;
pub use error::{BoardError, BoardResult};
pub use model::{
    Contact, ContactId, DEFAULT_STAGE_COLOR, Deal, DealId, MAX_DEAL_VALUE, NewDeal, Stage,
    StageId,
};
pub use probability::probability_for_stage;
