use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{BoardError, BoardResult};
use crate::model::{
    DEFAULT_STAGE_COLOR, Deal, DealId, NewDeal, Stage, StageId, valid_value,
};
use crate::probability::probability_for_stage;

/// Ordered stages of the sales pipeline and the deals they hold.
///
/// The board is the only owner of its stages; every mutation goes through the
/// methods below and either applies completely or returns an error with the
/// board untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardDocument")]
pub struct PipelineBoard {
    pub(crate) stages: Vec<Stage>,
}

#[derive(Deserialize)]
struct BoardDocument {
    #[serde(default)]
    stages: Vec<Stage>,
}

impl TryFrom<BoardDocument> for PipelineBoard {
    type Error = BoardError;

    fn try_from(doc: BoardDocument) -> Result<Self, Self::Error> {
        Self::from_stages(doc.stages)
    }
}

/// Result of a move request.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The deal already sat in the target stage; nothing changed.
    Unchanged,
    Moved(StageTransition),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    pub fn transition(&self) -> Option<&StageTransition> {
        match self {
            Self::Moved(transition) => Some(transition),
            Self::Unchanged => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTransition {
    pub deal_id: DealId,
    pub from_stage: StageId,
    pub from_name: String,
    pub to_stage: StageId,
    pub to_name: String,
    pub previous_probability: u8,
    pub probability: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub deal_count: usize,
    pub total_value: f64,
    pub weighted_value: f64,
    pub average_deal_size: f64,
}

impl PipelineBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from externally supplied stages, rejecting anything that
    /// breaks the board invariants.
    pub fn from_stages(stages: Vec<Stage>) -> BoardResult<Self> {
        validate_stages(&stages)?;
        Ok(Self { stages })
    }

    pub fn from_json(raw: &str) -> BoardResult<Self> {
        let doc: BoardDocument = serde_json::from_str(raw)
            .map_err(|err| BoardError::invalid_document(err.to_string()))?;
        Self::try_from(doc)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    /// The deal with `id` together with the stage currently holding it.
    pub fn deal(&self, id: &DealId) -> Option<(&Stage, &Deal)> {
        self.stages
            .iter()
            .find_map(|stage| stage.deal(id).map(|deal| (stage, deal)))
    }

    pub fn deals(&self) -> impl Iterator<Item = &Deal> {
        self.stages.iter().flat_map(|stage| stage.deals.iter())
    }

    pub fn deal_count(&self) -> usize {
        self.stages.iter().map(Stage::deal_count).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.stages.iter().map(Stage::total_value).sum()
    }

    /// Sum of `value * probability / 100` over every deal.
    pub fn weighted_value(&self) -> f64 {
        self.stages.iter().map(Stage::weighted_value).sum()
    }

    /// Zero on an empty board.
    pub fn average_deal_size(&self) -> f64 {
        self.total_value() / self.deal_count().max(1) as f64
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            deal_count: self.deal_count(),
            total_value: self.total_value(),
            weighted_value: self.weighted_value(),
            average_deal_size: self.average_deal_size(),
        }
    }

    /// Move a deal into another stage, appending it there and recomputing its
    /// probability from the target stage name.
    #[instrument(name = "pipeline.move_deal", skip_all, fields(deal = %deal_id, target = %target))]
    pub fn move_deal(&mut self, deal_id: &DealId, target: &StageId) -> BoardResult<MoveOutcome> {
        let (source_idx, deal_idx) = self
            .locate_deal(deal_id)
            .ok_or_else(|| BoardError::DealNotFound(deal_id.clone()))?;
        let target_idx = self
            .stage_index(target)
            .ok_or_else(|| BoardError::StageNotFound(target.clone()))?;

        if source_idx == target_idx {
            debug!("deal already in target stage");
            return Ok(MoveOutcome::Unchanged);
        }

        let mut deal = self.stages[source_idx].deals.remove(deal_idx);
        let previous_probability = deal.probability;
        let from_stage = self.stages[source_idx].id.clone();
        let from_name = std::mem::take(&mut deal.stage);

        let target_stage = &mut self.stages[target_idx];
        deal.stage = target_stage.name.clone();
        deal.probability = probability_for_stage(&target_stage.name);

        let transition = StageTransition {
            deal_id: deal.id.clone(),
            from_stage,
            from_name,
            to_stage: target_stage.id.clone(),
            to_name: target_stage.name.clone(),
            previous_probability,
            probability: deal.probability,
        };
        target_stage.deals.push(deal);
        debug_assert!(validate_stages(&self.stages).is_ok());

        info!(
            from = %transition.from_name,
            to = %transition.to_name,
            probability = transition.probability,
            "deal moved"
        );
        Ok(MoveOutcome::Moved(transition))
    }

    /// Append an empty stage. Names are trimmed; duplicates are allowed.
    #[instrument(name = "pipeline.add_stage", skip_all, fields(name = %name))]
    pub fn add_stage(&mut self, name: &str) -> BoardResult<&Stage> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::invalid_input("stage name must not be empty"));
        }
        let stage = Stage::new(StageId::generate(), name, DEFAULT_STAGE_COLOR);
        info!(stage = %stage.id, "stage added");
        self.stages.push(stage);
        Ok(&self.stages[self.stages.len() - 1])
    }

    /// Remove a stage that holds no deals.
    #[instrument(name = "pipeline.remove_stage", skip_all, fields(stage = %id))]
    pub fn remove_stage(&mut self, id: &StageId) -> BoardResult<Stage> {
        let idx = self
            .stage_index(id)
            .ok_or_else(|| BoardError::StageNotFound(id.clone()))?;
        let deals = self.stages[idx].deal_count();
        if deals > 0 {
            debug!(deals, "refusing to remove non-empty stage");
            return Err(BoardError::PreconditionFailed {
                stage: id.clone(),
                deals,
            });
        }
        let removed = self.stages.remove(idx);
        info!(name = %removed.name, "stage removed");
        Ok(removed)
    }

    /// Create a deal at the end of `stage_id`, deriving its probability from
    /// the stage name.
    #[instrument(name = "pipeline.add_deal", skip_all, fields(stage = %stage_id))]
    pub fn add_deal(&mut self, stage_id: &StageId, input: NewDeal) -> BoardResult<&Deal> {
        let idx = self
            .stage_index(stage_id)
            .ok_or_else(|| BoardError::StageNotFound(stage_id.clone()))?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(BoardError::invalid_input("deal title must not be empty"));
        }
        if !valid_value(input.value) {
            return Err(BoardError::invalid_input(
                "deal value must be a number between 0 and 1e15",
            ));
        }

        let stage = &mut self.stages[idx];
        let deal = Deal {
            id: DealId::generate(),
            title: title.to_string(),
            value: input.value,
            stage: stage.name.clone(),
            probability: probability_for_stage(&stage.name),
            contact: input.contact,
            due_date: input.due_date,
            created_date: input
                .created_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            last_activity: None,
            description: input.description,
        };
        info!(deal = %deal.id, probability = deal.probability, "deal added");
        stage.deals.push(deal);
        Ok(&stage.deals[stage.deals.len() - 1])
    }

    fn stage_index(&self, id: &StageId) -> Option<usize> {
        self.stages.iter().position(|stage| &stage.id == id)
    }

    fn locate_deal(&self, id: &DealId) -> Option<(usize, usize)> {
        self.stages
            .iter()
            .enumerate()
            .find_map(|(stage_idx, stage)| stage.position_of(id).map(|pos| (stage_idx, pos)))
    }
}

fn validate_stages(stages: &[Stage]) -> BoardResult<()> {
    let mut stage_ids = HashSet::new();
    let mut deal_ids = HashSet::new();
    for stage in stages {
        if !stage_ids.insert(&stage.id) {
            return Err(BoardError::invalid_document(format!(
                "stage id {} appears more than once",
                stage.id
            )));
        }
        for deal in &stage.deals {
            if !deal_ids.insert(&deal.id) {
                return Err(BoardError::invalid_document(format!(
                    "deal id {} appears more than once",
                    deal.id
                )));
            }
            if deal.stage != stage.name {
                return Err(BoardError::invalid_document(format!(
                    "deal {} names stage {:?} but sits in {:?}",
                    deal.id, deal.stage, stage.name
                )));
            }
            if deal.probability > 100 {
                return Err(BoardError::invalid_document(format!(
                    "deal {} has probability {} above 100",
                    deal.id, deal.probability
                )));
            }
            if !valid_value(deal.value) {
                return Err(BoardError::invalid_document(format!(
                    "deal {} has invalid value {}",
                    deal.id, deal.value
                )));
            }
        }
    }
    Ok(())
}
