use async_graphql::{Context, Error, ErrorExtensions, ID, InputObject, Object, SimpleObject};
use chrono::NaiveDate;
use platform_api::{ApiError, internal_error};
use products_pipeline::{
    BoardError, Contact, ContactId, Deal, DealId, NewDeal, PipelineBoard, PipelineSummary, Stage,
    StageId, probability_for_stage,
};
use tracing::instrument;

use crate::service::{BoardHandle, MoveReceipt, ServiceError};

/// Read view over one board snapshot. Every field of a single `pipeline`
/// selection resolves against the same board.
pub struct PipelineQuery {
    board: PipelineBoard,
}

impl PipelineQuery {
    pub async fn load(ctx: &Context<'_>) -> async_graphql::Result<Self> {
        let board = board(ctx)?.snapshot().await.map_err(api_error)?;
        Ok(Self { board })
    }
}

#[derive(Default)]
pub struct PipelineMutation;

#[Object]
impl PipelineQuery {
    async fn stages(&self) -> Vec<StageNode> {
        self.board.stages().iter().map(StageNode::from).collect()
    }

    async fn stage(&self, id: ID) -> Option<StageNode> {
        self.board.stage(&StageId::new(id.0)).map(StageNode::from)
    }

    async fn deal(&self, id: ID) -> Option<DealNode> {
        self.board
            .deal(&DealId::new(id.0))
            .map(|(_, deal)| DealNode::from(deal))
    }

    async fn summary(&self) -> SummaryNode {
        self.board.summary().into()
    }

    #[graphql(name = "probabilityForStage")]
    async fn probability_for_stage(&self, name: String) -> i32 {
        i32::from(probability_for_stage(&name))
    }
}

#[Object]
impl PipelineMutation {
    #[graphql(name = "moveDeal")]
    #[instrument(name = "graphql.pipeline.move_deal", skip_all)]
    async fn move_deal(
        &self,
        ctx: &Context<'_>,
        deal_id: ID,
        stage_id: ID,
    ) -> async_graphql::Result<MoveDealPayload> {
        let receipt = board(ctx)?
            .move_deal(DealId::new(deal_id.0), StageId::new(stage_id.0))
            .await
            .map_err(api_error)?;
        Ok(receipt.into())
    }

    #[graphql(name = "addStage")]
    #[instrument(name = "graphql.pipeline.add_stage", skip_all)]
    async fn add_stage(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<StageNode> {
        let stage = board(ctx)?.add_stage(name).await.map_err(api_error)?;
        Ok(StageNode::from(&stage))
    }

    /// Returns the removed stage. Fails with PRECONDITION_FAILED while the
    /// stage still holds deals.
    #[graphql(name = "removeStage")]
    #[instrument(name = "graphql.pipeline.remove_stage", skip_all)]
    async fn remove_stage(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<StageNode> {
        let stage = board(ctx)?
            .remove_stage(StageId::new(id.0))
            .await
            .map_err(api_error)?;
        Ok(StageNode::from(&stage))
    }

    #[graphql(name = "addDeal")]
    #[instrument(name = "graphql.pipeline.add_deal", skip_all)]
    async fn add_deal(
        &self,
        ctx: &Context<'_>,
        input: NewDealInput,
    ) -> async_graphql::Result<DealNode> {
        let stage = StageId::new(input.stage_id.0.clone());
        let deal = board(ctx)?
            .add_deal(stage, input.into())
            .await
            .map_err(api_error)?;
        Ok(DealNode::from(&deal))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Stage")]
pub struct StageNode {
    pub id: ID,
    pub name: String,
    pub color: String,
    #[graphql(name = "dealCount")]
    pub deal_count: i32,
    #[graphql(name = "totalValue")]
    pub total_value: f64,
    pub deals: Vec<DealNode>,
}

impl From<&Stage> for StageNode {
    fn from(stage: &Stage) -> Self {
        Self {
            id: ID(stage.id.to_string()),
            name: stage.name.clone(),
            color: stage.color.clone(),
            deal_count: stage.deal_count() as i32,
            total_value: stage.total_value(),
            deals: stage.deals.iter().map(DealNode::from).collect(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Deal")]
pub struct DealNode {
    pub id: ID,
    pub title: String,
    pub value: f64,
    pub stage: String,
    pub probability: i32,
    pub contact: ContactNode,
    #[graphql(name = "dueDate")]
    pub due_date: Option<NaiveDate>,
    #[graphql(name = "createdDate")]
    pub created_date: NaiveDate,
    #[graphql(name = "lastActivity")]
    pub last_activity: Option<NaiveDate>,
    pub description: Option<String>,
}

impl From<&Deal> for DealNode {
    fn from(deal: &Deal) -> Self {
        Self {
            id: ID(deal.id.to_string()),
            title: deal.title.clone(),
            value: deal.value,
            stage: deal.stage.clone(),
            probability: i32::from(deal.probability),
            contact: ContactNode {
                id: ID(deal.contact.id.to_string()),
                name: deal.contact.name.clone(),
                company: deal.contact.company.clone(),
            },
            due_date: deal.due_date,
            created_date: deal.created_date,
            last_activity: deal.last_activity,
            description: deal.description.clone(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Contact")]
pub struct ContactNode {
    pub id: ID,
    pub name: String,
    pub company: String,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PipelineSummary")]
pub struct SummaryNode {
    #[graphql(name = "dealCount")]
    pub deal_count: i32,
    #[graphql(name = "totalValue")]
    pub total_value: f64,
    #[graphql(name = "weightedValue")]
    pub weighted_value: f64,
    #[graphql(name = "averageDealSize")]
    pub average_deal_size: f64,
}

impl From<PipelineSummary> for SummaryNode {
    fn from(summary: PipelineSummary) -> Self {
        Self {
            deal_count: summary.deal_count as i32,
            total_value: summary.total_value,
            weighted_value: summary.weighted_value,
            average_deal_size: summary.average_deal_size,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MoveDealPayload {
    /// False when the deal was dropped on the stage it already belonged to.
    pub moved: bool,
    pub deal: DealNode,
    #[graphql(name = "fromStage")]
    pub from_stage: Option<ID>,
    #[graphql(name = "toStage")]
    pub to_stage: ID,
}

impl From<MoveReceipt> for MoveDealPayload {
    fn from(receipt: MoveReceipt) -> Self {
        let from_stage = receipt
            .outcome
            .transition()
            .map(|transition| ID(transition.from_stage.to_string()));
        Self {
            moved: receipt.outcome.is_moved(),
            deal: DealNode::from(&receipt.deal),
            from_stage,
            to_stage: ID(receipt.stage.to_string()),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct ContactInput {
    pub id: ID,
    pub name: String,
    pub company: String,
}

#[derive(Clone, Debug, InputObject)]
pub struct NewDealInput {
    #[graphql(name = "stageId")]
    pub stage_id: ID,
    pub title: String,
    pub value: f64,
    pub contact: ContactInput,
    #[graphql(name = "dueDate")]
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl From<NewDealInput> for NewDeal {
    fn from(input: NewDealInput) -> Self {
        NewDeal {
            title: input.title,
            value: input.value,
            contact: Contact {
                id: ContactId::new(input.contact.id.0),
                name: input.contact.name,
                company: input.contact.company,
            },
            due_date: input.due_date,
            created_date: None,
            description: input.description,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Board(board) => match board {
                BoardError::DealNotFound(_) | BoardError::StageNotFound(_) => {
                    ApiError::NotFound(board.to_string())
                }
                BoardError::PreconditionFailed { .. } => {
                    ApiError::PreconditionFailed(board.to_string())
                }
                BoardError::InvalidInput(msg) => ApiError::InvalidInput(msg),
                BoardError::InvalidDocument(_) => ApiError::internal(board.into()),
            },
            ServiceError::Closed => ApiError::Unavailable,
        }
    }
}

fn api_error(err: ServiceError) -> Error {
    ApiError::from(err).extend()
}

fn board<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a BoardHandle> {
    ctx.data::<BoardHandle>()
        .map_err(|_| internal_error(anyhow::anyhow!("missing board service")))
}
