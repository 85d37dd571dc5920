use products_pipeline::{
    BoardError, Deal, DealId, MoveOutcome, NewDeal, PipelineBoard, Stage, StageId,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("board service is not running")]
    Closed,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What a move did, plus the deal as it now stands and the stage holding it.
#[derive(Debug, Clone)]
pub struct MoveReceipt {
    pub outcome: MoveOutcome,
    pub stage: StageId,
    pub deal: Deal,
}

enum Command {
    Ping {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PipelineBoard>,
    },
    MoveDeal {
        deal: DealId,
        stage: StageId,
        reply: oneshot::Sender<Result<MoveReceipt, BoardError>>,
    },
    AddStage {
        name: String,
        reply: oneshot::Sender<Result<Stage, BoardError>>,
    },
    RemoveStage {
        id: StageId,
        reply: oneshot::Sender<Result<Stage, BoardError>>,
    },
    AddDeal {
        stage: StageId,
        input: NewDeal,
        reply: oneshot::Sender<Result<Deal, BoardError>>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Ping { .. } => "ping",
            Command::Snapshot { .. } => "snapshot",
            Command::MoveDeal { .. } => "move_deal",
            Command::AddStage { .. } => "add_stage",
            Command::RemoveStage { .. } => "remove_stage",
            Command::AddDeal { .. } => "add_deal",
        }
    }
}

/// Cloneable handle to the task that owns the board. Commands are applied one
/// at a time in arrival order.
#[derive(Clone, Debug)]
pub struct BoardHandle {
    tx: mpsc::Sender<Command>,
}

impl BoardHandle {
    /// Spawn the owning task on the current tokio runtime.
    pub fn spawn(board: PipelineBoard, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        tokio::spawn(run(board, rx));
        Self { tx }
    }

    /// Round trip through the queue without touching the board.
    pub async fn ping(&self) -> ServiceResult<()> {
        self.request(|reply| Command::Ping { reply }).await
    }

    pub async fn snapshot(&self) -> ServiceResult<PipelineBoard> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn move_deal(&self, deal: DealId, stage: StageId) -> ServiceResult<MoveReceipt> {
        Ok(self
            .request(|reply| Command::MoveDeal { deal, stage, reply })
            .await??)
    }

    pub async fn add_stage(&self, name: String) -> ServiceResult<Stage> {
        Ok(self.request(|reply| Command::AddStage { name, reply }).await??)
    }

    pub async fn remove_stage(&self, id: StageId) -> ServiceResult<Stage> {
        Ok(self.request(|reply| Command::RemoveStage { id, reply }).await??)
    }

    pub async fn add_deal(&self, stage: StageId, input: NewDeal) -> ServiceResult<Deal> {
        Ok(self
            .request(|reply| Command::AddDeal {
                stage,
                input,
                reply,
            })
            .await??)
    }

    /// Handle whose service has already stopped.
    #[cfg(test)]
    pub(crate) fn closed() -> Self {
        let (tx, _) = mpsc::channel(1);
        Self { tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> ServiceResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }
}

async fn run(mut board: PipelineBoard, mut rx: mpsc::Receiver<Command>) {
    info!(
        stages = board.stages().len(),
        deals = board.deal_count(),
        "board service started"
    );
    while let Some(command) = rx.recv().await {
        debug!(command = command.name(), "applying board command");
        // a dropped reply receiver only means the caller went away
        match command {
            Command::Ping { reply } => {
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(board.clone());
            }
            Command::MoveDeal { deal, stage, reply } => {
                let _ = reply.send(apply_move(&mut board, &deal, &stage));
            }
            Command::AddStage { name, reply } => {
                let _ = reply.send(board.add_stage(&name).cloned());
            }
            Command::RemoveStage { id, reply } => {
                let _ = reply.send(board.remove_stage(&id));
            }
            Command::AddDeal {
                stage,
                input,
                reply,
            } => {
                let _ = reply.send(board.add_deal(&stage, input).cloned());
            }
        }
    }
    info!("board service stopped");
}

fn apply_move(
    board: &mut PipelineBoard,
    deal: &DealId,
    stage: &StageId,
) -> Result<MoveReceipt, BoardError> {
    let outcome = board.move_deal(deal, stage)?;
    let (owner, current) = board
        .deal(deal)
        .ok_or_else(|| BoardError::DealNotFound(deal.clone()))?;
    Ok(MoveReceipt {
        outcome,
        stage: owner.id.clone(),
        deal: current.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commands_apply_in_order() {
        let handle = BoardHandle::spawn(PipelineBoard::demo(), 4);
        let nurture = handle.add_stage("Nurture".into()).await.unwrap();
        let receipt = handle
            .move_deal(DealId::new("deal1"), nurture.id.clone())
            .await
            .unwrap();
        assert!(receipt.outcome.is_moved());
        assert_eq!(receipt.stage, nurture.id);
        assert_eq!(receipt.deal.probability, 50);

        let board = handle.snapshot().await.unwrap();
        assert_eq!(board.deal_count(), 6);
        assert_eq!(board.stage(&nurture.id).unwrap().deal_count(), 1);
    }

    #[tokio::test]
    async fn board_errors_pass_through() {
        let handle = BoardHandle::spawn(PipelineBoard::demo(), 4);
        let err = handle.remove_stage(StageId::new("1")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Board(BoardError::PreconditionFailed { deals: 2, .. })
        ));
        let err = handle
            .move_deal(DealId::new("unknown-id"), StageId::new("2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Board(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn concurrent_moves_conserve_deals() {
        let handle = BoardHandle::spawn(PipelineBoard::demo(), 2);
        let mut tasks = Vec::new();
        for round in 0..24 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let deal = DealId::new(format!("deal{}", round % 6 + 1));
                let stage = StageId::new(format!("{}", round % 6 + 1));
                handle.move_deal(deal, stage).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let board = handle.snapshot().await.unwrap();
        assert_eq!(board.deal_count(), 6);
        for stage in board.stages() {
            assert!(stage.deals.iter().all(|deal| deal.stage == stage.name));
        }
    }

    #[tokio::test]
    async fn stopped_service_reports_closed() {
        let handle = BoardHandle::closed();
        assert!(matches!(handle.snapshot().await, Err(ServiceError::Closed)));
        assert!(matches!(handle.ping().await, Err(ServiceError::Closed)));
    }

    #[tokio::test]
    async fn ping_answers_while_running() {
        let handle = BoardHandle::spawn(PipelineBoard::demo(), 1);
        handle.ping().await.unwrap();
        handle.add_stage("Nurture".into()).await.unwrap();
        handle.ping().await.unwrap();
    }
}
