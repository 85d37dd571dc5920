mod pipeline;

use async_graphql::{Context, EmptySubscription, Object, Schema, SimpleObject};
use platform_api::ApiResult;
use serde::Serialize;
use tracing::instrument;

use crate::service::BoardHandle;

pub use pipeline::{PipelineMutation, PipelineQuery};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(board: BoardHandle) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(board)
        .finish()
}

/// SDL of the schema; needs no running board service.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> ApiResult<HealthPayload> {
        Ok(HealthPayload { ok: true })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> ApiResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    /// Snapshot of the board taken once for the whole selection.
    #[instrument(name = "graphql.pipeline", skip_all)]
    async fn pipeline(&self, ctx: &Context<'_>) -> async_graphql::Result<PipelineQuery> {
        PipelineQuery::load(ctx).await
    }
}

#[Object]
impl MutationRoot {
    async fn pipeline(&self) -> PipelineMutation {
        PipelineMutation
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{Request, Response, Variables};
    use products_pipeline::{Contact, ContactId, NewDeal, PipelineBoard, StageId};
    use serde_json::{Value, json};

    fn schema() -> SchemaType {
        build_schema(BoardHandle::spawn(PipelineBoard::demo(), 8))
    }

    async fn run(schema: &SchemaType, query: &str, vars: Value) -> Response {
        schema
            .execute(Request::new(query).variables(Variables::from_json(vars)))
            .await
    }

    fn error_code(response: &Response) -> Option<String> {
        let err = response.errors.first()?;
        let code = err.extensions.as_ref()?.get("code")?.clone();
        match code {
            async_graphql::Value::String(code) => Some(code),
            _ => None,
        }
    }

    #[tokio::test]
    async fn health_query_returns_ok() {
        let schema = schema();
        let response = schema.execute(Request::new("{ health { ok } }")).await;
        assert!(response.errors.is_empty());
        let body = response.data.into_json().unwrap();
        assert_eq!(body, json!({"health": {"ok": true}}));
    }

    #[tokio::test]
    async fn pipeline_lists_demo_stages_and_summary() {
        let schema = schema();
        let query = r#"
            query Board {
                pipeline {
                    stages { id name dealCount totalValue deals { id probability } }
                    summary { dealCount totalValue weightedValue averageDealSize }
                }
            }
        "#;
        let response = run(&schema, query, json!({})).await;
        assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
        let body = response.data.into_json().unwrap();
        let stages = body["pipeline"]["stages"].as_array().cloned().unwrap();
        assert_eq!(stages.len(), 6);
        assert_eq!(stages[0]["name"], "Lead");
        assert_eq!(stages[0]["dealCount"], 2);
        assert_eq!(stages[0]["totalValue"], 70_000.0);
        assert_eq!(stages[5]["deals"], json!([]));

        let summary = &body["pipeline"]["summary"];
        assert_eq!(summary["dealCount"], 6);
        assert_eq!(summary["totalValue"], 395_000.0);
        assert_eq!(summary["weightedValue"], 253_750.0);
    }

    #[tokio::test]
    async fn move_deal_recomputes_probability() {
        let schema = schema();
        let mutation = r#"
            mutation Move($deal: ID!, $stage: ID!) {
                pipeline {
                    moveDeal(dealId: $deal, stageId: $stage) {
                        moved fromStage toStage
                        deal { id stage probability }
                    }
                }
            }
        "#;
        let response = run(&schema, mutation, json!({"deal": "deal1", "stage": "4"})).await;
        assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
        let body = response.data.into_json().unwrap();
        let payload = &body["pipeline"]["moveDeal"];
        assert_eq!(payload["moved"], true);
        assert_eq!(payload["fromStage"], "1");
        assert_eq!(payload["toStage"], "4");
        assert_eq!(payload["deal"]["stage"], "Negotiation");
        assert_eq!(payload["deal"]["probability"], 80);

        let again = run(&schema, mutation, json!({"deal": "deal1", "stage": "4"})).await;
        let body = again.data.into_json().unwrap();
        assert_eq!(body["pipeline"]["moveDeal"]["moved"], false);
        assert_eq!(body["pipeline"]["moveDeal"]["fromStage"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_deal_reports_not_found() {
        let schema = schema();
        let mutation = r#"
            mutation { pipeline { moveDeal(dealId: "unknown-id", stageId: "2") { moved } } }
        "#;
        let response = run(&schema, mutation, json!({})).await;
        assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));

        let summary = run(&schema, "{ pipeline { summary { dealCount } } }", json!({})).await;
        let body = summary.data.into_json().unwrap();
        assert_eq!(body["pipeline"]["summary"]["dealCount"], 6);
    }

    #[tokio::test]
    async fn stage_lifecycle_through_mutations() {
        let schema = schema();
        let refused = run(
            &schema,
            r#"mutation { pipeline { removeStage(id: "1") { id } } }"#,
            json!({}),
        )
        .await;
        assert_eq!(error_code(&refused).as_deref(), Some("PRECONDITION_FAILED"));

        let blank = run(
            &schema,
            r#"mutation { pipeline { addStage(name: "   ") { id } } }"#,
            json!({}),
        )
        .await;
        assert_eq!(error_code(&blank).as_deref(), Some("INVALID_INPUT"));

        let added = run(
            &schema,
            r#"mutation { pipeline { addStage(name: "Nurture") { id name color dealCount } } }"#,
            json!({}),
        )
        .await;
        assert!(added.errors.is_empty(), "errors: {:?}", added.errors);
        let body = added.data.into_json().unwrap();
        let stage = &body["pipeline"]["addStage"];
        assert_eq!(stage["name"], "Nurture");
        assert_eq!(stage["color"], "bg-gray-500");
        assert_eq!(stage["dealCount"], 0);

        let removed = run(
            &schema,
            "mutation Remove($id: ID!) { pipeline { removeStage(id: $id) { name } } }",
            json!({"id": stage["id"].clone()}),
        )
        .await;
        assert!(removed.errors.is_empty(), "errors: {:?}", removed.errors);
    }

    #[tokio::test]
    async fn add_deal_lands_at_end_of_stage() {
        let schema = schema();
        let mutation = r#"
            mutation Add($input: NewDealInput!) {
                pipeline { addDeal(input: $input) { id stage probability dueDate contact { company } } }
            }
        "#;
        let input = json!({
            "input": {
                "stageId": "6",
                "title": "Renewal",
                "value": 5000.0,
                "contact": { "id": "7", "name": "Ada", "company": "Initech" },
                "dueDate": "2024-02-01"
            }
        });
        let response = run(&schema, mutation, input).await;
        assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
        let body = response.data.into_json().unwrap();
        let deal = &body["pipeline"]["addDeal"];
        assert_eq!(deal["stage"], "Closed Lost");
        assert_eq!(deal["probability"], 0);
        assert_eq!(deal["dueDate"], "2024-02-01");
        assert_eq!(deal["contact"]["company"], "Initech");

        let refused = run(&schema, mutation, input_with_value(1.0e308)).await;
        assert_eq!(error_code(&refused).as_deref(), Some("INVALID_INPUT"));
    }

    fn input_with_value(value: f64) -> Value {
        json!({
            "input": {
                "stageId": "1",
                "title": "Deal",
                "value": value,
                "contact": { "id": "7", "name": "Ada", "company": "Initech" }
            }
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn combined_read_sees_a_single_board_state() {
        let handle = BoardHandle::spawn(PipelineBoard::demo(), 8);
        let schema = build_schema(handle.clone());
        let writer = tokio::spawn(async move {
            for n in 0..300 {
                let contact = Contact {
                    id: ContactId::new("7"),
                    name: "Ada".into(),
                    company: "Initech".into(),
                };
                let stage = StageId::new(format!("{}", n % 6 + 1));
                handle
                    .add_deal(stage, NewDeal::new(format!("Deal {n}"), 100.0, contact))
                    .await
                    .unwrap();
            }
        });

        let query = "{ pipeline { stages { dealCount } summary { dealCount } } }";
        for _ in 0..300 {
            let response = schema.execute(query).await;
            assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
            let body = response.data.into_json().unwrap();
            let per_stage: i64 = body["pipeline"]["stages"]
                .as_array()
                .unwrap()
                .iter()
                .map(|stage| stage["dealCount"].as_i64().unwrap())
                .sum();
            assert_eq!(
                per_stage,
                body["pipeline"]["summary"]["dealCount"].as_i64().unwrap()
            );
        }
        writer.await.unwrap();

        let body = schema
            .execute(query)
            .await
            .data
            .into_json()
            .unwrap();
        assert_eq!(body["pipeline"]["summary"]["dealCount"], 306);
    }

    #[tokio::test]
    async fn probability_lookup_is_exposed() {
        let schema = schema();
        let response = run(
            &schema,
            r#"{ pipeline { won: probabilityForStage(name: "Closed Won") custom: probabilityForStage(name: "Nurture") } }"#,
            json!({}),
        )
        .await;
        let body = response.data.into_json().unwrap();
        assert_eq!(body["pipeline"], json!({"won": 100, "custom": 50}));
    }

    #[test]
    fn sdl_lists_pipeline_operations() {
        let sdl = sdl();
        for needle in ["moveDeal", "addStage", "removeStage", "weightedValue", "averageDealSize"] {
            assert!(sdl.contains(needle), "missing {needle}");
        }
    }
}
