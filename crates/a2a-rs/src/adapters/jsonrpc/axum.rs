use crate::adapters::jsonrpc::utils::{JsonResponse, parse_params};
use crate::errors::A2aServerError;
use crate::service::{A2aServiceLike, ServerCallContext};
use crate::types::{
    AgentCard, CustomJsonRpcPayload, CustomJsonrpcError, CustomJsonrpcResponse, JsonrpcRequest,
    SendStreamingMessageSuccessResponseResult,
};

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use http::{HeaderMap, Uri};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt as TokioStreamExt;
use tracing::{debug, info, warn};
use utoipa_axum::{router::OpenApiRouter, routes};

const API_VERSION_TAG: &str = "v1";

pub fn create_router<S: A2aServiceLike + Send + Sync + 'static>() -> OpenApiRouter<Arc<S>> {
    OpenApiRouter::new()
        .routes(routes!(json_rpc))
        .routes(routes!(agent_card))
        .routes(routes!(agent_card_v2))
}

macro_rules! require_call_context {
    ($uri:expr, $headers:expr) => {
        ServerCallContext {
            request_uri: $uri.clone(),
            headers: $headers.clone(),
        }
    };
}

async fn respond_agent_card<S: A2aServiceLike + Send + Sync + 'static>(
    ctx: Arc<S>,
    call_context: ServerCallContext,
) -> JsonResponse<AgentCard, A2aServerError> {
    info!("Received agent card request");
    JsonResponse::from(ctx.agent_card(call_context).await)
}

#[utoipa::path(
    get,
    path = "/.well-known/agent.json",
    tags = ["a2a", API_VERSION_TAG],
    responses(
        (status = 200, description = "Successful response", body = AgentCard),
        (status = 500, description = "Internal Server Error", body = CustomJsonrpcError),
    ),
    summary = "Get agent card",
    description = "Get the agent card describing agent capabilities and metadata",
    operation_id = "get-agent-card",
)]
async fn agent_card<S: A2aServiceLike + Send + Sync + 'static>(
    State(ctx): State<Arc<S>>,
    uri: Uri,
    headers: HeaderMap,
) -> JsonResponse<AgentCard, A2aServerError> {
    respond_agent_card(ctx, require_call_context!(uri, headers)).await
}

#[utoipa::path(
    get,
    path = "/.well-known/agent-card.json",
    tags = ["a2a", API_VERSION_TAG],
    responses(
        (status = 200, description = "Successful response", body = AgentCard),
        (status = 500, description = "Internal Server Error", body = CustomJsonrpcError),
    ),
    summary = "Get agent card",
    description = "Get the agent card from its current well-known location",
    operation_id = "get-agent-card-v2",
)]
async fn agent_card_v2<S: A2aServiceLike + Send + Sync + 'static>(
    State(ctx): State<Arc<S>>,
    uri: Uri,
    headers: HeaderMap,
) -> JsonResponse<AgentCard, A2aServerError> {
    respond_agent_card(ctx, require_call_context!(uri, headers)).await
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["a2a", API_VERSION_TAG],
    responses(
        (status = 200, description = "JSON-RPC response, or an SSE stream for message/stream"),
    ),
    summary = "Handle JSON-RPC",
    description = "Handle JSON-RPC requests for agent-to-agent communication (tasks, messages)",
    operation_id = "handle-jsonrpc-request",
)]
async fn json_rpc<S: A2aServiceLike + Send + Sync + 'static>(
    State(ctx): State<Arc<S>>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Json<JsonrpcRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected JSON-RPC body: {}", rejection);
            let error = A2aServerError::JsonParseError(crate::errors::Error::new(
                rejection.body_text(),
            ));
            return CustomJsonrpcResponse::<()>::new_err(None, error.into()).into_response();
        }
    };

    let call_context = require_call_context!(uri, headers);
    let handler = ctx.request_handler(&call_context);
    let id = body.id.clone();
    info!("Received JSON-RPC request: {}", body.method);

    macro_rules! respond {
        ($expr:expr) => {{
            let data = $expr.into();
            let res = CustomJsonrpcResponse::new(id.clone(), data);
            res.into_response()
        }};
    }

    match body.method.as_str() {
        "tasks/get" => respond!(match parse_params(body.params) {
            Ok(params) => handler.on_get_task(params, &call_context).await,
            Err(e) => Err(e),
        }),
        "tasks/cancel" => respond!(match parse_params(body.params) {
            Ok(params) => handler.on_cancel_task(params, &call_context).await,
            Err(e) => Err(e),
        }),
        "message/send" => respond!(match parse_params(body.params) {
            Ok(params) => handler.on_message_send(params, &call_context).await,
            Err(e) => Err(e),
        }),
        "message/stream" => {
            let params = match parse_params(body.params) {
                Ok(params) => params,
                Err(e) => {
                    return CustomJsonrpcResponse::<()>::new_err(id, e.into()).into_response();
                }
            };
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            let id_for_task = id.clone();

            tokio::spawn(async move {
                match handler.on_message_send_stream(params, &call_context).await {
                    Ok(mut stream) => {
                        while let Some(item) = stream.next().await {
                            if tx.send(item).is_err() {
                                debug!("Stream client went away");
                                break;
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                    }
                }
            });

            let stream = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);
            let stream = TokioStreamExt::map(stream, move |item| {
                let data: CustomJsonRpcPayload<SendStreamingMessageSuccessResponseResult> =
                    item.into();
                let res = CustomJsonrpcResponse::new(id_for_task.clone(), data);
                Event::default().json_data(res)
            });

            Sse::new(stream)
                .keep_alive(
                    KeepAlive::new()
                        .interval(Duration::from_secs(1))
                        .text("keep-alive"),
                )
                .into_response()
        }
        other => {
            info!("Received unknown method: {}", other);
            CustomJsonrpcResponse::<()>::new_err(id, A2aServerError::method_not_found(other).into())
                .into_response()
        }
    }
}
