//! HTTP handlers for `/api/upsert`, `/api/delete` and `/api/search`.

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadGatewayResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        ServiceUnavailableResponse,
    },
};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::error::RecordingResult;
use crate::models::{
    ChannelFilter, DeleteRecordRequest, Record, RecordMetadata, SearchHit, SearchRequest,
};
use crate::service::RecordingService;

pub const TAG: &str = "recordings";

/// OpenAPI documentation for the Recordings API
#[derive(OpenApi)]
#[openapi(
    servers((url = "/api")),
    paths(upsert_record, delete_record, search_records),
    components(
        schemas(Record, RecordMetadata, SearchHit, DeleteRecordRequest, SearchRequest),
        responses(
            BadRequestValidationResponse,
            BadGatewayResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Recording indexing and similarity search")
    )
)]
pub struct ApiDoc;

/// Create the recordings router; mount it under `/api`.
pub fn router(service: Arc<RecordingService>) -> Router {
    Router::new()
        .route("/upsert", post(upsert_record))
        .route("/delete", post(delete_record))
        .route("/search", post(search_records))
        .with_state(service)
}

/// Queue a recording for indexing
///
/// Returns as soon as the job is queued; indexing happens asynchronously.
#[utoipa::path(
    post,
    path = "/upsert",
    tag = TAG,
    request_body = Record,
    responses(
        (status = 200, description = "Job queued", body = String, content_type = "text/plain"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn upsert_record(
    State(service): State<Arc<RecordingService>>,
    ValidatedJson(record): ValidatedJson<Record>,
) -> RecordingResult<&'static str> {
    service.enqueue_upsert(&record).await?;
    info!(id = %record.id, channel_id = %record.channel_id, "Upsert queued");
    Ok("OK")
}

/// Queue a recording for removal
///
/// Deleting an id that was never indexed succeeds.
#[utoipa::path(
    post,
    path = "/delete",
    tag = TAG,
    request_body = DeleteRecordRequest,
    responses(
        (status = 200, description = "Job queued", body = String, content_type = "text/plain"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_record(
    State(service): State<Arc<RecordingService>>,
    ValidatedJson(request): ValidatedJson<DeleteRecordRequest>,
) -> RecordingResult<&'static str> {
    service.enqueue_delete(&request.id).await?;
    info!(id = %request.id, "Delete queued");
    Ok("OK")
}

/// Similarity search over indexed recordings
#[utoipa::path(
    post,
    path = "/search",
    tag = TAG,
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Hits by descending score", body = Vec<SearchHit>),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_records(
    State(service): State<Arc<RecordingService>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> RecordingResult<Json<Vec<SearchHit>>> {
    let filter = ChannelFilter::from(request.subscribed_channel_ids);
    let hits = service.search(&request.content, &filter).await?;
    Ok(Json(hits))
}
