use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::errors::responses::{
    BadGatewayResponse, BadRequestResponse, GatewayTimeoutResponse, InternalServerErrorResponse,
};
use axum_helpers::{ForwardedAuthorization, JsonBody};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ImageSearchResult;
use crate::models::{
    EventGridEvent, EventOutcome, SearchRequest, SearchResult, SkillMessage, SkillOutput,
    SkillOutputData, VectorizeRequest, VectorizeResponse,
};
use crate::service::ImageSearchService;

/// OpenAPI documentation for the image search API
#[derive(OpenApi)]
#[openapi(
    paths(vectorize, search, blob_created),
    components(
        schemas(
            VectorizeRequest,
            VectorizeResponse,
            SkillOutput,
            SkillOutputData,
            SkillMessage,
            SearchRequest,
            SearchResult,
            EventGridEvent,
            EventOutcome
        ),
        responses(
            BadRequestResponse,
            BadGatewayResponse,
            GatewayTimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Image Search", description = "Image embeddings and natural language image search")
    )
)]
pub struct ImageSearchApiDoc;

/// Domain routes with state applied.
///
/// Accepts the service or an already shared `Arc` when the caller needs it elsewhere.
pub fn router(service: impl Into<Arc<ImageSearchService>>) -> Router {
    let shared_service: Arc<ImageSearchService> = service.into();

    Router::new()
        .route("/vectorize", post(vectorize))
        .route("/GetImageEmbeddings", post(vectorize))
        .route("/search", post(search))
        .route("/events/blob-created", post(blob_created))
        .with_state(shared_service)
}

/// Embed a batch of custom skill records
///
/// Also served as `/GetImageEmbeddings`. Records that fail carry `errors`
/// and an empty `data`; the response always has one record per input.
#[utoipa::path(
    post,
    path = "/vectorize",
    tag = "Image Search",
    request_body = VectorizeRequest,
    responses(
        (status = 200, description = "One output record per input record", body = VectorizeResponse),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn vectorize(
    State(service): State<Arc<ImageSearchService>>,
    JsonBody(request): JsonBody<VectorizeRequest>,
) -> Json<VectorizeResponse> {
    let values = service.vectorize(request.values).await;
    Json(VectorizeResponse { values })
}

/// Natural language image search
#[utoipa::path(
    post,
    path = "/search",
    tag = "Image Search",
    request_body = SearchRequest,
    params(
        ("Authorization" = Option<String>, Header, description = "Forwarded to image downloads")
    ),
    responses(
        (status = 200, description = "Results by descending score", body = Vec<SearchResult>),
        (status = 400, response = BadRequestResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 504, response = GatewayTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search(
    State(service): State<Arc<ImageSearchService>>,
    authorization: ForwardedAuthorization,
    JsonBody(request): JsonBody<SearchRequest>,
) -> ImageSearchResult<Json<Vec<SearchResult>>> {
    let results = service.search(request, authorization.as_deref()).await?;
    Ok(Json(results))
}

/// Event Grid webhook for new blobs
#[utoipa::path(
    post,
    path = "/events/blob-created",
    tag = "Image Search",
    request_body = Vec<EventGridEvent>,
    responses(
        (status = 200, description = "Validation handshake or vectorized blobs", body = EventOutcome),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn blob_created(
    State(service): State<Arc<ImageSearchService>>,
    JsonBody(events): JsonBody<Vec<EventGridEvent>>,
) -> ImageSearchResult<Json<EventOutcome>> {
    let outcome = service.handle_blob_events(events).await?;
    Ok(Json(outcome))
}
