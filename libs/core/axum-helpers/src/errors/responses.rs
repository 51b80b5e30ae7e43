//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Bad Request - malformed body or invalid field",
    content_type = "application/json",
    example = json!({
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "message": "max_images must be a positive integer"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Gateway - a downstream service failed",
    content_type = "application/json",
    example = json!({
        "code": 6001,
        "error": "UPSTREAM_ERROR",
        "message": "search index returned 503 Service Unavailable"
    })
)]
pub struct BadGatewayResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Gateway Timeout - a downstream service did not answer in time",
    content_type = "application/json",
    example = json!({
        "code": 6002,
        "error": "UPSTREAM_TIMEOUT",
        "message": "chat completion timed out"
    })
)]
pub struct GatewayTimeoutResponse(pub ErrorResponse);
