//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Image Search API",
        version = "0.1.0",
        description = "Image embeddings and natural language image search over Azure AI services",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_image_search::ImageSearchApiDoc)
    ),
    tags(
        (name = "Image Search", description = "Image embeddings and natural language image search")
    )
)]
pub struct ApiDoc;
