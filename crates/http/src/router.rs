//! Router builder for the LODGE HTTP server

use axum::{extract::Request, http::HeaderValue, middleware, routing::get, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{Timestamp, Uuid};

use lodge_kernel::ModuleRegistry;

use crate::request_id::scope_request_id;

/// Builder for the application router.
///
/// `Router::layer` only wraps routes that already exist, so add routes and
/// modules first and middleware last.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/api/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        self.router = self.router.nest(&format!("/api/{module_name}"), module_router);
        self
    }

    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Assign a UUIDv7 `x-request-id` to requests without one, echo it back,
    /// and use it as the `trace_id` of error bodies
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(middleware::from_fn(scope_request_id))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Serve the merged OpenAPI document at `/docs/openapi.json` and a
    /// Swagger UI at `/swagger-ui`
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry);

        let openapi_obj: utoipa::openapi::OpenApi =
            match serde_json::from_value(openapi_spec.clone()) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = %e, "merged OpenAPI document is invalid; serving a stub");
                    utoipa::openapi::OpenApiBuilder::new()
                        .info(
                            utoipa::openapi::InfoBuilder::new()
                                .title("LODGE API")
                                .version("1.0.0")
                                .build(),
                        )
                        .build()
                }
            };

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        self
    }

    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every module's OpenAPI fragment into one document, prefixing module
/// paths with their mount point.
pub fn merged_openapi(registry: &ModuleRegistry) -> Value {
    let mut openapi_spec = json!({
        "openapi": "3.0.0",
        "info": {
            "title": "LODGE API",
            "version": "1.0.0",
            "description": "Hotel booking API"
        },
        "paths": {
            "/healthz": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "error": {
                            "type": "object",
                            "properties": {
                                "code": { "type": "string" },
                                "message": { "type": "string" },
                                "details": { "type": "array", "items": {} },
                                "trace_id": { "type": "string" },
                                "timestamp": { "type": "string" }
                            },
                            "required": ["code", "message", "trace_id", "timestamp"]
                        }
                    },
                    "required": ["error"]
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(Value::as_object) {
            for (path, path_item) in paths {
                // "/" maps to the bare mount point
                let suffix = if path == "/" { "" } else { path.as_str() };
                let prefixed_path = format!("/api/{}{}", module.name(), suffix);
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(Value::as_object)
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

/// Request id generator producing time-ordered UUIDv7 values
#[derive(Clone, Copy)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode};
    use lodge_kernel::Module;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoModule;

    #[async_trait]
    impl Module for EchoModule {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn routes(&self) -> Router {
            Router::new().route("/", get(|| async { "echo" }))
        }

        fn openapi(&self) -> Option<Value> {
            Some(json!({
                "paths": { "/": { "get": { "summary": "Echo" } } },
                "components": { "schemas": { "Echo": { "type": "string" } } }
            }))
        }
    }

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn mounted_module_is_reachable() {
        let router = RouterBuilder::new()
            .mount_module("echo", EchoModule.routes())
            .build();

        let response = router.oneshot(get_request("/api/echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_id_is_generated_and_echoed() {
        let router = RouterBuilder::new()
            .route("/ping", get(|| async { "pong" }))
            .with_tracing()
            .with_cors()
            .with_request_id()
            .with_timeout(5000)
            .build();

        let response = router.oneshot(get_request("/ping")).await.unwrap();
        let request_id = response
            .headers()
            .get("x-request-id")
            .expect("request id header should be present")
            .to_str()
            .unwrap();

        assert_eq!(Uuid::parse_str(request_id).unwrap().get_version_num(), 7);
    }

    #[tokio::test]
    async fn error_trace_id_matches_request_id() {
        let router = RouterBuilder::new()
            .route(
                "/missing",
                get(|| async { crate::error::AppError::not_found("no such thing") }),
            )
            .with_request_id()
            .build();

        let response = router.oneshot(get_request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let request_id = response
            .headers()
            .get("x-request-id")
            .expect("request id header should be present")
            .to_str()
            .unwrap()
            .to_string();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: crate::error::ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.trace_id, request_id);
    }

    #[test]
    fn openapi_fragments_are_prefixed_and_merged() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(EchoModule)).unwrap();

        let doc = merged_openapi(&registry);

        assert_eq!(doc["paths"]["/api/echo"]["get"]["summary"], "Echo");
        assert!(doc["paths"]["/healthz"].is_object());
        assert_eq!(doc["components"]["schemas"]["Echo"]["type"], "string");
        assert!(doc["components"]["schemas"]["ErrorResponse"].is_object());
    }
}
