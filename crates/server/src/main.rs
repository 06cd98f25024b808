use std::net::SocketAddr;

use axum::{
    extract::Multipart,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::error::ErrorReply;
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;

use config::load_settings;

#[derive(Debug, Deserialize)]
struct CreateFileRequest {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct CodeRequest {
    #[serde(default)]
    code: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "python".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let app = build_router();

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "action service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/api/hello", get(hello))
        .route("/create", post(create_file))
        .route("/upload", post(upload_file))
        .route("/analyze", post(analyze_code))
        .route("/optimize", post(optimize_code))
        .layer(CorsLayer::permissive())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "action service is running" }))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Standalone greeting stub; unrelated to the action endpoints.
async fn hello() -> Json<Value> {
    Json(json!({
        "message": "Hello from the action service",
        "timestamp": Utc::now().to_rfc3339(),
        "method": "GET",
        "status": 200,
    }))
}

async fn create_file(
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorReply>)> {
    if req.filename.trim().is_empty() {
        return Err(validation_error("filename is required"));
    }
    Ok(Json(json!({
        "status": "success",
        "action": "create",
        "filename": req.filename,
        "bytes": req.content.len(),
    })))
}

async fn upload_file(
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<ErrorReply>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty());
        let Some(filename) = filename else {
            return Err(validation_error("file is required"));
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| validation_error(e.to_string()))?;
        return Ok(Json(json!({
            "status": "success",
            "action": "upload",
            "filename": filename,
            "size": bytes.len(),
        })));
    }
    Err(validation_error("file is required"))
}

async fn analyze_code(
    Json(req): Json<CodeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorReply>)> {
    if req.code.is_empty() {
        return Err(validation_error("code is required"));
    }
    let lines = req.code.matches('\n').count() + 1;
    Ok(Json(json!({
        "status": "success",
        "action": "analyze",
        "language": req.language,
        "lines": lines,
    })))
}

async fn optimize_code(
    Json(req): Json<CodeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorReply>)> {
    if req.code.is_empty() {
        return Err(validation_error("code is required"));
    }
    Ok(Json(json!({
        "status": "success",
        "action": "optimize",
        "language": req.language,
        "optimized": true,
    })))
}

fn validation_error(message: impl Into<String>) -> (StatusCode, Json<ErrorReply>) {
    (StatusCode::BAD_REQUEST, Json(ErrorReply::new(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{header, Request},
    };
    use tower::ServiceExt;

    async fn send_json(uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    async fn send_multipart(parts: &[(&str, Option<&str>, &[u8])]) -> (StatusCode, Value) {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        for (name, filename, bytes) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn root_reports_the_service_is_running() {
        let request = Request::get("/").body(Body::empty()).expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body, json!({"message": "action service is running"}));
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let request = Request::get("/healthz")
            .body(Body::empty())
            .expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn create_reports_written_bytes() {
        let (status, body) = send_json(
            "/create",
            json!({"filename": "notes.txt", "content": "hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "action": "create",
                "filename": "notes.txt",
                "bytes": 5,
            })
        );
    }

    #[tokio::test]
    async fn create_requires_a_filename() {
        let (status, body) = send_json("/create", json!({"content": "hello"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "filename is required"}));
    }

    #[tokio::test]
    async fn analyze_counts_lines() {
        let (status, body) = send_json("/analyze", json!({"code": "a\nb\nc"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "action": "analyze",
                "language": "python",
                "lines": 3,
            })
        );
    }

    #[tokio::test]
    async fn analyze_requires_code() {
        let (status, body) = send_json("/analyze", json!({"language": "rust"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "code is required"}));
    }

    #[tokio::test]
    async fn optimize_echoes_the_language() {
        let (status, body) =
            send_json("/optimize", json!({"code": "fn main() {}", "language": "rust"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "action": "optimize",
                "language": "rust",
                "optimized": true,
            })
        );
    }

    #[tokio::test]
    async fn upload_accepts_a_multipart_file() {
        let (status, body) =
            send_multipart(&[("file", Some("report.bin"), b"payload-bytes")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "action": "upload",
                "filename": "report.bin",
                "size": 13,
            })
        );
    }

    #[tokio::test]
    async fn upload_without_a_file_part_is_rejected() {
        let (status, body) = send_multipart(&[("note", None, b"not a file")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "file is required"}));
    }

    #[tokio::test]
    async fn hello_returns_the_greeting_fields() {
        let request = Request::get("/api/hello")
            .body(Body::empty())
            .expect("request");
        let response = build_router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(body["method"], "GET");
        assert_eq!(body["status"], 200);
        assert!(body["message"].is_string());
        let timestamp = body["timestamp"].as_str().expect("timestamp");
        chrono::DateTime::parse_from_rfc3339(timestamp).expect("rfc3339 timestamp");
    }
}
