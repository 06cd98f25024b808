use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    domain::{Action, FieldValue, FormSubmission},
    error::ErrorReply,
};
use thiserror::Error;
use tracing::debug;

pub mod workflow;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Service { message: String },
    /// The request never completed: connect, send, or body transfer failed.
    #[error("Connection error: {message}")]
    Transport { message: String },
}

/// Seam between the workflow controller and the remote action service.
#[async_trait]
pub trait ActionService: Send + Sync {
    async fn submit(
        &self,
        action: Action,
        submission: FormSubmission,
    ) -> Result<Value, SubmitError>;
}

/// HTTP client for the remote action service. One POST per submit call,
/// no retries and no timeout beyond what the transport provides.
pub struct HttpActionService {
    http: Client,
    base_url: String,
}

impl HttpActionService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ActionService for HttpActionService {
    async fn submit(
        &self,
        action: Action,
        submission: FormSubmission,
    ) -> Result<Value, SubmitError> {
        let url = format!("{}/{}", self.base_url, action.endpoint());
        debug!(%url, ?action, fields = submission.len(), "submitting action request");

        let request = self.http.post(&url);
        let request = match action {
            Action::UploadFile => request.multipart(multipart_form(submission)),
            _ => request.json(&json_body(&submission)),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return response.json::<Value>().await.map_err(transport_error);
        }

        let message = match response.json::<ErrorReply>().await {
            Ok(reply) if !reply.error.is_empty() => reply.error,
            _ => format!("request failed with status {status}"),
        };
        Err(SubmitError::Service { message })
    }
}

fn transport_error(error: reqwest::Error) -> SubmitError {
    SubmitError::Transport {
        message: error.to_string(),
    }
}

fn json_body(submission: &FormSubmission) -> Value {
    let mut body = serde_json::Map::new();
    for (name, value) in submission.iter() {
        match value {
            FieldValue::Text(text) => {
                body.insert(name.to_string(), Value::String(text.clone()));
            }
            FieldValue::File(_) => {
                // Binary fields have no JSON encoding; the service reports
                // the missing field itself.
                debug!(field = name, "dropping binary field from json submission");
            }
        }
    }
    Value::Object(body)
}

fn multipart_form(submission: FormSubmission) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in submission {
        match value {
            FieldValue::Text(text) => {
                form = form.text(name, text);
            }
            FieldValue::File(upload) => {
                let part = reqwest::multipart::Part::bytes(upload.bytes)
                    .file_name(upload.filename);
                form = form.part(name, part);
            }
        }
    }
    form
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
