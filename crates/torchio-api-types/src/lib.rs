//! Wire types for the Torchio compile API.
//!
//! These structs define the exact serialized shape of requests and responses
//! exchanged with the service. Optional response fields use
//! `skip_serializing_if` where the wire contract omits them entirely;
//! `CompileBody::error` is deliberately *not* skipped because callers rely on
//! an explicit `null` for non-error statuses.

use serde::{Deserialize, Serialize};

/// Outcome taxonomy for one compile attempt. Exactly one per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileStatus {
    Success,
    Failure,
    Error,
    Unavailable,
    Timedout,
}

/// Compiler variants accepted by the compile endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    #[default]
    Pdflatex,
    Latex,
    Xelatex,
    Lualatex,
}

/// Request envelope for `POST /project/{project_id}/compile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileRequestEnvelope {
    pub compile: CompileRequestPayload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileRequestPayload {
    pub options: CompileOptionsPayload,
    pub root_resource_path: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptionsPayload {
    pub compiler: Option<Compiler>,
    pub image_name: Option<String>,
    pub draft: Option<bool>,
}

/// One entry of the output manifest: a produced artifact plus its
/// build-namespaced download URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFileEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub build: String,
    pub url: String,
}

/// Response envelope for the compile endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    pub compile: CompileBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileBody {
    pub status: CompileStatus,
    /// Engine or rejection message verbatim; `null` on non-error statuses.
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    pub output_url_prefix: String,
    pub output_files: Vec<OutputFileEntry>,
}

/// A position on a rendered output page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfPosition {
    pub page: u32,
    pub h: f64,
    pub v: f64,
}

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePosition {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Response for `GET /project/{project_id}/sync/code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFromCodeResponse {
    pub pdf: Vec<PdfPosition>,
}

/// Response for `GET /project/{project_id}/sync/pdf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFromPdfResponse {
    pub code: Vec<CodePosition>,
}

/// Structured counts for a single source file, as reported by the engine's
/// counting tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordCountReport {
    pub encode: String,
    pub text_words: u64,
    pub head_words: u64,
    pub outside: u64,
    pub headers: u64,
    pub elements: u64,
    pub math_inline: u64,
    pub math_display: u64,
    pub errors: u64,
    pub messages: String,
}

/// Response for `GET /project/{project_id}/wordcount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCountResponse {
    pub texcount: WordCountReport,
}
