//! Seam to the sandboxed compile engine.
//!
//! The engine itself is an external collaborator; this module only fixes the
//! calling contract and the fault taxonomy the orchestrator depends on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::compile::{BuildId, CompileRequest, OutputFile, ProjectId};
use crate::domain::sync::{OutputLocation, SourceLocation};
use crate::domain::wordcount::WordCountReport;

/// Everything a finished engine run hands back.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub output_files: Vec<OutputFile>,
    pub stats: Option<serde_json::Value>,
    pub timings: Option<serde_json::Value>,
}

/// Engine faults, as tagged variants with named fields. A timeout flag or a
/// partial build id is part of the variant, never a property bolted onto a
/// generic error afterwards.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("{message}")]
    Failed {
        message: String,
        build_id: Option<BuildId>,
    },
    #[error("{message}")]
    Timeout {
        message: String,
        build_id: Option<BuildId>,
    },
    #[error("{what} not found")]
    NotFound { what: &'static str },
}

impl EngineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            build_id: None,
        }
    }
}

#[async_trait]
pub trait CompileEngine: Send + Sync {
    /// Run one compile attempt. The orchestrator stamps the attempt with
    /// `build_id` before invocation so artifacts and log lines correlate even
    /// when the engine fails mid-run.
    async fn compile(
        &self,
        request: &CompileRequest,
        build_id: &BuildId,
    ) -> Result<EngineOutput, EngineError>;

    /// Map a source location to zero or more output locations in the
    /// project's last build.
    async fn sync_from_source(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &SourceLocation,
    ) -> Result<Vec<OutputLocation>, EngineError>;

    /// Map an output location back to zero or more source locations.
    async fn sync_from_output(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &OutputLocation,
    ) -> Result<Vec<SourceLocation>, EngineError>;

    /// Count words and related elements in one source file.
    async fn word_count(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        file: &str,
    ) -> Result<WordCountReport, EngineError>;
}
