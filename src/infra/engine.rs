//! HTTP adapter to the remote sandboxed compile engine.
//!
//! The engine runs in its own container fleet; this client only shapes
//! requests and maps transport faults onto [`EngineError`]. Its wire dialect
//! mirrors the service's own API so operators can chain instances.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::application::engine::{CompileEngine, EngineError, EngineOutput};
use crate::domain::compile::{BuildId, CompileRequest, OutputFile, ProjectId};
use crate::domain::sync::{OutputLocation, SourceLocation};
use crate::domain::wordcount::WordCountReport;

pub struct RemoteEngine {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompileDispatch<'a> {
    compile: &'a CompileRequest,
    build_id: &'a BuildId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompileReply {
    #[serde(default)]
    output_files: Vec<ReplyFile>,
    stats: Option<serde_json::Value>,
    timings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ReplyFile {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
    build: String,
}

#[derive(Debug, Deserialize)]
struct SyncCodeReply {
    pdf: Vec<OutputLocation>,
}

#[derive(Debug, Deserialize)]
struct SyncPdfReply {
    code: Vec<SourceLocation>,
}

#[derive(Debug, Deserialize)]
struct WordCountReply {
    texcount: WordCountReport,
}

#[derive(Debug, Deserialize)]
struct EngineFault {
    message: String,
}

impl RemoteEngine {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, project_id: &ProjectId, tail: &str) -> Result<Url, EngineError> {
        self.base_url
            .join(&format!("project/{project_id}/{tail}"))
            .map_err(|err| EngineError::failed(format!("invalid engine endpoint: {err}")))
    }

    async fn fault_from(response: reqwest::Response, what: &'static str) -> EngineError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return EngineError::NotFound { what };
        }
        let message = match response.json::<EngineFault>().await {
            Ok(fault) => fault.message,
            Err(_) => format!("engine returned {status}"),
        };
        EngineError::Failed {
            message,
            build_id: None,
        }
    }

    fn transport_fault(err: reqwest::Error, build_id: Option<BuildId>) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout {
                message: "engine request timed out".to_string(),
                build_id,
            }
        } else {
            EngineError::Failed {
                message: format!("engine request failed: {err}"),
                build_id,
            }
        }
    }
}

#[async_trait]
impl CompileEngine for RemoteEngine {
    async fn compile(
        &self,
        request: &CompileRequest,
        build_id: &BuildId,
    ) -> Result<EngineOutput, EngineError> {
        let url = self.endpoint(&request.project_id, "compile")?;
        let response = self
            .client
            .post(url)
            .json(&CompileDispatch {
                compile: request,
                build_id,
            })
            .send()
            .await
            .map_err(|err| Self::transport_fault(err, Some(build_id.clone())))?;

        if !response.status().is_success() {
            return Err(Self::fault_from(response, "project").await);
        }

        let reply: CompileReply = response
            .json()
            .await
            .map_err(|err| Self::transport_fault(err, Some(build_id.clone())))?;

        Ok(EngineOutput {
            output_files: reply
                .output_files
                .into_iter()
                .map(|file| OutputFile {
                    path: file.path,
                    kind: file.kind,
                    size: file.size,
                    build_id: BuildId::from(file.build),
                })
                .collect(),
            stats: reply.stats,
            timings: reply.timings,
        })
    }

    async fn sync_from_source(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &SourceLocation,
    ) -> Result<Vec<OutputLocation>, EngineError> {
        let url = self.endpoint(project_id, "sync/code")?;
        let mut query: Vec<(&str, String)> = vec![
            ("file", location.file.clone()),
            ("line", location.line.to_string()),
            ("column", location.column.to_string()),
        ];
        if let Some(image) = image_name {
            query.push(("imageName", image.to_string()));
        }

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        if !response.status().is_success() {
            return Err(Self::fault_from(response, "build").await);
        }

        let reply: SyncCodeReply = response
            .json()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        Ok(reply.pdf)
    }

    async fn sync_from_output(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &OutputLocation,
    ) -> Result<Vec<SourceLocation>, EngineError> {
        let url = self.endpoint(project_id, "sync/pdf")?;
        let mut query: Vec<(&str, String)> = vec![
            ("page", location.page.to_string()),
            ("h", location.h.to_string()),
            ("v", location.v.to_string()),
        ];
        if let Some(image) = image_name {
            query.push(("imageName", image.to_string()));
        }

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        if !response.status().is_success() {
            return Err(Self::fault_from(response, "build").await);
        }

        let reply: SyncPdfReply = response
            .json()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        Ok(reply.code)
    }

    async fn word_count(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        file: &str,
    ) -> Result<WordCountReport, EngineError> {
        let url = self.endpoint(project_id, "wordcount")?;
        let mut query: Vec<(&str, String)> = vec![("file", file.to_string())];
        if let Some(image) = image_name {
            query.push(("image", image.to_string()));
        }

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        if !response.status().is_success() {
            return Err(Self::fault_from(response, "file").await);
        }

        let reply: WordCountReply = response
            .json()
            .await
            .map_err(|err| Self::transport_fault(err, None))?;
        Ok(reply.texcount)
    }
}
