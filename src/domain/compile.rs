//! Identifiers and value types for one compile attempt.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

/// Identifier of a project whose source can be compiled.
///
/// Project ids arrive over the wire; [`ProjectId::parse`] rejects anything
/// that could escape the `/project/{id}/build/{build}/output/{path}` URL
/// namespace the manifest builder derives from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("project id must not be empty"));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::validation(format!(
                "project id `{raw}` contains characters outside [A-Za-z0-9_-]"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier tying output artifacts to the compile attempt that produced
/// them. Every admitted attempt gets a fresh one, so artifacts from an older
/// build are never served under a newer build's URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BuildId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Compiler variants the engine understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TexCompiler {
    #[default]
    Pdflatex,
    Latex,
    Xelatex,
    Lualatex,
}

/// Engine-facing options of a compile request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub compiler: TexCompiler,
    pub image_name: Option<String>,
    pub draft: bool,
}

/// A fully-typed compile request. Immutable once constructed; one per
/// incoming call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub project_id: ProjectId,
    pub user_id: Option<String>,
    pub root_resource_path: Option<String>,
    pub options: CompileOptions,
}

impl CompileRequest {
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            user_id: None,
            root_resource_path: None,
            options: CompileOptions::default(),
        }
    }
}

/// Status taxonomy for one compile attempt. Exactly one per attempt, never
/// combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileStatus {
    Success,
    Failure,
    Error,
    Unavailable,
    Timedout,
}

impl CompileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileStatus::Success => "success",
            CompileStatus::Failure => "failure",
            CompileStatus::Error => "error",
            CompileStatus::Unavailable => "unavailable",
            CompileStatus::Timedout => "timedout",
        }
    }
}

/// One artifact produced by a compile attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    /// Relative artifact name, e.g. `output.pdf`.
    pub path: String,
    /// Coarse kind tag derived from the artifact, e.g. `pdf`, `log`.
    pub kind: String,
    /// Byte length when known.
    pub size: Option<u64>,
    pub build_id: BuildId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_accepts_url_safe_names() {
        let id = ProjectId::parse("project-id-123").expect("valid id");
        assert_eq!(id.as_str(), "project-id-123");
    }

    #[test]
    fn project_id_rejects_path_traversal() {
        assert!(ProjectId::parse("../etc/passwd").is_err());
        assert!(ProjectId::parse("").is_err());
        assert!(ProjectId::parse("a/b").is_err());
    }

    #[test]
    fn build_ids_are_unique_per_attempt() {
        assert_ne!(BuildId::generate(), BuildId::generate());
    }
}
