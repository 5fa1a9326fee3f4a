//! Mapping between domain results and the wire types in `torchio-api-types`.

use torchio_api_types as api;

use crate::application::compile::{CompileSummary, ManifestEntry};
use crate::application::engine::EngineError;
use crate::domain::compile::{
    CompileOptions, CompileRequest, CompileStatus, ProjectId, TexCompiler,
};
use crate::domain::sync::{OutputLocation, SourceLocation};
use crate::domain::wordcount::WordCountReport;

use super::error::ApiError;

pub fn request_from_payload(
    project_id: ProjectId,
    payload: api::CompileRequestPayload,
) -> CompileRequest {
    CompileRequest {
        project_id,
        user_id: payload.user_id,
        root_resource_path: payload.root_resource_path,
        options: CompileOptions {
            compiler: payload
                .options
                .compiler
                .map(compiler_from_api)
                .unwrap_or_default(),
            image_name: payload.options.image_name,
            draft: payload.options.draft.unwrap_or(false),
        },
    }
}

fn compiler_from_api(compiler: api::Compiler) -> TexCompiler {
    match compiler {
        api::Compiler::Pdflatex => TexCompiler::Pdflatex,
        api::Compiler::Latex => TexCompiler::Latex,
        api::Compiler::Xelatex => TexCompiler::Xelatex,
        api::Compiler::Lualatex => TexCompiler::Lualatex,
    }
}

pub fn status_to_api(status: CompileStatus) -> api::CompileStatus {
    match status {
        CompileStatus::Success => api::CompileStatus::Success,
        CompileStatus::Failure => api::CompileStatus::Failure,
        CompileStatus::Error => api::CompileStatus::Error,
        CompileStatus::Unavailable => api::CompileStatus::Unavailable,
        CompileStatus::Timedout => api::CompileStatus::Timedout,
    }
}

fn entry_to_api(entry: ManifestEntry) -> api::OutputFileEntry {
    api::OutputFileEntry {
        path: entry.file.path,
        kind: entry.file.kind,
        size: entry.file.size,
        build: entry.file.build_id.to_string(),
        url: entry.url,
    }
}

pub fn summary_to_api(summary: CompileSummary, output_url_prefix: String) -> api::CompileResponse {
    api::CompileResponse {
        compile: api::CompileBody {
            status: status_to_api(summary.status),
            error: summary.error,
            stats: summary.stats,
            timings: summary.timings,
            build_id: summary.build_id.map(|id| id.to_string()),
            output_url_prefix,
            output_files: summary.output_files.into_iter().map(entry_to_api).collect(),
        },
    }
}

pub fn pdf_position_to_api(location: OutputLocation) -> api::PdfPosition {
    api::PdfPosition {
        page: location.page,
        h: location.h,
        v: location.v,
    }
}

pub fn code_position_to_api(location: SourceLocation) -> api::CodePosition {
    api::CodePosition {
        file: location.file,
        line: location.line,
        column: location.column,
    }
}

pub fn report_to_api(report: WordCountReport) -> api::WordCountReport {
    api::WordCountReport {
        encode: report.encode,
        text_words: report.text_words,
        head_words: report.head_words,
        outside: report.outside,
        headers: report.headers,
        elements: report.elements,
        math_inline: report.math_inline,
        math_display: report.math_display,
        errors: report.errors,
        messages: report.messages,
    }
}

/// Map an engine fault on a query endpoint to a consistent HTTP error.
/// "No build exists yet" stays distinguishable from an empty result.
pub fn engine_to_api(err: EngineError) -> ApiError {
    match err {
        EngineError::NotFound { what: "build" } => ApiError::not_found("no build found"),
        EngineError::NotFound { what: "file" } => ApiError::not_found("file not found"),
        EngineError::NotFound { .. } => ApiError::not_found("resource not found"),
        EngineError::Failed { message, .. } | EngineError::Timeout { message, .. } => {
            ApiError::engine(message)
        }
    }
}
