//! Classification of a compile outcome into the status taxonomy.

use crate::application::engine::EngineOutput;
use crate::domain::compile::{BuildId, CompileStatus, OutputFile};

/// Artifact name reserved by the engine sandbox: a source tree can ship a
/// file under this name, but it is never a rendered result and must not be
/// served as one.
pub const FAKE_OUTPUT_PDF: &str = "fake_output.pdf";

/// Discriminated result of one compile attempt, before classification.
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Completed {
        output: EngineOutput,
        build_id: BuildId,
    },
    EngineError {
        message: String,
        build_id: Option<BuildId>,
        timed_out: bool,
    },
    /// Admission rejected the request; the engine was never invoked.
    Rejected { reason: String },
}

/// What the classifier decides about one outcome.
#[derive(Debug, Clone)]
pub struct Classification {
    pub status: CompileStatus,
    pub error: Option<String>,
    pub output_files: Vec<OutputFile>,
}

/// Map an outcome to exactly one status.
///
/// `failure` (the engine ran but produced no usable rendered output) is kept
/// distinct from `error` (the engine itself fell over) and `unavailable`
/// (the engine never ran), so callers can tell "fix the document" from
/// "retry later" apart.
pub fn classify(outcome: CompileOutcome) -> Classification {
    match outcome {
        CompileOutcome::Rejected { reason } => Classification {
            status: CompileStatus::Unavailable,
            error: Some(reason),
            output_files: Vec::new(),
        },
        CompileOutcome::EngineError {
            message,
            timed_out: true,
            ..
        } => Classification {
            status: CompileStatus::Timedout,
            error: Some(message),
            output_files: Vec::new(),
        },
        CompileOutcome::EngineError { message, .. } => Classification {
            status: CompileStatus::Error,
            error: Some(message),
            output_files: Vec::new(),
        },
        CompileOutcome::Completed { output, .. } => {
            let status = completed_status(&output.output_files);
            Classification {
                status,
                error: None,
                output_files: output.output_files,
            }
        }
    }
}

fn completed_status(output_files: &[OutputFile]) -> CompileStatus {
    let primary = output_files.iter().find(|file| file.path.ends_with(".pdf"));

    // Three distinct paths to `failure`; policies may diverge, keep them
    // separate.
    match primary {
        None => CompileStatus::Failure,
        Some(file) if file.path == FAKE_OUTPUT_PDF => CompileStatus::Failure,
        Some(file) if file.size == Some(0) => CompileStatus::Failure,
        Some(_) => CompileStatus::Success,
    }
}
