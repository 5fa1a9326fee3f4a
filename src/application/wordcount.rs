//! Word-count facade.

use std::sync::Arc;

use tracing::debug;

use crate::application::engine::{CompileEngine, EngineError};
use crate::domain::compile::ProjectId;
use crate::domain::wordcount::WordCountReport;

/// Forwards a word-count request for one source file to the engine and
/// relays the structured report. No orchestration-level state; engine
/// errors pass through unchanged.
pub struct WordCounter {
    engine: Arc<dyn CompileEngine>,
}

impl WordCounter {
    pub fn new(engine: Arc<dyn CompileEngine>) -> Self {
        Self { engine }
    }

    pub async fn word_count(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        file: &str,
    ) -> Result<WordCountReport, EngineError> {
        debug!(project = %project_id, file, "wordcount");
        self.engine.word_count(project_id, image_name, file).await
    }
}
