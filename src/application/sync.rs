//! Bidirectional position mapping between source and rendered output.

use std::sync::Arc;

use tracing::debug;

use crate::application::engine::{CompileEngine, EngineError};
use crate::domain::compile::ProjectId;
use crate::domain::sync::{OutputLocation, SourceLocation};

/// Read-only queries against the engine's coordinate table for the
/// project's last build. Results are never cached here: the underlying
/// build can change between calls.
pub struct PositionMapper {
    engine: Arc<dyn CompileEngine>,
}

impl PositionMapper {
    pub fn new(engine: Arc<dyn CompileEngine>) -> Self {
        Self { engine }
    }

    /// Forward search: one source line may map to several rendered
    /// locations, e.g. wrapped text. An empty result means "no match at
    /// this position"; a missing build surfaces as [`EngineError::NotFound`].
    pub async fn source_to_output(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &SourceLocation,
    ) -> Result<Vec<OutputLocation>, EngineError> {
        debug!(project = %project_id, file = %location.file, line = location.line, "sync from code");
        self.engine
            .sync_from_source(project_id, image_name, location)
            .await
    }

    /// Inverse search from a rendered-output position.
    pub async fn output_to_source(
        &self,
        project_id: &ProjectId,
        image_name: Option<&str>,
        location: &OutputLocation,
    ) -> Result<Vec<SourceLocation>, EngineError> {
        debug!(project = %project_id, page = location.page, "sync from pdf");
        self.engine
            .sync_from_output(project_id, image_name, location)
            .await
    }
}
