//! In-memory recently-used project table.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::activity::{ActivityError, ProjectActivity};
use crate::domain::compile::ProjectId;

/// Records when each project last dispatched a compile. Single-process
/// bookkeeping only; a persistent implementation lives behind the same
/// trait in the storage layer.
#[derive(Default, Clone)]
pub struct RecentProjects {
    accessed: Arc<DashMap<ProjectId, Instant>>,
}

impl RecentProjects {
    pub fn new() -> Self {
        Self {
            accessed: Arc::new(DashMap::new()),
        }
    }

    pub fn last_accessed(&self, project_id: &ProjectId) -> Option<Instant> {
        self.accessed.get(project_id).map(|entry| *entry.value())
    }

    pub fn tracked(&self) -> usize {
        self.accessed.len()
    }
}

#[async_trait]
impl ProjectActivity for RecentProjects {
    async fn mark_project_accessed(&self, project_id: &ProjectId) -> Result<(), ActivityError> {
        self.accessed.insert(project_id.clone(), Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marking_updates_the_access_time() {
        let projects = RecentProjects::new();
        let id = ProjectId::parse("p1").expect("valid id");

        assert!(projects.last_accessed(&id).is_none());
        projects.mark_project_accessed(&id).await.expect("mark");
        let first = projects.last_accessed(&id).expect("tracked");

        projects.mark_project_accessed(&id).await.expect("re-mark");
        let second = projects.last_accessed(&id).expect("still tracked");
        assert!(second >= first);
        assert_eq!(projects.tracked(), 1);
    }
}
