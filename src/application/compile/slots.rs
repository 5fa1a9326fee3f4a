//! Per-project exclusive compile slots.
//!
//! The slot table is the only shared mutable resource in this core. A slot
//! is try-acquired before the engine is touched and released when the guard
//! drops, so every exit path including panics gives the slot back.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::domain::compile::ProjectId;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("too many concurrent compile requests")]
    AlreadyCompiling { project_id: ProjectId },
}

/// Tracks projects that currently have an in-flight compile.
#[derive(Default, Clone)]
pub struct ProjectSlots {
    projects: Arc<DashMap<ProjectId, ()>>,
}

impl ProjectSlots {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(DashMap::new()),
        }
    }

    /// Claim the project's slot, or reject immediately if it is held.
    /// Contenders are never queued; a rejected caller retries externally.
    pub fn acquire(&self, project_id: &ProjectId) -> Result<SlotGuard, SlotError> {
        use dashmap::mapref::entry::Entry;

        match self.projects.entry(project_id.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Ok(SlotGuard {
                    project_id: project_id.clone(),
                    projects: Arc::clone(&self.projects),
                })
            }
            Entry::Occupied(_) => Err(SlotError::AlreadyCompiling {
                project_id: project_id.clone(),
            }),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.projects.len()
    }
}

#[derive(Debug)]
pub struct SlotGuard {
    project_id: ProjectId,
    projects: Arc<DashMap<ProjectId, ()>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.projects.remove(&self.project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str) -> ProjectId {
        ProjectId::parse(id).expect("valid project id")
    }

    #[test]
    fn second_acquire_for_same_project_is_rejected() {
        let slots = ProjectSlots::new();
        let held = slots.acquire(&project("p1")).expect("first acquire");

        let rejected = slots.acquire(&project("p1"));
        assert!(matches!(
            rejected,
            Err(SlotError::AlreadyCompiling { .. })
        ));

        drop(held);
    }

    #[test]
    fn slot_is_released_when_guard_drops() {
        let slots = ProjectSlots::new();
        {
            let _guard = slots.acquire(&project("p1")).expect("acquire");
            assert_eq!(slots.in_flight(), 1);
        }
        assert_eq!(slots.in_flight(), 0);
        assert!(slots.acquire(&project("p1")).is_ok());
    }

    #[test]
    fn different_projects_do_not_contend() {
        let slots = ProjectSlots::new();
        let _a = slots.acquire(&project("p1")).expect("acquire p1");
        let _b = slots.acquire(&project("p2")).expect("acquire p2");
        assert_eq!(slots.in_flight(), 2);
    }

    #[test]
    fn rejection_message_is_descriptive() {
        let slots = ProjectSlots::new();
        let _held = slots.acquire(&project("p1")).expect("acquire");
        let err = slots.acquire(&project("p1")).expect_err("rejected");
        assert_eq!(err.to_string(), "too many concurrent compile requests");
    }
}
