use allocwatch_model::{AllocationView, Service};

/// Whether the allocation needs its orchestrator-run health checks polled.
///
/// True when the task group, or any task with a runtime state, declares a service whose
/// checks are run by the orchestrator. Absent data at any level counts as no match.
pub fn needs_health_watch(view: Option<&AllocationView>) -> bool {
    let Some(view) = view else {
        return false;
    };
    let managed = |s: &Service| s.provider.is_orchestrator_managed();

    view.group_services().iter().any(managed) || view.task_services().any(managed)
}
