use super::*;
use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::test_support::sample_task;
use agentcheck_storage::InMemoryTaskRepository;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn harness(max_concurrent: usize) -> (TaskService, Arc<dyn TaskRepository>, TempDir) {
    let repository: Arc<dyn TaskRepository> = Arc::new(InMemoryTaskRepository::default());
    let artifact_root = TempDir::new().expect("tempdir");
    let artifacts = Arc::new(ArtifactStore::new(artifact_root.path()));
    let service = TaskService::new(repository.clone(), artifacts, max_concurrent);
    (service, repository, artifact_root)
}

fn request_for(workspace: &Path) -> CreateTaskRequest {
    CreateTaskRequest {
        title: "fix the bug".to_string(),
        description: "patch the thing".to_string(),
        author_participant: "claude#author".to_string(),
        reviewer_participants: vec!["codex#reviewer".to_string()],
        project_path: None,
        workspace_path: workspace.to_path_buf(),
        sandbox_mode: false,
        sandbox_path: None,
        sandbox_cleanup_on_pass: false,
        test_command: Some("true".to_string()),
        lint_command: Some("true".to_string()),
        max_rounds: 1,
        self_loop_mode: false,
        auto_merge: false,
        merge_target_path: None,
        repair_mode: "balanced".to_string(),
        debate_mode: false,
        plain_mode: true,
        stream_mode: false,
        evolution_level: 0,
        evolve_until: None,
        conversation_language: "en".to_string(),
        provider_models: Default::default(),
        provider_model_params: Default::default(),
        participant_models: Default::default(),
        participant_model_params: Default::default(),
        claude_team_agents: false,
        codex_multi_agents: false,
        claude_team_agents_overrides: Default::default(),
        codex_multi_agents_overrides: Default::default(),
    }
}

#[test]
fn create_task_persists_queued_row_with_fingerprint() {
    let (service, repository, _artifacts_root) = harness(4);
    let workspace = TempDir::new().expect("tempdir");
    let task = service
        .create_task("t-1", request_for(workspace.path()))
        .expect("creates task");

    assert_eq!(task.status, TaskStatus::Queued);
    assert!(task.workspace_fingerprint.is_some());
    let stored = repository.get_task(&task.task_id).expect("reads").expect("present");
    assert_eq!(stored.task_id, task.task_id);
}

#[test]
fn invalid_workspace_path_is_rejected_with_field_pointer() {
    let (service, _repository, _root) = harness(4);
    let mut request = request_for(Path::new("/tmp/sample-project"));
    request.workspace_path = PathBuf::from("/does/not/exist/anywhere");
    let err = service.create_task("t-2", request).unwrap_err();
    assert_eq!(err.field(), Some("workspace_path"));
}

#[test]
fn try_start_admits_queued_task_when_capacity_available() {
    let (service, _repository, _root) = harness(4);
    let workspace = TempDir::new().expect("tempdir");
    let task = service
        .create_task("t-3", request_for(workspace.path()))
        .expect("creates task");

    let started = service.try_start(&task.task_id).expect("starts");
    assert_eq!(started.status, TaskStatus::Running);
}

#[test]
fn try_start_leaves_task_queued_with_concurrency_limit_reason_when_full() {
    let (service, repository, _root) = harness(1);
    let workspace = TempDir::new().expect("tempdir");
    let running = sample_task("already-running");
    let mut running = running;
    running.status = TaskStatus::Running;
    repository.create_task(running).expect("seeds running task");

    let task = service
        .create_task("t-4", request_for(workspace.path()))
        .expect("creates task");
    let result = service.try_start(&task.task_id).expect("does not error");
    assert_eq!(result.status, TaskStatus::Queued);
    assert_eq!(result.last_gate_reason.as_deref(), Some("concurrency_limit"));
}

#[test]
fn try_start_is_a_no_op_for_non_queued_tasks() {
    let (service, repository, _root) = harness(4);
    let mut task = sample_task("already-passed");
    task.status = TaskStatus::Passed;
    repository.create_task(task.clone()).expect("seeds");

    let result = service.try_start(&task.task_id).expect("no-op");
    assert_eq!(result.status, TaskStatus::Passed);
}

#[test]
fn request_cancel_sets_sticky_flag() {
    let (service, repository, _root) = harness(4);
    let workspace = TempDir::new().expect("tempdir");
    let task = service
        .create_task("t-5", request_for(workspace.path()))
        .expect("creates task");

    service.request_cancel(&task.task_id).expect("cancels");
    assert!(repository.is_cancel_requested(&task.task_id).expect("reads"));
}

#[test]
fn get_task_reports_not_found_for_unknown_id() {
    let (service, _repository, _root) = harness(4);
    let err = service.get_task(&TaskId::new("missing")).unwrap_err();
    assert!(matches!(err, ServiceError::TaskNotFound(_)));
}
