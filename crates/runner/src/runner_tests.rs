// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcheck_core::parse_participant_id;
use std::path::PathBuf;

#[tokio::test]
async fn dry_run_is_deterministic_no_blocker_pass() {
    let runner = ParticipantRunner::new(true);
    let participant = parse_participant_id("claude#author").expect("parses");
    let req = RunRequest {
        participant: &participant,
        prompt: "do the thing".to_string(),
        cwd: &PathBuf::from("."),
        timeout: Duration::from_secs(5),
        timeout_retries: 0,
        model: None,
        model_params: vec![],
        claude_team_agents: false,
        codex_multi_agents: false,
    };
    let outcome = runner.run(req).await.expect("dry run never fails");
    assert_eq!(outcome.verdict, ReviewVerdict::NoBlocker);
    assert_eq!(outcome.next_action, Some(NextAction::Pass));
    assert_eq!(outcome.returncode, 0);
}

#[tokio::test]
async fn missing_command_reports_not_found() {
    let mut runner = ParticipantRunner::new(false);
    runner.register_command(Provider::Gemini, vec!["definitely-not-a-real-binary".to_string()]);
    let participant = parse_participant_id("gemini#author").expect("parses");
    let req = RunRequest {
        participant: &participant,
        prompt: "hello".to_string(),
        cwd: &PathBuf::from("."),
        timeout: Duration::from_secs(2),
        timeout_retries: 0,
        model: None,
        model_params: vec![],
        claude_team_agents: false,
        codex_multi_agents: false,
    };
    let err = runner.run(req).await.expect_err("binary does not exist");
    assert_eq!(err.reason_class(), "command_not_found");
}

#[test]
fn clip_prompt_for_retry_marks_truncation() {
    let long = "x".repeat(RETRY_CLIP_CHARS + 50);
    let clipped = clip_prompt_for_retry(&long);
    assert!(clipped.contains("retry prompt clipped: 50 chars removed"));
}

#[test]
fn clip_prompt_for_retry_is_noop_under_budget() {
    let short = "short prompt";
    assert_eq!(clip_prompt_for_retry(short), short);
}
