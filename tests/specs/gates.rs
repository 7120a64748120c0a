//! Gate review: retries, verdicts, exhaustion, shell-verify.

use crate::prelude::*;
use px_engine::ExecutionRequest;

fn gated_start() -> ExecutionRequest {
    let mut request = ExecutionRequest::from_command(">>pipeline topic=\"graphs\"");
    request.quality_gates = vec!["sources-must-be-official".to_string()];
    request
}

fn gated_resume(chain_id: &str, response: &str) -> ExecutionRequest {
    ExecutionRequest::resume(chain_id, response)
}

#[tokio::test]
async fn failing_gate_repeats_the_step_with_hints() {
    let fx = fixture();
    let first = run(&fx, gated_start()).await;
    let chain_id = chain_id_of(&first);

    let retry = run(&fx, gated_resume(&chain_id, "no links in sight")).await;
    assert!(!retry.is_error);
    assert_eq!(retry.metadata["pending_review"], true);
    let hints = retry.metadata["improvement_hints"].as_array().unwrap();
    assert!(hints
        .iter()
        .any(|h| h.as_str().unwrap().contains("official documentation")));
    // The step-1 prompt is repeated for the retry
    assert!(retry.first_text().contains("Clarify the task: graphs"));
    // And the chain did not advance
    let blueprint = fx.engine.store().get_by_chain_id(&chain_id, true).unwrap();
    assert_eq!(blueprint.current_step, 1);
    assert!(blueprint.pending_review);
}

#[tokio::test]
async fn passing_output_clears_review_and_advances() {
    let fx = fixture();
    let first = run(&fx, gated_start()).await;
    let chain_id = chain_id_of(&first);

    let ok = run(
        &fx,
        gated_resume(&chain_id, "see https://docs.example.org/spec"),
    )
    .await;
    assert!(!ok.is_error);
    assert!(ok.metadata.get("pending_review").is_none());
    assert_eq!(
        fx.engine
            .store()
            .get_by_chain_id(&chain_id, true)
            .unwrap()
            .current_step,
        2
    );
}

#[tokio::test]
async fn two_retries_then_the_resolved_gate_action() {
    let fx = fixture();
    let first = run(&fx, gated_start()).await;
    let chain_id = chain_id_of(&first);

    let retry1 = run(&fx, gated_resume(&chain_id, "nope")).await;
    assert_eq!(retry1.metadata["review_attempt"], 1);
    let retry2 = run(&fx, gated_resume(&chain_id, "still nope")).await;
    assert_eq!(retry2.metadata["review_attempt"], 2);

    // Third failing attempt: absent gate_action resolves to abort
    let terminal = run(&fx, gated_resume(&chain_id, "never")).await;
    assert!(terminal.is_error);
    assert_eq!(terminal.metadata["gate_action"], "abort");
    assert!(fx.engine.store().get_by_chain_id(&chain_id, true).is_none());
}

#[tokio::test]
async fn gate_verdict_text_overrides_engine_evaluation() {
    let fx = fixture();
    let first = run(&fx, gated_start()).await;
    let chain_id = chain_id_of(&first);

    let mut resume = gated_resume(&chain_id, "no links but externally approved");
    resume.gate_verdict = Some("GATE_REVIEW: PASS - verified by hand".to_string());
    let response = run(&fx, resume).await;
    assert!(!response.is_error);
    assert_eq!(
        fx.engine
            .store()
            .get_by_chain_id(&chain_id, true)
            .unwrap()
            .current_step,
        2
    );

    let mut fail = gated_resume(&chain_id, "see https://docs.example.org");
    fail.gate_verdict = Some("GATE_REVIEW: FAIL - sources are unofficial".to_string());
    let failed = run(&fx, fail).await;
    assert_eq!(failed.metadata["pending_review"], true);
    assert!(failed.metadata["improvement_hints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|h| h.as_str().unwrap().contains("unofficial")));
}

#[tokio::test]
async fn shell_verify_gate_passes_on_exit_zero() {
    let fx = fixture();
    let first = run_command(&fx, "::ok: $(true) >>pipeline topic=\"x\"").await;
    let chain_id = chain_id_of(&first);
    let response = run(&fx, gated_resume(&chain_id, "anything")).await;
    assert!(!response.is_error);
    assert!(response.metadata.get("pending_review").is_none());
}

#[tokio::test]
async fn shell_verify_gate_fails_on_nonzero_exit() {
    let fx = fixture();
    let first = run_command(&fx, "::broken: $(false) >>pipeline topic=\"x\"").await;
    let chain_id = chain_id_of(&first);
    let response = run(&fx, gated_resume(&chain_id, "anything")).await;
    assert_eq!(response.metadata["pending_review"], true);
    assert!(response.metadata["failed_gates"]
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g == "broken"));
}
