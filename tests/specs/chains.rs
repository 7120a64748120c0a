//! Chain execution: start, resume, rehydration, completion.

use crate::prelude::*;
use px_engine::ExecutionRequest;

#[tokio::test]
async fn chain_start_asks_for_step_one_resume() {
    let fx = fixture();
    let response = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    assert!(!response.is_error, "{}", response.first_text());
    assert!(response.first_text().contains("Clarify the task: graphs"));
    let call_to_action = response.metadata["call_to_action"].as_str().unwrap();
    assert!(call_to_action.contains("user_response"));
    assert!(call_to_action.contains("clarify"));
    assert_eq!(response.metadata["current_step"], 1);
    assert_eq!(response.metadata["total_steps"], 3);
}

#[tokio::test]
async fn resume_renders_the_next_step() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);

    let second = run(&fx, ExecutionRequest::resume(chain_id, "the clarified task")).await;
    assert!(!second.is_error);
    assert!(second.first_text().contains("Plan using: the clarified task"));
}

#[tokio::test]
async fn response_only_rehydration_restores_command_and_plan_bit_identically() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);

    let stored_before = fx
        .engine
        .store()
        .get_by_chain_id(&chain_id, true)
        .unwrap();

    // A resume parses nothing; it must reconstruct the parsed command and
    // plan exactly as stored at chain start.
    let _second = run(&fx, ExecutionRequest::resume(chain_id.clone(), "output")).await;
    let stored_after = fx
        .engine
        .store()
        .get_by_chain_id(&chain_id, true)
        .unwrap();

    similar_asserts::assert_eq!(stored_before.parsed_command, stored_after.parsed_command);
    similar_asserts::assert_eq!(stored_before.execution_plan, stored_after.execution_plan);
}

#[tokio::test]
async fn each_resume_advances_current_step_once() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);
    assert_eq!(
        fx.engine
            .store()
            .get_by_chain_id(&chain_id, true)
            .unwrap()
            .current_step,
        1
    );

    run(&fx, ExecutionRequest::resume(chain_id.clone(), "one")).await;
    assert_eq!(
        fx.engine
            .store()
            .get_by_chain_id(&chain_id, true)
            .unwrap()
            .current_step,
        2
    );

    run(&fx, ExecutionRequest::resume(chain_id.clone(), "two")).await;
    assert_eq!(
        fx.engine
            .store()
            .get_by_chain_id(&chain_id, true)
            .unwrap()
            .current_step,
        3
    );
}

#[tokio::test]
async fn output_mapping_feeds_later_steps() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);

    run(&fx, ExecutionRequest::resume(chain_id.clone(), "clear question")).await;
    let third = run(&fx, ExecutionRequest::resume(chain_id.clone(), "a solid plan")).await;

    // Step 2's output travels through output_mapping { result: the_plan }
    assert!(third.first_text().contains("Implement: a solid plan"));

    let blueprint = fx.engine.store().get_by_chain_id(&chain_id, true).unwrap();
    assert_eq!(
        blueprint.variables.get("clarified").map(String::as_str),
        Some("clear question")
    );
    assert_eq!(
        blueprint.variables.get("the_plan").map(String::as_str),
        Some("a solid plan")
    );
}

#[tokio::test]
async fn finishing_the_chain_marks_completion_and_purges_next_touch() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);

    run(&fx, ExecutionRequest::resume(chain_id.clone(), "one")).await;
    run(&fx, ExecutionRequest::resume(chain_id.clone(), "two")).await;
    let done = run(&fx, ExecutionRequest::resume(chain_id.clone(), "three")).await;

    assert_eq!(done.metadata["chain_complete"], true);
    let blueprint = fx.engine.store().get_by_chain_id(&chain_id, true).unwrap();
    assert_eq!(blueprint.current_step, 4);
    assert!(blueprint.is_complete());

    let after = run(&fx, ExecutionRequest::resume(chain_id.clone(), "again")).await;
    assert!(after.is_error);
    assert!(fx.engine.store().get_by_chain_id(&chain_id, true).is_none());
}

#[tokio::test]
async fn force_restart_discards_cached_chain_state() {
    let fx = fixture();
    let first = run_command(&fx, ">>pipeline topic=\"graphs\"").await;
    let chain_id = chain_id_of(&first);
    run(&fx, ExecutionRequest::resume(chain_id.clone(), "one")).await;

    let mut restart = ExecutionRequest::from_command(">>pipeline topic=\"graphs\"");
    restart.chain_id = Some(chain_id.clone());
    restart.force_restart = true;
    let response = run(&fx, restart).await;

    assert!(!response.is_error);
    assert_eq!(response.metadata["current_step"], 1);
    // The old session is gone; a new one replaced it
    assert!(fx.engine.store().get_by_chain_id(&chain_id, true).is_none());
}
