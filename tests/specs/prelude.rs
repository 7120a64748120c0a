//! Shared fixture: a YAML resource tree plus an engine wired with fakes.

use px_adapters::FakeScriptExecutor;
use px_core::{FakeClock, SystemClock};
use px_engine::{Engine, EngineConfig, EngineResponse, ExecutionRequest, NotificationSender};
use px_registry::{load_framework, load_gate, load_prompt, load_style, load_tree, RegistrySet};
use px_storage::SessionStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[allow(dead_code)]
pub struct Fixture {
    pub tmp: tempfile::TempDir,
    pub engine: Engine<FakeScriptExecutor, FakeClock>,
    pub scripts: FakeScriptExecutor,
    pub clock: FakeClock,
}

pub fn write_resource(root: &Path, kind: &str, id: &str, file: &str, yaml: &str) {
    let dir = root.join(kind).join(id);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), yaml).unwrap();
}

/// The standard resource tree used across specs.
pub fn seed_resources(root: &Path) {
    write_resource(
        root,
        "prompts",
        "greet",
        "prompt.yaml",
        r#"
category: social
user_message_template: "Hello, {{name}}!"
arguments:
  - name: name
    required: true
"#,
    );
    write_resource(
        root,
        "prompts",
        "analyze",
        "prompt.yaml",
        r#"
category: analysis
user_message_template: "Analyze {{topic}} carefully."
arguments:
  - name: topic
    required: false
"#,
    );
    write_resource(
        root,
        "prompts",
        "index",
        "prompt.yaml",
        "user_message_template: \"Index everything.\"\n",
    );
    write_resource(
        root,
        "prompts",
        "clarify",
        "prompt.yaml",
        "user_message_template: \"Clarify the task: {{topic}}\"\n",
    );
    write_resource(
        root,
        "prompts",
        "plan",
        "prompt.yaml",
        "user_message_template: \"Plan using: {{previous_step_result}}\"\n",
    );
    write_resource(
        root,
        "prompts",
        "implement",
        "prompt.yaml",
        "user_message_template: \"Implement: {{the_plan}}\"\n",
    );
    write_resource(
        root,
        "prompts",
        "pipeline",
        "prompt.yaml",
        r#"
chain_steps:
  - step_number: 1
    prompt_id: clarify
    variable_name: clarified
  - step_number: 2
    prompt_id: plan
    output_mapping:
      result: the_plan
  - step_number: 3
    prompt_id: implement
"#,
    );
    write_resource(
        root,
        "gates",
        "sources-must-be-official",
        "gate.yaml",
        r#"
name: Official sources
type: validation
severity: high
enforcement_mode: blocking
guidance: "Cite official sources with URLs."
pass_criteria:
  - check: phrase_present
    phrases: ["https://"]
retry:
  max_attempts: 2
  improvement_hints: ["add links to official documentation"]
"#,
    );
    write_resource(
        root,
        "methodologies",
        "cageerf",
        "methodology.yaml",
        r#"
name: CAGEERF
type: CAGEERF
system_prompt_template: |
  Apply the C.A.G.E.E.R.F methodology systematically.

  {METHODOLOGY_GUIDANCE}
guidance: "Context, Analysis, Goals, Execution, Evaluation, Refinement, Framing."
"#,
    );
    write_resource(
        root,
        "methodologies",
        "react",
        "methodology.yaml",
        r#"
name: ReACT
type: ReACT
system_prompt_template: "Reason step by step, then act."
"#,
    );
    write_resource(
        root,
        "styles",
        "analytical",
        "style.yaml",
        r#"
name: Analytical
guidance: "Favor tables and explicit reasoning."
enhancement_mode: append
"#,
    );
}

pub fn load_registries(root: &Path) -> RegistrySet {
    let set = RegistrySet::new();
    set.prompts
        .replace_all(load_tree(&root.join("prompts"), load_prompt));
    set.gates
        .replace_all(load_tree(&root.join("gates"), load_gate));
    set.styles
        .replace_all(load_tree(&root.join("styles"), load_style));
    set.frameworks
        .replace_all(load_tree(&root.join("methodologies"), load_framework));
    set
}

pub fn fixture_with(config: EngineConfig) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    seed_resources(tmp.path());
    let registries = load_registries(tmp.path());
    let clock = FakeClock::new();
    let store = Arc::new(SessionStore::in_memory(
        Duration::from_secs(3600),
        clock.clone(),
    ));
    let scripts = FakeScriptExecutor::new();
    let engine = Engine::new(
        registries,
        store,
        scripts.clone(),
        NotificationSender::disabled(),
        clock.clone(),
        config,
    );
    Fixture {
        tmp,
        engine,
        scripts,
        clock,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(EngineConfig::default())
}

pub async fn run(fx: &Fixture, request: ExecutionRequest) -> EngineResponse {
    fx.engine.execute(request).await
}

pub async fn run_command(fx: &Fixture, command: &str) -> EngineResponse {
    run(fx, ExecutionRequest::from_command(command)).await
}

pub fn chain_id_of(response: &EngineResponse) -> String {
    response.metadata["chain_id"]
        .as_str()
        .expect("response carries a chain_id")
        .to_string()
}

/// A journal-backed store fixture for persistence specs.
#[allow(dead_code)]
pub fn journal_store(path: &Path) -> SessionStore<SystemClock> {
    SessionStore::open(path, Duration::from_secs(3600), SystemClock).unwrap()
}
