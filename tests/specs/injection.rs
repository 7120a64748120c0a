//! Injection decision precedence (all seven levels) and the framework
//! double-injection guard.

use crate::prelude::*;
use px_core::InjectionAnnotations;
use px_engine::injection::{resolve, InjectionConfig, InjectionQuery, InjectionSource, InjectionType};
use px_engine::{EngineConfig, ExecutionRequest};
use std::collections::HashMap;

fn system_prompt(value: bool) -> InjectionAnnotations {
    InjectionAnnotations {
        system_prompt: Some(value),
        gate_guidance: None,
        style_guidance: None,
    }
}

#[test]
fn each_hierarchy_level_is_the_decision_source_when_set_alone() {
    let base_config = InjectionConfig::default();

    // Level 1: session runtime override
    let annotations = system_prompt(false);
    let query = InjectionQuery {
        session_override: Some(&annotations),
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&base_config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::SessionOverride
    );

    // Level 2: explicit request override
    let query = InjectionQuery {
        request_override: Some(&annotations),
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&base_config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::RequestOverride
    );

    // Level 3: per-step annotation
    let query = InjectionQuery {
        step_annotation: Some(&annotations),
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&base_config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::StepAnnotation
    );

    // Level 4: chain-level rule
    let query = InjectionQuery {
        chain_rule: Some(&annotations),
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&base_config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::ChainRule
    );

    // Level 5: category-level rule
    let mut category_rules = HashMap::new();
    category_rules.insert("analysis".to_string(), annotations);
    let config = InjectionConfig {
        global: InjectionAnnotations::default(),
        category_rules,
    };
    let query = InjectionQuery {
        category: Some("analysis"),
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::CategoryRule
    );

    // Level 6: global default
    let config = InjectionConfig {
        global: annotations,
        category_rules: HashMap::new(),
    };
    let query = InjectionQuery {
        current_step: 1,
        ..InjectionQuery::default()
    };
    assert_eq!(
        resolve(&config, &query, InjectionType::SystemPrompt).source,
        InjectionSource::GlobalDefault
    );

    // Level 7: fallback
    let query = InjectionQuery {
        current_step: 1,
        ..InjectionQuery::default()
    };
    let decision = resolve(&base_config, &query, InjectionType::SystemPrompt);
    assert_eq!(decision.source, InjectionSource::Fallback);
    assert!(decision.inject);
}

#[tokio::test]
async fn session_runtime_override_suppresses_injection_end_to_end() {
    let fx = fixture_with(EngineConfig {
        default_framework: Some("cageerf".to_string()),
        ..EngineConfig::default()
    });

    let with_injection = run_command(&fx, ">>analyze topic=\"x\"").await;
    assert!(with_injection.first_text().contains("C.A.G.E.E.R.F"));

    fx.engine
        .set_runtime_injection_override(Some(system_prompt(false)));
    let suppressed = run_command(&fx, ">>analyze topic=\"x\"").await;
    assert!(!suppressed.first_text().contains("C.A.G.E.E.R.F"));
}

#[tokio::test]
async fn request_override_suppresses_injection_end_to_end() {
    let fx = fixture_with(EngineConfig {
        default_framework: Some("cageerf".to_string()),
        ..EngineConfig::default()
    });
    let mut request = ExecutionRequest::from_command(">>analyze topic=\"x\"");
    request.injection = Some(system_prompt(false));
    let response = run(&fx, request).await;
    assert!(!response.first_text().contains("C.A.G.E.E.R.F"));
}

#[tokio::test]
async fn framework_marker_in_system_message_prevents_double_injection() {
    let fx = fixture_with(EngineConfig {
        default_framework: Some("cageerf".to_string()),
        ..EngineConfig::default()
    });
    crate::prelude::write_resource(
        fx.tmp.path(),
        "prompts",
        "primed",
        "prompt.yaml",
        r#"
system_message: "Apply the C.A.G.E.E.R.F methodology systematically. You already know."
user_message_template: "Do the thing."
"#,
    );
    let primed = px_registry::load_prompt(&fx.tmp.path().join("prompts").join("primed")).unwrap();
    fx.engine.registries().prompts.insert(primed);

    let response = run_command(&fx, ">>primed").await;
    let occurrences = response
        .first_text()
        .matches("Apply the C.A.G.E.E.R.F methodology systematically")
        .count();
    assert_eq!(occurrences, 1, "{}", response.first_text());
}

#[tokio::test]
async fn style_guidance_is_appended_when_enabled() {
    let mut config = EngineConfig::default();
    config.injection.global.style_guidance = Some(true);
    let fx = fixture_with(config);
    let response = run_command(&fx, "#analytical >>analyze topic=\"x\"").await;
    assert!(response
        .first_text()
        .contains("Favor tables and explicit reasoning."));
}
