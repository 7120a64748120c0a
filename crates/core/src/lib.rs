// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! px-core: Domain types for the Prompt Exec (px) engine

pub mod blueprint;
pub mod clock;
pub mod command;
pub mod event;
pub mod framework;
pub mod gate;
pub mod id;
pub mod ident;
pub mod plan;
pub mod prompt;
pub mod style;

pub use blueprint::SessionBlueprint;
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use clock::{Clock, SystemClock};
pub use command::{
    CommandFormat, CommandOperator, CommandType, NamedInlineGate, ParsedCommand, ParsedStep,
};
pub use event::NotificationEvent;
pub use framework::{FrameworkDefinition, MethodologyGuide};
pub use gate::{
    ActivationRules, EnforcementMode, GateAction, GateDefinition, GateKind, GateSeverity, GateType,
    OutputFormat, PassCriterion, RetryConfig, SecurityTier,
};
pub use id::{ChainId, CommandId, IdGen, SessionId, ShortId, UuidIdGen};
pub use ident::fold_id;
pub use plan::{ExecutionPlan, ExecutionStrategy, PlanModifiers, StepPlan};
pub use prompt::{
    ArgumentSpec, ArgumentType, ArgumentValidation, ChainStep, GateConfiguration,
    InjectionAnnotations, PromptDefinition, ScriptTool, ScriptToolMode,
};
pub use style::{EnhancementMode, StyleDefinition};
