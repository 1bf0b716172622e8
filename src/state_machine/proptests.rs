//! Property-based tests for the state machine
//!
//! These tests drive random event sequences through `transition` and check
//! the session invariants after every step.

use super::*;
use crate::llm::CompletionError;
use crate::transcript::Role;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Events are generated as plain data so sequences can be cloned and shrunk
#[derive(Debug, Clone)]
enum EventSpec {
    Start(String),
    UserMessage(String),
    Reset,
    Succeeded(String),
    Failed(u16),
}

impl EventSpec {
    fn into_event(self) -> Event {
        match self {
            EventSpec::Start(persona) => Event::Start { persona },
            EventSpec::UserMessage(text) => Event::UserMessage { text },
            EventSpec::Reset => Event::Reset,
            EventSpec::Succeeded(text) => Event::CompletionSucceeded { text },
            EventSpec::Failed(status) => Event::CompletionFailed {
                error: CompletionError::provider(status, "failed", ""),
            },
        }
    }
}

fn arb_event() -> impl Strategy<Value = EventSpec> {
    prop_oneof![
        2 => "[ ]{0,1}[A-Za-z ]{0,12}".prop_map(EventSpec::Start),
        4 => "[ ]{0,1}[a-z ?]{0,20}".prop_map(EventSpec::UserMessage),
        1 => Just(EventSpec::Reset),
        3 => "[a-zA-Z .]{0,30}".prop_map(EventSpec::Succeeded),
        2 => prop_oneof![Just(429u16), Just(500u16), Just(400u16)].prop_map(EventSpec::Failed),
    ]
}

/// Apply an event that must be accepted
fn step(state: &SessionState, event: Event) -> SessionState {
    transition(state, event).unwrap().new_state
}

fn check_invariants(state: &SessionState) -> Result<(), TestCaseError> {
    let turns = state.transcript.turns();
    match state.phase {
        SessionPhase::NotStarted => prop_assert!(turns.is_empty()),
        SessionPhase::Active | SessionPhase::AwaitingCompletion => {
            prop_assert_eq!(turns[0].role(), Role::System);
            prop_assert!(turns[1..].iter().all(|t| t.role() != Role::System));
        }
    }
    prop_assert_eq!(
        state.phase == SessionPhase::AwaitingCompletion,
        state.transcript.awaits_reply()
    );

    // Every user turn other than a pending last one has a reply after it
    let settled = if state.phase == SessionPhase::AwaitingCompletion {
        &turns[..turns.len() - 1]
    } else {
        turns
    };
    for pair in settled.windows(2) {
        if pair[0].role() == Role::User {
            prop_assert_eq!(pair[1].role(), Role::Assistant);
        }
    }
    if let Some(last) = settled.last() {
        prop_assert_ne!(last.role(), Role::User);
    }
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn invariants_hold_for_any_event_sequence(
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let mut state = SessionState::new();
        for spec in events {
            if let Ok(result) = transition(&state, spec.into_event()) {
                state = result.new_state;
            }
            check_invariants(&state)?;
        }
    }

    #[test]
    fn system_turn_fixed_until_reset(
        persona in "[A-Z][a-z]{2,10}",
        events in proptest::collection::vec(arb_event(), 0..30),
    ) {
        let mut state = step(&SessionState::new(), Event::Start { persona });
        let system = state.transcript.turns()[0].clone();

        for spec in events {
            let was_reset = matches!(spec, EventSpec::Reset);
            if let Ok(result) = transition(&state, spec.into_event()) {
                state = result.new_state;
            }
            if was_reset && state.phase == SessionPhase::NotStarted {
                break;
            }
            prop_assert_eq!(&state.transcript.turns()[0], &system);
        }
    }

    #[test]
    fn failed_completion_restores_prior_transcript(
        questions in proptest::collection::vec("[a-z]{1,10}", 0..5),
        message in "[a-z]{1,10}",
        status in 400u16..600,
    ) {
        let persona = "Persona".to_string();
        let mut state = step(&SessionState::new(), Event::Start { persona });
        for q in questions {
            state = step(&state, Event::UserMessage { text: q });
            state = step(&state, Event::CompletionSucceeded { text: "ok".to_string() });
        }

        let before = state.clone();
        let awaiting = step(&state, Event::UserMessage { text: message.clone() });
        let result = transition(&awaiting, Event::CompletionFailed {
            error: CompletionError::provider(status, "failed", ""),
        })
        .unwrap();

        prop_assert_eq!(&result.new_state, &before);
        let is_report = matches!(
            result.effects.as_slice(),
            [Effect::ReportFailure { discarded, .. }] if *discarded == message
        );
        prop_assert!(is_report);
    }
}
