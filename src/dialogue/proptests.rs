//! Property-based tests for the dialogue state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::AwaitingAuthorization),
        Just(Stage::Menu),
        Just(Stage::AwaitingCalendar),
        Just(Stage::AwaitingEvent),
    ]
}

/// Messages biased towards the command words
fn arb_message() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("done".to_string()),
        Just("cancel".to_string()),
        Just("1".to_string()),
        Just("2".to_string()),
        Just(String::new()),
        "[a-zA-Z0-9@.:, -]{0,40}",
    ]
}

fn arb_non_command() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9@.:, -]{0,40}".prop_filter("not a command", |m| {
        !matches!(m.as_str(), "done" | "cancel" | "1" | "2")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: every transition lands on one of the four stages
    #[test]
    fn prop_stage_always_valid(
        start in arb_stage(),
        steps in proptest::collection::vec((any::<bool>(), arb_message()), 0..30)
    ) {
        let mut stage = start;
        for (has_credential, message) in steps {
            stage = transition(stage, has_credential, &message).next_stage;
            prop_assert!(Stage::try_from(stage.as_u8()).is_ok());
            prop_assert!(stage.as_u8() <= 3);
        }
    }

    // Invariant 2: transitions are deterministic
    #[test]
    fn prop_transition_is_pure(
        stage in arb_stage(),
        has_credential in any::<bool>(),
        message in arb_message()
    ) {
        prop_assert_eq!(
            transition(stage, has_credential, &message),
            transition(stage, has_credential, &message)
        );
    }

    // Invariant 3: cancel always escapes a composing stage without a backend call
    #[test]
    fn prop_cancel_escapes_composing(
        stage in prop_oneof![Just(Stage::AwaitingCalendar), Just(Stage::AwaitingEvent)],
        has_credential in any::<bool>()
    ) {
        let result = transition(stage, has_credential, "cancel");
        prop_assert_eq!(result.next_stage, Stage::Menu);
        prop_assert_eq!(result.response, Response::Reply(Reply::Menu));
    }

    // Invariant 4: no stage other than 1 is reachable from 0 and only via "done"
    #[test]
    fn prop_authorization_gate(has_credential in any::<bool>(), message in arb_message()) {
        let result = transition(Stage::AwaitingAuthorization, has_credential, &message);
        prop_assert!(result.effect().is_none());
        if message == "done" && has_credential {
            prop_assert_eq!(result.next_stage, Stage::Menu);
        } else {
            prop_assert_eq!(result.next_stage, Stage::AwaitingAuthorization);
        }
    }

    // Invariant 5: unknown commands at the menu are idempotent
    #[test]
    fn prop_menu_fallback_idempotent(has_credential in any::<bool>(), message in arb_non_command()) {
        let result = transition(Stage::Menu, has_credential, &message);
        prop_assert_eq!(result.next_stage, Stage::Menu);
        prop_assert_eq!(result.response, Response::Reply(Reply::Menu));
    }

    // Invariant 6: any non-cancel input while composing yields exactly one
    // backend effect and returns to the menu
    #[test]
    fn prop_composing_input_yields_one_effect(
        stage in prop_oneof![Just(Stage::AwaitingCalendar), Just(Stage::AwaitingEvent)],
        message in arb_message().prop_filter("not cancel", |m| m != "cancel")
    ) {
        let result = transition(stage, true, &message);
        prop_assert_eq!(result.next_stage, Stage::Menu);
        match (stage, result.effect()) {
            (Stage::AwaitingCalendar, Some(Effect::CreateCalendar { summary })) => {
                prop_assert_eq!(summary, &message);
            }
            (Stage::AwaitingEvent, Some(Effect::CreateEvent(draft))) => {
                let tokens = message.split(',').count();
                prop_assert_eq!(draft.attendees.len(), tokens.saturating_sub(3));
            }
            (stage, effect) => prop_assert!(false, "unexpected effect {:?} at {}", effect, stage),
        }
    }
}
