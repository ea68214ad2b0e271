//! Property tests: action-type parsing and weight validation.

use proptest::prelude::*;

use affinity_core::config::ActionWeights;
use affinity_core::models::ActionType;

fn action_strategy() -> impl Strategy<Value = ActionType> {
    prop_oneof![
        Just(ActionType::View),
        Just(ActionType::Register),
        Just(ActionType::Like),
    ]
}

fn weight_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -2.0f64..2.0,
        1 => Just(0.0),
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

proptest! {
    #[test]
    fn prop_action_type_parses_any_spelling(
        action in action_strategy(),
        prefixed in any::<bool>(),
        mask in prop::collection::vec(any::<bool>(), 16),
    ) {
        let base = if prefixed {
            format!("ACTION_{action}")
        } else {
            action.to_string()
        };
        let mixed: String = base
            .chars()
            .zip(mask.iter().cycle())
            .map(|(c, lower)| if *lower { c.to_ascii_lowercase() } else { c })
            .collect();
        prop_assert_eq!(mixed.parse::<ActionType>().unwrap(), action);
    }

    #[test]
    fn prop_unknown_action_type_is_rejected(raw in "[A-Z]{1,12}") {
        prop_assume!(!matches!(
            raw.trim_start_matches("ACTION_"),
            "VIEW" | "REGISTER" | "LIKE"
        ));
        prop_assert!(raw.parse::<ActionType>().is_err());
    }

    #[test]
    fn prop_validate_accepts_exactly_ordered_non_negative_weights(
        view in weight_strategy(),
        register in weight_strategy(),
        like in weight_strategy(),
    ) {
        let weights = ActionWeights::new(view, register, like);
        let well_formed = [view, register, like]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        let ordered = view <= register && register <= like;
        prop_assert_eq!(weights.validate().is_ok(), well_formed && ordered);
    }

    #[test]
    fn prop_weight_follows_engagement_order(weights in (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0)) {
        let mut sorted = [weights.0, weights.1, weights.2];
        sorted.sort_by(f64::total_cmp);
        let weights = ActionWeights::new(sorted[0], sorted[1], sorted[2]);
        prop_assert!(weights.validate().is_ok());
        for pair in ActionType::ALL.windows(2) {
            prop_assert!(weights.weight(pair[0]) <= weights.weight(pair[1]));
        }
    }
}
