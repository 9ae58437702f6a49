//! Property-based invariant tests for the overlay widgets.
//!
//! 1. FlightResults renders one item per result, in order, each carrying
//!    its status class, or the empty-state placeholder for no results.
//! 2. Scores render with one decimal; missing scores render `-`.
//! 3. Interpolated team text never injects markup.
//! 4. OverlayView visibility follows the flags for every state.

use aero_sync::{FlightResult, FlightStatus, OverlayState, Team};
use aero_widgets::flight_results::EMPTY_RESULTS;
use aero_widgets::{FlightResults, OverlayView, TeamCard};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn status_strategy() -> impl Strategy<Value = FlightStatus> {
    prop::sample::select(FlightStatus::ALL.to_vec())
}

fn result_strategy() -> impl Strategy<Value = FlightResult> {
    (
        1u32..20,
        status_strategy(),
        prop::option::of(0u32..1000),
    )
        .prop_map(|(battery, status, tenths)| FlightResult {
            battery_number: battery,
            status,
            score: tenths.map(|t| f64::from(t) / 10.0),
            notes: None,
        })
}

fn team_strategy() -> impl Strategy<Value = Team> {
    (
        "[a-zA-Z<>&\"' ]{1,24}",
        "[a-zA-Z<>& ]{0,24}",
        0u32..10,
        prop::collection::vec(result_strategy(), 0..4),
    )
        .prop_map(|(name, university, battery, results)| Team {
            id: "t".into(),
            name,
            university,
            aircraft_photo_url: None,
            current_battery: battery,
            flight_results: results,
        })
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Flight results
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_item_per_result_in_order(results in prop::collection::vec(result_strategy(), 0..8)) {
        let mut panel = FlightResults::new();
        panel.show(&results);
        let root = panel.component().root();
        let items = root.query_all(".result-item");

        prop_assert_eq!(items.len(), results.len());
        prop_assert_eq!(root.markup().contains(EMPTY_RESULTS), results.is_empty());
        for (item, result) in items.iter().zip(&results) {
            prop_assert!(item.has_class(result.status.as_str()));
        }
        for result in &results {
            let score = result
                .score
                .map_or_else(|| "-".to_string(), |s| format!("{s:.1}"));
            let expected = format!(r#"<span class="result-score">{score}</span>"#);
            prop_assert!(root.markup().contains(&expected));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Escaping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn team_text_never_adds_elements(team in team_strategy()) {
        let mut card = TeamCard::new();
        card.set_team(&team);
        let root = card.component().root();
        // div, h3, p, span
        prop_assert_eq!(aero_core::render::scan_elements(root.markup()).len(), 4);
        prop_assert_eq!(card.team_id(), Some("t".to_string()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Overlay reconciliation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overlay_follows_flags(
        visible in any::<bool>(),
        show_team_info in any::<bool>(),
        show_flight_results in any::<bool>(),
        show_current_battery in any::<bool>(),
        team in prop::option::of(team_strategy()),
        message in prop::option::of("[a-z]{0,8}"),
    ) {
        let state = OverlayState {
            visible,
            show_team_info,
            show_flight_results,
            show_current_battery,
            custom_message: message.clone(),
            team: team.clone(),
            ..OverlayState::default()
        };
        let view = OverlayView::new();
        view.apply(&state);
        let parts = view.parts();

        prop_assert_eq!(
            parts.team_info.is_visible(),
            visible && show_team_info && team.is_some()
        );
        prop_assert_eq!(
            parts.results.is_visible(),
            visible && show_flight_results && team.is_some()
        );
        prop_assert_eq!(
            parts.message.is_visible(),
            visible && message.as_deref().is_some_and(|m| !m.is_empty())
        );
        if parts.team_info.is_visible() {
            prop_assert_eq!(
                parts.team_info.component().root().query(".current-battery").is_some(),
                show_current_battery
            );
        }
    }
}

#[test]
fn single_validated_result_renders_score_and_class() {
    let mut panel = FlightResults::new();
    panel.show(&[FlightResult::new(2, FlightStatus::Validated).with_score(87.5)]);
    let root = panel.component().root();
    let items = root.query_all(".result-item");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].classes, vec!["result-item", "validated"]);
    assert!(root.markup().contains(
        r#"<span class="result-battery">Bateria 2</span><span class="result-status">Validado</span><span class="result-score">87.5</span>"#
    ));

    panel.show(&[]);
    assert_eq!(panel.component().root().query_all(".result-item").len(), 0);
    assert!(panel.component().root().markup().contains(EMPTY_RESULTS));
}
