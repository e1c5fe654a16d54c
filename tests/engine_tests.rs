use approx::assert_relative_eq;
use serde_json::{Value, json};

use scrolly_rs::api::{
    DensityFilter, EngineSnapshot, LoadState, ScrollyConfig, default_layout, ids,
};
use scrolly_rs::core::{Outcome, Viewport};
use scrolly_rs::render::{ElementId, MemoryScene, PropertyKey, SceneAdapter};
use scrolly_rs::sequencer::{Playback, ScrollLayout};
use scrolly_rs::{ScrollyEngine, ScrollyError};

const VH: f64 = 600.0;

fn engine() -> ScrollyEngine<MemoryScene> {
    ScrollyEngine::new(MemoryScene::new(), ScrollyConfig::new(Viewport::new(1000, 600)))
        .expect("engine")
}

fn export(granted: usize, denied: usize, unknown: usize) -> String {
    let decisions = std::iter::repeat_n("GRANTED", granted)
        .chain(std::iter::repeat_n("DENIED", denied))
        .chain(std::iter::repeat_n("**********", unknown));
    let races = ["WHITE", "BLACK", "HISPANIC", "OTHER"];
    let types = ["INITIAL", "REAPPEAR", "MERIT TIME"];

    let rows: Vec<Value> = decisions
        .enumerate()
        .map(|(i, decision)| {
            json!({
                "id": format!("p{i}"),
                "parole_interview_date": "2020-03-01",
                "interview_decision": decision,
                "parole_board_interview_type": types[i % types.len()],
                "race__ethnicity": races[i % races.len()],
                "age": 19 + (i % 60),
                "age_entered": 17 + (i % 25),
                "prop_sent_served": format!("{:.2}", 0.1 + (i % 9) as f64 * 0.1),
                "time_serv_at_int": 1 + (i % 15),
                "min_sent": 2 + (i % 10),
                "max_sent": 5 + (i % 20),
            })
        })
        .collect();
    Value::Array(rows).to_string()
}

fn loaded(granted: usize, denied: usize, unknown: usize) -> ScrollyEngine<MemoryScene> {
    let mut engine = engine();
    engine
        .load_json(&export(granted, denied, unknown))
        .expect("load");
    engine
}

fn section_top(index: usize) -> f64 {
    index as f64 * VH
}

fn bar_width(engine: &ScrollyEngine<MemoryScene>, outcome: Outcome) -> f64 {
    engine
        .scene()
        .number(&ids::headline_bar(outcome), PropertyKey::Width)
        .expect("bar width")
}

#[test]
fn headline_bars_are_proportional_after_the_opening_stage() {
    let mut engine = loaded(600, 300, 100);
    assert!(engine.is_ready());
    assert_relative_eq!(bar_width(&engine, Outcome::Granted), 0.0);

    engine.scroll_to(-VH / 4.0).expect("enter headline");
    let headline = engine.snapshot().stages[0].clone();
    assert_eq!(headline.playback, Playback::Forward);

    engine.tick(0.5).expect("tick");
    engine.finish_playback().expect("finish");

    let granted = bar_width(&engine, Outcome::Granted);
    let denied = bar_width(&engine, Outcome::Denied);
    let other = bar_width(&engine, Outcome::Other);
    let scales = engine.scales().expect("scales");
    assert_relative_eq!(granted, scales.headline_x.extent(600.0), epsilon = 1e-9);
    assert_relative_eq!(granted, 2.0 * denied, epsilon = 1e-9);
    assert_relative_eq!(denied, 3.0 * other, epsilon = 1e-9);
    assert_relative_eq!(bar_width(&engine, Outcome::Postponed), 0.0);

    let headline = engine.aggregates().expect("aggregates").headline;
    assert_eq!(headline.total_interviews, 1000);
    assert_eq!(headline.unique_persons, 1000);
}

#[test]
fn calls_before_load_are_ignored() {
    let mut engine = engine();
    engine.scroll_to(1200.0).expect("scroll");
    engine.tick(0.016).expect("tick");
    engine.finish_playback().expect("finish");
    engine.click_filter("age").expect("click");

    assert_eq!(engine.load_state(), &LoadState::Empty);
    assert_eq!(engine.scroll_y(), None);
    assert_eq!(engine.density_filter(), DensityFilter::None);
    assert!(engine.snapshot().stages.is_empty());
}

#[test]
fn malformed_export_shows_a_load_failure() {
    let mut engine = engine();
    let err = engine.load_json("{ not json").expect_err("malformed");
    assert!(matches!(err, ScrollyError::LoadFailure(_)));
    assert!(matches!(engine.load_state(), LoadState::Failed(_)));

    let status = ElementId::new(ids::LOAD_STATUS);
    let scene = engine.scene();
    assert_eq!(
        scene
            .property(&status, PropertyKey::Visible)
            .and_then(|value| value.as_visible()),
        Some(true)
    );
    let text = scene
        .element(&status)
        .and_then(|element| element.properties.get(&PropertyKey::Text))
        .cloned();
    assert!(format!("{text:?}").contains("failed to load"));

    engine.scroll_to(800.0).expect("ignored scroll");
    assert_eq!(engine.scroll_y(), None);

    engine.load_json(&export(3, 2, 0)).expect("recover");
    assert!(engine.is_ready());
    assert_eq!(
        engine
            .scene()
            .property(&status, PropertyKey::Visible)
            .and_then(|value| value.as_visible()),
        Some(false)
    );
}

#[test]
fn empty_export_is_a_load_failure() {
    let mut engine = engine();
    assert!(matches!(
        engine.load_json("[]"),
        Err(ScrollyError::LoadFailure(_))
    ));
    assert!(!engine.is_ready());
}

#[test]
fn invalid_viewport_is_rejected() {
    let result = ScrollyEngine::new(MemoryScene::new(), ScrollyConfig::new(Viewport::new(0, 600)));
    assert!(result.is_err());
}

#[test]
fn density_stage_hooks_select_and_restore_filters() {
    let mut engine = loaded(40, 50, 10);

    engine.scroll_to(section_top(11) - VH / 4.0).expect("into density");
    assert_eq!(engine.density_filter(), DensityFilter::PropSentServed);
    assert_eq!(engine.normal_overlay(), DensityFilter::None);

    engine.scroll_to(section_top(12) - VH / 4.0).expect("into overlay");
    assert_eq!(engine.normal_overlay(), DensityFilter::PropSentServed);

    engine.scroll_to(section_top(14) - VH / 4.0).expect("into time served");
    assert_eq!(engine.density_filter(), DensityFilter::TimeServedAtInterview);
    assert_eq!(engine.normal_overlay(), DensityFilter::None);

    engine.scroll_to(section_top(15) - VH / 4.0).expect("into bubbles");
    assert_eq!(engine.density_filter(), DensityFilter::None);

    engine.scroll_to(section_top(12) - VH / 4.0).expect("back to overlay");
    assert_eq!(engine.density_filter(), DensityFilter::PropSentServed);
    assert_eq!(engine.normal_overlay(), DensityFilter::PropSentServed);

    engine.scroll_to(section_top(10)).expect("above density");
    assert_eq!(engine.density_filter(), DensityFilter::None);
    assert_eq!(engine.normal_overlay(), DensityFilter::None);
}

#[test]
fn full_scroll_and_return_restores_baseline() {
    let mut engine = loaded(120, 90, 15);
    let baseline: Vec<_> = engine
        .scene()
        .elements()
        .map(|(id, element)| (id.clone(), element.properties.clone()))
        .filter(|(id, _)| !id.as_str().starts_with("kde-"))
        .collect();

    let mut y = -VH;
    while y < section_top(17) {
        engine.scroll_to(y).expect("scroll down");
        engine.tick(0.1).expect("tick");
        y += VH / 7.0;
    }
    engine.finish_playback().expect("finish");
    assert_eq!(engine.snapshot().stages.iter().filter(|s| s.progress < 1.0).count(), 0);

    engine.scroll_to(-2.0 * VH).expect("back to top");
    engine.finish_playback().expect("finish reverse");

    for (id, properties) in baseline {
        let element = engine.scene().element(&id).expect("element kept");
        for (key, value) in properties {
            let now = element.properties.get(&key).expect("property kept");
            match (value.as_number(), now.as_number()) {
                (Some(before), Some(after)) => {
                    assert_relative_eq!(before, after, epsilon = 1e-6);
                }
                _ => assert_eq!(&value, now, "{id}.{key}"),
            }
        }
    }
}

#[test]
fn click_filter_routes_through_the_controller() {
    let mut engine = loaded(20, 20, 0);
    engine.click_filter("max_sent").expect("click");
    assert_eq!(engine.density_filter(), DensityFilter::MaxSentence);
    assert!(matches!(
        engine.click_filter("nope"),
        Err(ScrollyError::UnknownFilter(_))
    ));
    engine.click_filter("null").expect("clear");
    assert_eq!(engine.density_filter(), DensityFilter::None);
}

#[test]
fn resize_keeps_the_scroll_position() {
    let mut engine = loaded(50, 40, 5);
    let y = section_top(11) - VH / 4.0;
    engine.scroll_to(y).expect("scroll");

    engine
        .resize(Viewport::new(800, 500), default_layout(500.0))
        .expect("resize");

    assert_eq!(engine.viewport(), Viewport::new(800, 500));
    assert_eq!(engine.scroll_y(), Some(y));
    assert_eq!(engine.density_filter(), DensityFilter::PropSentServed);
    let geometry = engine.scales().expect("scales").geometry;
    assert_relative_eq!(geometry.width, 800.0);
    assert!(
        engine
            .snapshot()
            .stages
            .iter()
            .all(|stage| stage.playback == Playback::Idle)
    );
}

#[test]
fn failed_resize_leaves_engine_unchanged() {
    let mut engine = loaded(50, 40, 5);
    let y = section_top(2) - VH / 4.0;
    engine.scroll_to(y).expect("scroll");
    let before = engine.snapshot();
    let layout = engine.layout().clone();
    let scales = engine.scales().expect("scales").clone();

    let partial = ScrollLayout::new(500.0).with_section("section1", 0.0, 500.0);
    let err = engine
        .resize(Viewport::new(800, 500), partial)
        .expect_err("missing sections");
    assert!(matches!(err, ScrollyError::InvalidTrigger(_)));

    assert_eq!(engine.viewport(), Viewport::new(1000, 600));
    let geometry = engine.scales().expect("scales").geometry;
    assert_relative_eq!(geometry.width, f64::from(engine.viewport().width));
    assert_eq!(engine.scales(), Some(&scales));
    assert_eq!(engine.layout(), &layout);
    assert_eq!(engine.snapshot(), before);

    engine.scroll_to(y + 10.0).expect("scroll after failed resize");
}

#[test]
fn headline_left_upward_before_playing_stays_at_baseline() {
    let mut engine = loaded(600, 300, 100);
    engine.scroll_to(-VH / 4.0).expect("enter headline");
    engine.scroll_to(-VH).expect("leave upward");
    engine.tick(0.5).expect("tick");

    assert_relative_eq!(bar_width(&engine, Outcome::Granted), 0.0);
    let headline = engine.snapshot().stages[0].clone();
    assert_eq!(headline.playback, Playback::Idle);
    assert_eq!(headline.progress, 0.0);
}

#[test]
fn snapshot_contract_round_trips() {
    let mut engine = loaded(30, 20, 5);
    engine.scroll_to(VH * 1.75).expect("scroll");

    let json = engine.snapshot_json_contract_v1_pretty().expect("contract");
    let parsed = EngineSnapshot::from_json_compat_str(&json).expect("parse");
    assert_eq!(parsed, engine.snapshot());
    assert_eq!(parsed.stages.len(), 15);
    assert_eq!(parsed.scroll_y, Some(VH * 1.75));

    let bare = serde_json::to_string(&engine.snapshot()).expect("bare");
    assert_eq!(
        EngineSnapshot::from_json_compat_str(&bare).expect("bare parse"),
        parsed
    );

    let future = json.replacen("\"schema_version\": 1", "\"schema_version\": 2", 1);
    assert!(EngineSnapshot::from_json_compat_str(&future).is_err());
}

#[test]
fn config_json_round_trips_and_fills_defaults() {
    let config = ScrollyConfig::new(Viewport::new(1200, 700)).with_age_split_threshold(50.0);

    let json = config.to_json_pretty().expect("serialize");
    assert_eq!(ScrollyConfig::from_json_str(&json).expect("parse"), config);

    let contract = config.to_json_contract_v1_pretty().expect("contract");
    assert_eq!(
        ScrollyConfig::from_json_compat_str(&contract).expect("contract parse"),
        config
    );

    let minimal = ScrollyConfig::from_json_str(r#"{"viewport":{"width":640,"height":480}}"#)
        .expect("minimal");
    assert_eq!(minimal, ScrollyConfig::new(Viewport::new(640, 480)));
}
