use proptest::prelude::*;
use serde_json::{Value, json};

use scrolly_rs::animation::{Ease, SceneState, TimelineSpec, Tween};
use scrolly_rs::api::ScrollyConfig;
use scrolly_rs::core::Viewport;
use scrolly_rs::render::{ElementId, MemoryScene, PropertyKey, PropertyValue};
use scrolly_rs::sequencer::{Playback, ScrollLayout, Stage, StageSequencer, TriggerMode};
use scrolly_rs::{ScrollyEngine, ScrollyError};

const VH: f64 = 600.0;

#[derive(Debug, Clone, Copy)]
enum Op {
    Scroll(f64),
    Tick(f64),
    Finish,
}

fn op(max_y: f64) -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (-VH..max_y).prop_map(Op::Scroll),
        3 => (0.0..1.5f64).prop_map(Op::Tick),
        1 => Just(Op::Finish),
    ]
}

fn export() -> String {
    let decisions = ["GRANTED", "DENIED", "OPEN DATE", "**********", "DENIED"];
    let races = ["WHITE", "BLACK", "HISPANIC", "OTHER"];
    let types = ["INITIAL", "REAPPEAR", "MERIT TIME"];
    let rows: Vec<Value> = (0..90)
        .map(|i| {
            json!({
                "id": format!("p{}", i % 70),
                "parole_interview_date": format!("2019-0{}-10", 1 + i % 9),
                "interview_decision": decisions[i % decisions.len()],
                "parole_board_interview_type": types[i % types.len()],
                "race__ethnicity": races[i % races.len()],
                "age": 19 + (i % 60),
                "age_entered": 17 + (i % 25),
                "prop_sent_served": 0.1 + (i % 9) as f64 * 0.1,
                "time_serv_at_int": 1 + (i % 15),
                "min_sent": 2 + (i % 10),
                "max_sent": 5 + (i % 20),
            })
        })
        .collect();
    Value::Array(rows).to_string()
}

/// Pairs of distinct stages that write at least one common slot.
fn slot_sharing_pairs(sequencer: &StageSequencer) -> Vec<(usize, usize)> {
    let count = sequencer.len();
    let mut pairs = Vec::new();
    for first in 0..count {
        for second in 0..count {
            if first == second {
                continue;
            }
            let (Some(left), Some(right)) = (sequencer.timeline(first), sequencer.timeline(second))
            else {
                continue;
            };
            if left.touched().any(|slot| right.touches(slot)) {
                pairs.push((first, second));
            }
        }
    }
    pairs
}

fn assert_partners_at_edges(
    sequencer: &StageSequencer,
    pairs: &[(usize, usize)],
) -> Result<(), TestCaseError> {
    for &(playing, partner) in pairs {
        if !sequencer.is_in_flight(playing) {
            continue;
        }
        let progress = sequencer.progress(partner).unwrap_or(-1.0);
        prop_assert!(
            progress == 0.0 || progress == 1.0,
            "stage {partner} at {progress} while stage {playing} is in flight"
        );
        prop_assert_eq!(sequencer.playback(partner), Some(Playback::Idle));
    }
    Ok(())
}

fn run_engine_op(engine: &mut ScrollyEngine<MemoryScene>, op: Op) -> Result<(), ScrollyError> {
    match op {
        Op::Scroll(y) => engine.scroll_to(y),
        Op::Tick(dt) => engine.tick(dt),
        Op::Finish => engine.finish_playback(),
    }
}

fn dot_stages() -> (Vec<Stage>, SceneState, ScrollLayout) {
    let stage = |id: &str, section: &str, mode: TriggerMode, x: f64| {
        Stage::in_section(id, section, mode)
            .expect("stage")
            .with_timeline(TimelineSpec::new().tween(
                Tween::to(["dot"]).set(PropertyKey::X, x).duration(1.0).ease(Ease::Linear),
            ))
    };
    let mut baseline = SceneState::new();
    baseline.set(ElementId::new("dot"), PropertyKey::X, PropertyValue::Number(0.0));
    let layout = ScrollLayout::new(800.0)
        .with_section("one", 600.0, 800.0)
        .with_section("two", 1400.0, 800.0)
        .with_section("three", 2200.0, 800.0);
    (
        vec![
            stage("one", "one", TriggerMode::Discrete, 30.0),
            stage("two", "two", TriggerMode::Scrub, 60.0),
            stage("three", "three", TriggerMode::Discrete, 90.0),
        ],
        baseline,
        layout,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_scroll_and_ticks_never_break_hand_off(
        ops in prop::collection::vec(op(17.0 * VH), 1..40)
    ) {
        let config = ScrollyConfig::new(Viewport::new(1000, 600));
        let mut engine = ScrollyEngine::new(MemoryScene::new(), config).expect("engine");
        engine.load_json(&export()).expect("load");
        let pairs = slot_sharing_pairs(engine.sequencer().expect("sequencer"));
        prop_assert!(!pairs.is_empty());

        for op in ops {
            let result = run_engine_op(&mut engine, op);
            prop_assert!(
                !matches!(result, Err(ScrollyError::StageHandoffViolation { .. })),
                "hand-off violation after {op:?}: {result:?}"
            );
            prop_assert!(result.is_ok(), "{op:?} failed: {result:?}");
            assert_partners_at_edges(engine.sequencer().expect("sequencer"), &pairs)?;
        }
    }

    #[test]
    fn shared_element_stages_settle_at_start_after_leaving_upward(
        ops in prop::collection::vec(op(3_000.0), 1..30)
    ) {
        let (stages, baseline, layout) = dot_stages();
        let mut sequencer = StageSequencer::build(stages, &baseline, &layout).expect("build");
        let pairs = slot_sharing_pairs(&sequencer);

        for op in ops {
            match op {
                Op::Scroll(y) => {
                    sequencer.scroll_to(y).expect("scroll");
                }
                Op::Tick(dt) => {
                    sequencer.tick(dt);
                }
                Op::Finish => {
                    sequencer.finish_playback();
                }
            }
            assert_partners_at_edges(&sequencer, &pairs)?;
        }

        sequencer.scroll_to(-10_000.0).expect("top");
        for _ in 0..4 {
            sequencer.tick(1.0);
        }
        for stage in 0..sequencer.len() {
            prop_assert_eq!(sequencer.progress(stage), Some(0.0));
            prop_assert_eq!(sequencer.playback(stage), Some(Playback::Idle));
        }
    }
}
