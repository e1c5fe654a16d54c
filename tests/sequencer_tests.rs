use approx::assert_relative_eq;
use scrolly_rs::ScrollyError;
use scrolly_rs::animation::{Ease, SceneState, TimelineSpec, Tween};
use scrolly_rs::core::DensityFilter;
use scrolly_rs::render::{ElementId, PropertyKey, PropertyValue};
use scrolly_rs::sequencer::{
    BoundaryEvent, Edge, Playback, ScrollLayout, SequencePhase, SequencerStep, Stage, StageHook,
    StageSequencer, TriggerMode,
};

const DOT: &str = "dot";

fn baseline() -> SceneState {
    let mut state = SceneState::new();
    state.set(ElementId::new(DOT), PropertyKey::X, PropertyValue::Number(0.0));
    state.set(ElementId::new(DOT), PropertyKey::Visible, PropertyValue::Visible(false));
    state
}

/// Sections are one 800px viewport apart; each stage region is
/// `[top - 400, top]`.
fn layout() -> ScrollLayout {
    ScrollLayout::new(800.0)
        .with_section("c", 600.0, 800.0)
        .with_section("a", 1400.0, 800.0)
        .with_section("z", 2200.0, 800.0)
}

fn move_dot(id: &str, section: &str, mode: TriggerMode, x: f64) -> Stage {
    Stage::in_section(id, section, mode)
        .expect("stage")
        .with_timeline(TimelineSpec::new().tween(
            Tween::to([DOT]).set(PropertyKey::X, x).duration(1.0).ease(Ease::Linear),
        ))
}

fn x_of(sequencer: &StageSequencer, step: &SequencerStep) -> f64 {
    sequencer
        .step_values(step)
        .and_then(|state| state.get(&ElementId::new(DOT), PropertyKey::X).cloned())
        .and_then(|value| value.as_number())
        .expect("x value")
}

#[test]
fn scrub_midpoint_interpolates_linearly() {
    let stages = vec![move_dot("c", "c", TriggerMode::Scrub, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    let steps = sequencer.scroll_to(400.0).expect("scroll");
    assert_eq!(
        steps,
        vec![SequencerStep::Apply {
            stage: 0,
            progress: 0.5,
            in_flight: true
        }]
    );
    assert_relative_eq!(x_of(&sequencer, &steps[0]), 50.0);
    assert!(sequencer.is_in_flight(0));
    assert_eq!(sequencer.phase(), SequencePhase::Stage(0));
}

#[test]
fn fast_reverse_scroll_snaps_to_exact_start() {
    let stages = vec![move_dot("c", "c", TriggerMode::Scrub, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    let forward = sequencer.scroll_to(5_000.0).expect("scroll");
    assert_eq!(
        forward,
        vec![SequencerStep::CompleteAndYield {
            stage: 0,
            edge: Edge::End
        }]
    );
    assert_eq!(x_of(&sequencer, &forward[0]), 100.0);
    assert_eq!(sequencer.phase(), SequencePhase::Settled);

    let back = sequencer.scroll_to(-5_000.0).expect("scroll");
    assert_eq!(
        back,
        vec![SequencerStep::CompleteAndYield {
            stage: 0,
            edge: Edge::Start
        }]
    );
    assert_eq!(x_of(&sequencer, &back[0]), 0.0);
    assert_eq!(sequencer.progress(0), Some(0.0));
    assert_eq!(sequencer.phase(), SequencePhase::Unreached);
}

#[test]
fn repeated_offset_emits_nothing() {
    let stages = vec![move_dot("c", "c", TriggerMode::Scrub, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    assert!(!sequencer.scroll_to(300.0).expect("scroll").is_empty());
    assert!(sequencer.scroll_to(300.0).expect("scroll").is_empty());
    assert!(matches!(
        sequencer.scroll_to(f64::NAN),
        Err(ScrollyError::InvalidData(_))
    ));
}

#[test]
fn scrub_values_depend_only_on_offset() {
    let stages = vec![
        move_dot("c", "c", TriggerMode::Scrub, 100.0),
        move_dot("a", "a", TriggerMode::Scrub, 40.0),
    ];
    let mut direct = StageSequencer::build(stages.clone(), &baseline(), &layout()).expect("build");
    let mut wandering = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    let direct_steps = direct.scroll_to(1_300.0).expect("scroll");
    for y in [250.0, 2_000.0, 500.0, -100.0, 1_100.0] {
        wandering.scroll_to(y).expect("scroll");
    }
    let wandering_steps = wandering.scroll_to(1_300.0).expect("scroll");

    let last_direct = direct_steps.last().expect("apply");
    let last_wandering = wandering_steps.last().expect("apply");
    assert_eq!(last_direct, last_wandering);
    assert_relative_eq!(x_of(&direct, last_direct), 100.0 + (40.0 - 100.0) * 0.75);
    assert_eq!(direct.progress(0), wandering.progress(0));
}

#[test]
fn later_writer_forces_hand_off_of_playing_stage() {
    let stages = vec![
        move_dot("c", "c", TriggerMode::Scrub, 50.0),
        move_dot("a", "a", TriggerMode::Discrete, 100.0),
    ];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    sequencer.scroll_to(1_500.0).expect("scroll past both");
    assert_eq!(sequencer.progress(1), Some(1.0));

    let reverse = sequencer.scroll_to(900.0).expect("leave discrete backward");
    assert_eq!(
        reverse,
        vec![SequencerStep::Apply {
            stage: 1,
            progress: 1.0,
            in_flight: true
        }]
    );
    assert_eq!(sequencer.playback(1), Some(Playback::Reverse));

    let ticked = sequencer.tick(0.4);
    assert_eq!(ticked.len(), 1);
    assert_relative_eq!(x_of(&sequencer, &ticked[0]), 80.0, epsilon = 1e-9);

    let steps = sequencer.scroll_to(400.0).expect("enter scrub backward");
    assert_eq!(
        steps,
        vec![
            SequencerStep::CompleteAndYield {
                stage: 1,
                edge: Edge::Start
            },
            SequencerStep::Apply {
                stage: 0,
                progress: 0.5,
                in_flight: true
            },
        ]
    );
    assert_eq!(sequencer.playback(1), Some(Playback::Idle));
    assert_relative_eq!(x_of(&sequencer, &steps[1]), 25.0);
}

#[test]
fn discrete_stage_plays_on_frame_clock() {
    let stage = Stage::in_section("a", "a", TriggerMode::Discrete)
        .expect("stage")
        .with_timeline(
            TimelineSpec::new()
                .tween(Tween::to([DOT]).set(PropertyKey::X, 100.0).duration(2.0).ease(Ease::Linear))
                .tween(Tween::to([DOT]).set(PropertyKey::Visible, true).duration(0.1).at(0.0)),
        );
    let mut sequencer = StageSequencer::build(vec![stage], &baseline(), &layout()).expect("build");

    let entered = sequencer.scroll_to(1_100.0).expect("scroll");
    assert_eq!(
        entered,
        vec![SequencerStep::Apply {
            stage: 0,
            progress: 0.0,
            in_flight: true
        }]
    );
    assert!(sequencer.scroll_to(1_200.0).expect("scroll").is_empty());

    let quarter = sequencer.tick(0.5);
    assert_eq!(
        quarter,
        vec![SequencerStep::Apply {
            stage: 0,
            progress: 0.25,
            in_flight: true
        }]
    );
    let state = sequencer.step_values(&quarter[0]).expect("values");
    assert_eq!(
        state.get(&ElementId::new(DOT), PropertyKey::Visible),
        Some(&PropertyValue::Visible(true))
    );

    let done = sequencer.tick(10.0);
    assert_eq!(
        done,
        vec![SequencerStep::CompleteAndYield {
            stage: 0,
            edge: Edge::End
        }]
    );
    assert!(sequencer.tick(1.0).is_empty());
    assert!(!sequencer.is_in_flight(0));
}

#[test]
fn finish_playback_completes_toward_heading() {
    let stages = vec![move_dot("a", "a", TriggerMode::Discrete, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    sequencer.scroll_to(1_100.0).expect("scroll");
    let steps = sequencer.finish_playback();
    assert_eq!(
        steps,
        vec![SequencerStep::CompleteAndYield {
            stage: 0,
            edge: Edge::End
        }]
    );
    assert!(sequencer.finish_playback().is_empty());
}

#[test]
fn explicit_complete_and_yield_snaps_stage() {
    let stages = vec![move_dot("c", "c", TriggerMode::Scrub, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");
    sequencer.scroll_to(300.0).expect("scroll");

    let index = sequencer.stage_index("c").expect("index");
    let steps = sequencer.complete_and_yield(index, Edge::End).expect("yield");
    assert_eq!(steps.len(), 1);
    assert_eq!(x_of(&sequencer, &steps[0]), 100.0);
    assert_eq!(sequencer.progress(index), Some(1.0));

    assert!(matches!(
        sequencer.stage_index("missing"),
        Err(ScrollyError::UnknownStage(_))
    ));
    assert!(matches!(
        sequencer.complete_and_yield(9, Edge::Start),
        Err(ScrollyError::UnknownStage(_))
    ));
}

#[test]
fn explicit_complete_and_yield_hands_off_conflicting_stages_first() {
    let stages = vec![
        move_dot("c", "c", TriggerMode::Scrub, 50.0),
        move_dot("a", "a", TriggerMode::Scrub, 100.0),
    ];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");
    sequencer.scroll_to(1_500.0).expect("scroll past both");
    assert_eq!(sequencer.progress(1), Some(1.0));

    let steps = sequencer.complete_and_yield(0, Edge::Start).expect("yield");
    assert_eq!(
        steps,
        vec![
            SequencerStep::CompleteAndYield {
                stage: 1,
                edge: Edge::Start
            },
            SequencerStep::CompleteAndYield {
                stage: 0,
                edge: Edge::Start
            },
        ]
    );
    assert_eq!(sequencer.progress(1), Some(0.0));
    assert_eq!(x_of(&sequencer, &steps[1]), 0.0);
}

#[test]
fn discrete_stage_left_backward_before_any_tick_is_cancelled() {
    let stages = vec![move_dot("a", "a", TriggerMode::Discrete, 100.0)];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    sequencer.scroll_to(0.0).expect("above");
    sequencer.scroll_to(1_100.0).expect("enter");
    assert_eq!(sequencer.playback(0), Some(Playback::Forward));

    let left = sequencer.scroll_to(500.0).expect("leave backward");
    assert_eq!(
        left,
        vec![SequencerStep::CompleteAndYield {
            stage: 0,
            edge: Edge::Start
        }]
    );
    assert!(sequencer.tick(0.5).is_empty());
    assert_eq!(sequencer.playback(0), Some(Playback::Idle));
    assert_eq!(sequencer.progress(0), Some(0.0));
    assert!(!sequencer.is_in_flight(0));
}

/// Three stages on one element: stage 3 is discrete and still playing when
/// the reader scrolls back past stage 2's start.
#[test]
fn reversing_past_stage_two_mid_flight_snaps_stage_three_to_start() {
    let stages = vec![
        move_dot("c", "c", TriggerMode::Scrub, 30.0),
        move_dot("a", "a", TriggerMode::Scrub, 60.0),
        move_dot("z", "z", TriggerMode::Discrete, 90.0),
    ];
    let mut sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");

    sequencer.scroll_to(1_900.0).expect("enter stage three");
    assert_eq!(sequencer.progress(1), Some(1.0));
    let ticked = sequencer.tick(0.5);
    assert_relative_eq!(x_of(&sequencer, &ticked[0]), 75.0, epsilon = 1e-9);
    assert!(sequencer.is_in_flight(2));

    let steps = sequencer.scroll_to(700.0).expect("reverse past stage two");
    assert!(steps.contains(&SequencerStep::CompleteAndYield {
        stage: 2,
        edge: Edge::Start
    }));
    let last_x = steps
        .iter()
        .filter(|step| !matches!(step, SequencerStep::RunHooks { .. }))
        .map(|step| x_of(&sequencer, step))
        .last()
        .expect("value steps");
    assert_relative_eq!(last_x, 30.0);
    assert_eq!(sequencer.progress(2), Some(0.0));
    assert_eq!(sequencer.playback(2), Some(Playback::Idle));
    assert_eq!(sequencer.progress(1), Some(0.0));
    assert_eq!(sequencer.progress(0), Some(1.0));
    assert!(sequencer.tick(1.0).is_empty());
    assert!((0..3).all(|stage| !sequencer.is_in_flight(stage)));
}

#[test]
fn hooks_run_before_stage_values() {
    let stage = move_dot("c", "c", TriggerMode::Scrub, 100.0)
        .on_enter(StageHook::SetDensityFilter(DensityFilter::PropSentServed))
        .on_leave_back(StageHook::SetDensityFilter(DensityFilter::None));
    let mut sequencer = StageSequencer::build(vec![stage], &baseline(), &layout()).expect("build");

    let steps = sequencer.scroll_to(300.0).expect("scroll");
    assert_eq!(steps.len(), 2);
    assert!(matches!(
        &steps[0],
        SequencerStep::RunHooks {
            event: BoundaryEvent::Enter,
            hooks,
            ..
        } if hooks[..] == [StageHook::SetDensityFilter(DensityFilter::PropSentServed)]
    ));
    assert!(matches!(steps[1], SequencerStep::Apply { .. }));

    let back = sequencer.scroll_to(0.0).expect("scroll");
    assert!(matches!(
        &back[0],
        SequencerStep::RunHooks {
            event: BoundaryEvent::LeaveBack,
            ..
        }
    ));
    assert!(matches!(
        back[1],
        SequencerStep::CompleteAndYield {
            edge: Edge::Start,
            ..
        }
    ));
}

#[test]
fn overlapping_stages_writing_one_slot_conflict() {
    let stages = vec![
        move_dot("first", "c", TriggerMode::Scrub, 10.0),
        move_dot("second", "c", TriggerMode::Scrub, 20.0),
    ];
    let err = StageSequencer::build(stages, &baseline(), &layout()).expect_err("conflict");
    assert!(matches!(
        err,
        ScrollyError::StageConflict { ref first, ref second, .. }
            if first == "first" && second == "second"
    ));
}

#[test]
fn overlapping_stages_on_disjoint_slots_are_allowed() {
    let hide = Stage::in_section("hide", "c", TriggerMode::Scrub)
        .expect("stage")
        .with_timeline(TimelineSpec::new().tween(Tween::to([DOT]).set(PropertyKey::Visible, true)));
    let stages = vec![move_dot("move", "c", TriggerMode::Scrub, 10.0), hide];
    assert!(StageSequencer::build(stages, &baseline(), &layout()).is_ok());
}

#[test]
fn regions_must_follow_declaration_order() {
    let stages = vec![
        move_dot("late", "z", TriggerMode::Scrub, 10.0),
        move_dot("early", "c", TriggerMode::Scrub, 20.0),
    ];
    assert!(matches!(
        StageSequencer::build(stages, &baseline(), &layout()),
        Err(ScrollyError::InvalidTrigger(_))
    ));

    let unknown = vec![move_dot("x", "nowhere", TriggerMode::Scrub, 1.0)];
    assert!(matches!(
        StageSequencer::build(unknown, &baseline(), &layout()),
        Err(ScrollyError::InvalidTrigger(_))
    ));
}

#[test]
fn resting_states_chain_stage_end_values() {
    let stages = vec![
        move_dot("c", "c", TriggerMode::Scrub, 50.0),
        move_dot("a", "a", TriggerMode::Scrub, 100.0),
    ];
    let sequencer = StageSequencer::build(stages, &baseline(), &layout()).expect("build");
    let x_at = |completed: usize| {
        sequencer
            .resting_state(completed)
            .and_then(|state| state.get(&ElementId::new(DOT), PropertyKey::X).cloned())
            .and_then(|value| value.as_number())
    };
    assert_eq!(x_at(0), Some(0.0));
    assert_eq!(x_at(1), Some(50.0));
    assert_eq!(x_at(2), Some(100.0));
    assert_relative_eq!(
        sequencer
            .values_at(1, 0.5)
            .get(&ElementId::new(DOT), PropertyKey::X)
            .and_then(PropertyValue::as_number)
            .expect("x"),
        75.0
    );
}
