use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::animation::{CompiledTimeline, PropertySlot, SceneState};
use crate::error::{ScrollyError, ScrollyResult};
use crate::sequencer::stage::{BoundaryEvent, HookList, Stage};
use crate::sequencer::trigger::{ScrollLayout, ScrollRegion, TriggerMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    #[must_use]
    pub fn progress(self) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::End => 1.0,
        }
    }
}

/// Playhead motion of a discrete stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playback {
    #[default]
    Idle,
    Forward,
    Reverse,
}

/// Where the sequence as a whole currently rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePhase {
    /// No stage has started.
    Unreached,
    /// Index of the furthest stage with non-zero progress.
    Stage(usize),
    /// Every stage is complete.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionSide {
    Before,
    Inside,
    After,
}

impl RegionSide {
    fn of(region: ScrollRegion, y: f64) -> Self {
        if y < region.start {
            Self::Before
        } else if y >= region.end {
            Self::After
        } else {
            Self::Inside
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StageRuntime {
    progress: f64,
    playback: Playback,
    side: RegionSide,
}

impl Default for StageRuntime {
    fn default() -> Self {
        Self {
            progress: 0.0,
            playback: Playback::Idle,
            side: RegionSide::Before,
        }
    }
}

/// One action the host must carry out, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SequencerStep {
    /// Snap a stage to an edge and release its elements.
    CompleteAndYield { stage: usize, edge: Edge },
    /// Run data hooks before any visual change of the stage.
    RunHooks {
        stage: usize,
        event: BoundaryEvent,
        hooks: HookList,
    },
    /// Write the stage's values at `progress`. `in_flight` marks a stage that
    /// still owns its elements afterwards.
    Apply {
        stage: usize,
        progress: f64,
        in_flight: bool,
    },
}

/// Binds an ordered stage list to scroll position.
///
/// Resting states are precomputed at build time: `resting_state(0)` is the
/// baseline and `resting_state(k + 1)` is `resting_state(k)` with stage `k`
/// completed. Stages whose regions overlap must write disjoint slots; stages
/// that share a slot are completed to the correct edge before either writes.
#[derive(Debug, Clone)]
pub struct StageSequencer {
    stages: Vec<Stage>,
    regions: Vec<ScrollRegion>,
    timelines: Vec<CompiledTimeline>,
    resting: Vec<SceneState>,
    conflicts: Vec<Vec<usize>>,
    runtime: Vec<StageRuntime>,
    scroll_y: Option<f64>,
}

fn shared_slot<'a>(
    left: &'a CompiledTimeline,
    right: &CompiledTimeline,
) -> Option<&'a PropertySlot> {
    left.touched().find(|slot| right.touches(slot))
}

fn validate_overlaps(
    stages: &[Stage],
    regions: &[ScrollRegion],
    timelines: &[CompiledTimeline],
) -> ScrollyResult<()> {
    for first in 0..stages.len() {
        for second in first + 1..stages.len() {
            if !regions[first].overlaps(regions[second]) {
                continue;
            }
            if let Some((element, property)) = shared_slot(&timelines[first], &timelines[second])
            {
                return Err(ScrollyError::StageConflict {
                    first: stages[first].id.clone(),
                    second: stages[second].id.clone(),
                    element: element.to_string(),
                    property: property.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn resolve_regions(stages: &[Stage], layout: &ScrollLayout) -> ScrollyResult<Vec<ScrollRegion>> {
    let regions = stages
        .iter()
        .map(|stage| layout.resolve(&stage.region))
        .collect::<ScrollyResult<Vec<_>>>()?;
    for (index, pair) in regions.windows(2).enumerate() {
        if pair[1].start < pair[0].start {
            return Err(ScrollyError::InvalidTrigger(format!(
                "stage `{}` starts before the stage declared ahead of it",
                stages[index + 1].id
            )));
        }
    }
    Ok(regions)
}

impl StageSequencer {
    pub fn build(stages: Vec<Stage>, baseline: &SceneState, layout: &ScrollLayout) -> ScrollyResult<Self> {
        let mut seen = HashSet::with_capacity(stages.len());
        for stage in &stages {
            if !seen.insert(stage.id.as_str()) {
                return Err(ScrollyError::InvalidData(format!(
                    "duplicate stage id `{}`",
                    stage.id
                )));
            }
        }

        let regions = resolve_regions(&stages, layout)?;

        let mut timelines = Vec::with_capacity(stages.len());
        let mut resting = Vec::with_capacity(stages.len() + 1);
        resting.push(baseline.clone());
        for stage in &stages {
            let previous = resting.last().cloned().unwrap_or_default();
            let timeline = CompiledTimeline::compile(&stage.timeline, &previous)?;
            let mut next = previous;
            next.overlay(timeline.end_state());
            timelines.push(timeline);
            resting.push(next);
        }

        validate_overlaps(&stages, &regions, &timelines)?;

        let conflicts = (0..stages.len())
            .map(|index| {
                (0..stages.len())
                    .filter(|other| {
                        *other != index
                            && shared_slot(&timelines[index], &timelines[*other]).is_some()
                    })
                    .collect()
            })
            .collect();

        debug!(
            stages = stages.len(),
            baseline_slots = baseline.len(),
            "built stage sequencer"
        );

        Ok(Self {
            runtime: vec![StageRuntime::default(); stages.len()],
            stages,
            regions,
            timelines,
            resting,
            conflicts,
            scroll_y: None,
        })
    }

    /// Re-resolves trigger regions after a layout change. Runtime progress is
    /// kept; the next `scroll_to` reconciles it with the new regions.
    pub fn relayout(&mut self, layout: &ScrollLayout) -> ScrollyResult<()> {
        let regions = resolve_regions(&self.stages, layout)?;
        validate_overlaps(&self.stages, &regions, &self.timelines)?;
        self.regions = regions;
        Ok(())
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_index(&self, id: &str) -> ScrollyResult<usize> {
        self.stages
            .iter()
            .position(|stage| stage.id == id)
            .ok_or_else(|| ScrollyError::UnknownStage(id.to_owned()))
    }

    #[must_use]
    pub fn region(&self, stage: usize) -> Option<ScrollRegion> {
        self.regions.get(stage).copied()
    }

    #[must_use]
    pub fn timeline(&self, stage: usize) -> Option<&CompiledTimeline> {
        self.timelines.get(stage)
    }

    /// Scene values once the first `completed` stages have finished.
    #[must_use]
    pub fn resting_state(&self, completed: usize) -> Option<&SceneState> {
        self.resting.get(completed)
    }

    #[must_use]
    pub fn progress(&self, stage: usize) -> Option<f64> {
        self.runtime.get(stage).map(|runtime| runtime.progress)
    }

    #[must_use]
    pub fn playback(&self, stage: usize) -> Option<Playback> {
        self.runtime.get(stage).map(|runtime| runtime.playback)
    }

    #[must_use]
    pub fn scroll_y(&self) -> Option<f64> {
        self.scroll_y
    }

    /// True while a stage sits strictly between its edges or is playing.
    #[must_use]
    pub fn is_in_flight(&self, stage: usize) -> bool {
        self.runtime.get(stage).is_some_and(|runtime| {
            runtime.playback != Playback::Idle
                || (runtime.progress > 0.0 && runtime.progress < 1.0)
        })
    }

    #[must_use]
    pub fn phase(&self) -> SequencePhase {
        if self.runtime.iter().all(|runtime| runtime.progress >= 1.0) && !self.runtime.is_empty() {
            return SequencePhase::Settled;
        }
        self.runtime
            .iter()
            .rposition(|runtime| runtime.progress > 0.0)
            .map_or(SequencePhase::Unreached, SequencePhase::Stage)
    }

    /// Values of every slot the stage writes, at `progress`. Pure.
    #[must_use]
    pub fn values_at(&self, stage: usize, progress: f64) -> SceneState {
        self.timelines
            .get(stage)
            .map(|timeline| timeline.sample_progress(progress))
            .unwrap_or_default()
    }

    /// Values a step writes, or `None` for hook steps.
    #[must_use]
    pub fn step_values(&self, step: &SequencerStep) -> Option<SceneState> {
        match step {
            SequencerStep::CompleteAndYield { stage, edge } => {
                Some(self.values_at(*stage, edge.progress()))
            }
            SequencerStep::Apply {
                stage, progress, ..
            } => Some(self.values_at(*stage, *progress)),
            SequencerStep::RunHooks { .. } => None,
        }
    }

    /// Snaps `stage` to `edge` and stops its playhead.
    ///
    /// Stages sharing a slot with `stage` are completed first, to the edge
    /// that keeps scroll order, so the snapped values are the last written.
    pub fn complete_and_yield(
        &mut self,
        stage: usize,
        edge: Edge,
    ) -> ScrollyResult<Vec<SequencerStep>> {
        if stage >= self.stages.len() {
            return Err(ScrollyError::UnknownStage(format!(
                "#{stage} of {}",
                self.stages.len()
            )));
        }
        let mut steps = Vec::new();
        self.complete(stage, edge, &mut steps);
        Ok(steps)
    }

    fn yield_to(&mut self, writer: usize, steps: &mut Vec<SequencerStep>) {
        for other in self.conflicts[writer].clone() {
            let edge = if other < writer { Edge::End } else { Edge::Start };
            let runtime = self.runtime[other];
            if runtime.playback == Playback::Idle && runtime.progress == edge.progress() {
                continue;
            }
            debug!(
                writer = %self.stages[writer].id,
                yielding = %self.stages[other].id,
                ?edge,
                "forcing stage hand-off"
            );
            self.runtime[other].progress = edge.progress();
            self.runtime[other].playback = Playback::Idle;
            steps.push(SequencerStep::CompleteAndYield { stage: other, edge });
        }
    }

    fn run_hooks(&self, stage: usize, event: BoundaryEvent, steps: &mut Vec<SequencerStep>) {
        let hooks = self.stages[stage].hooks.for_event(event);
        if !hooks.is_empty() {
            steps.push(SequencerStep::RunHooks {
                stage,
                event,
                hooks: hooks.iter().copied().collect(),
            });
        }
    }

    fn write(&mut self, stage: usize, progress: f64, steps: &mut Vec<SequencerStep>) {
        self.yield_to(stage, steps);
        self.runtime[stage].progress = progress;
        steps.push(SequencerStep::Apply {
            stage,
            progress,
            in_flight: self.is_in_flight(stage),
        });
    }

    fn complete(&mut self, stage: usize, edge: Edge, steps: &mut Vec<SequencerStep>) {
        self.yield_to(stage, steps);
        self.runtime[stage].progress = edge.progress();
        self.runtime[stage].playback = Playback::Idle;
        steps.push(SequencerStep::CompleteAndYield { stage, edge });
    }

    fn advance_forward(&mut self, stage: usize, y: f64, steps: &mut Vec<SequencerStep>) {
        let region = self.regions[stage];
        let old = self.runtime[stage].side;
        let new = RegionSide::of(region, y);
        self.runtime[stage].side = new;

        if old == RegionSide::Before && new != RegionSide::Before {
            self.run_hooks(stage, BoundaryEvent::Enter, steps);
        }
        if old != RegionSide::After && new == RegionSide::After {
            self.run_hooks(stage, BoundaryEvent::Leave, steps);
            self.complete(stage, Edge::End, steps);
            return;
        }
        if new != RegionSide::Inside {
            return;
        }

        match self.stages[stage].mode {
            TriggerMode::Scrub => self.write(stage, region.progress(y), steps),
            TriggerMode::Discrete => {
                if old == RegionSide::Before {
                    self.runtime[stage].playback = Playback::Forward;
                    let progress = self.runtime[stage].progress;
                    self.write(stage, progress, steps);
                }
            }
        }
    }

    fn advance_backward(&mut self, stage: usize, y: f64, steps: &mut Vec<SequencerStep>) {
        let region = self.regions[stage];
        let old = self.runtime[stage].side;
        let new = RegionSide::of(region, y);
        self.runtime[stage].side = new;

        if old == RegionSide::After && new != RegionSide::After {
            self.run_hooks(stage, BoundaryEvent::EnterBack, steps);
        }
        if old != RegionSide::Before && new == RegionSide::Before {
            self.run_hooks(stage, BoundaryEvent::LeaveBack, steps);
            match self.stages[stage].mode {
                TriggerMode::Scrub => self.complete(stage, Edge::Start, steps),
                TriggerMode::Discrete => {
                    let runtime = self.runtime[stage];
                    if runtime.progress > 0.0 {
                        self.runtime[stage].playback = Playback::Reverse;
                        self.write(stage, runtime.progress, steps);
                    } else if runtime.playback != Playback::Idle {
                        // Entered but never advanced: cancel at the start.
                        self.complete(stage, Edge::Start, steps);
                    }
                }
            }
            return;
        }
        if new == RegionSide::Inside && self.stages[stage].mode == TriggerMode::Scrub {
            self.write(stage, region.progress(y), steps);
        }
    }

    /// Moves the scroll position and returns the steps to execute, in order.
    ///
    /// Forward motion visits stages in declaration order, backward motion in
    /// reverse. A region left in the scroll direction is completed to the
    /// edge it was left through. Calling twice with the same offset yields no
    /// steps on the second call.
    pub fn scroll_to(&mut self, y: f64) -> ScrollyResult<Vec<SequencerStep>> {
        if !y.is_finite() {
            return Err(ScrollyError::InvalidData(
                "scroll offset must be finite".to_owned(),
            ));
        }
        let previous = self.scroll_y.unwrap_or(f64::NEG_INFINITY);
        self.scroll_y = Some(y);

        let mut steps = Vec::new();
        if y > previous {
            for stage in 0..self.stages.len() {
                self.advance_forward(stage, y, &mut steps);
            }
        } else if y < previous {
            for stage in (0..self.stages.len()).rev() {
                self.advance_backward(stage, y, &mut steps);
            }
        }

        trace!(y, previous, steps = steps.len(), "scroll update");
        Ok(steps)
    }

    /// Advances discrete playheads by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Vec<SequencerStep> {
        let mut steps = Vec::new();
        if !dt.is_finite() || dt <= 0.0 {
            return steps;
        }

        for stage in 0..self.stages.len() {
            let playback = self.runtime[stage].playback;
            if playback == Playback::Idle {
                continue;
            }
            let duration = self.timelines[stage].duration();
            let delta = if duration > 0.0 { dt / duration } else { 1.0 };
            let progress = match playback {
                Playback::Forward => (self.runtime[stage].progress + delta).min(1.0),
                Playback::Reverse => (self.runtime[stage].progress - delta).max(0.0),
                Playback::Idle => continue,
            };

            if progress >= 1.0 {
                self.complete(stage, Edge::End, &mut steps);
            } else if progress <= 0.0 {
                self.complete(stage, Edge::Start, &mut steps);
            } else {
                self.write(stage, progress, &mut steps);
            }
        }
        steps
    }

    /// Completes every playing stage to the edge it is heading for.
    pub fn finish_playback(&mut self) -> Vec<SequencerStep> {
        let mut steps = Vec::new();
        for stage in 0..self.stages.len() {
            match self.runtime[stage].playback {
                Playback::Forward => self.complete(stage, Edge::End, &mut steps),
                Playback::Reverse => self.complete(stage, Edge::Start, &mut steps),
                Playback::Idle => {}
            }
        }
        steps
    }
}
