use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::animation::Ease;
use crate::error::{ScrollyError, ScrollyResult};
use crate::render::{ElementId, PropertyKey, PropertyValue};

/// One writable slot of the scene: an element property.
pub type PropertySlot = (ElementId, PropertyKey);

/// Resolved property values, keyed by slot in first-write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneState {
    values: IndexMap<PropertySlot, PropertyValue>,
}

impl SceneState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, element: ElementId, key: PropertyKey, value: PropertyValue) {
        self.values.insert((element, key), value);
    }

    #[must_use]
    pub fn get(&self, element: &ElementId, key: PropertyKey) -> Option<&PropertyValue> {
        self.values.get(&(element.clone(), key))
    }

    #[must_use]
    pub fn slot(&self, slot: &PropertySlot) -> Option<&PropertyValue> {
        self.values.get(slot)
    }

    /// Writes every value of `other` over this state.
    pub fn overlay(&mut self, other: &SceneState) {
        for (slot, value) in &other.values {
            self.values.insert(slot.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertySlot, &PropertyValue)> {
        self.values.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Target value of one property across the tween's elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetValue {
    Uniform(PropertyValue),
    /// One value per target element, in target order.
    PerElement(Vec<PropertyValue>),
    /// Numeric offset from the value the element holds when the tween starts.
    Relative(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTarget {
    pub key: PropertyKey,
    pub value: TargetValue,
}

/// Where a tween starts inside its stage timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TweenPosition {
    /// Absolute offset from the stage start.
    At(f64),
    /// Offset from the end of the previous tween, stagger included.
    AfterPrevious(f64),
    /// Offset from the start of the previous tween.
    WithPrevious(f64),
    /// Offset of a named label.
    Label(String),
}

impl Default for TweenPosition {
    fn default() -> Self {
        Self::AfterPrevious(0.0)
    }
}

/// Declarative property transition for a group of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub targets: Vec<ElementId>,
    pub properties: SmallVec<[PropertyTarget; 4]>,
    pub duration: f64,
    pub ease: Ease,
    pub position: TweenPosition,
    /// Delay added per element, in target order.
    pub stagger: f64,
}

impl Tween {
    #[must_use]
    pub fn to<I, E>(targets: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ElementId>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            properties: SmallVec::new(),
            duration: 0.5,
            ease: Ease::default(),
            position: TweenPosition::default(),
            stagger: 0.0,
        }
    }

    #[must_use]
    pub fn set(mut self, key: PropertyKey, value: impl Into<PropertyValue>) -> Self {
        self.properties.push(PropertyTarget {
            key,
            value: TargetValue::Uniform(value.into()),
        });
        self
    }

    #[must_use]
    pub fn set_each(mut self, key: PropertyKey, values: Vec<PropertyValue>) -> Self {
        self.properties.push(PropertyTarget {
            key,
            value: TargetValue::PerElement(values),
        });
        self
    }

    #[must_use]
    pub fn shift(mut self, key: PropertyKey, delta: f64) -> Self {
        self.properties.push(PropertyTarget {
            key,
            value: TargetValue::Relative(delta),
        });
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    #[must_use]
    pub fn at(mut self, offset: f64) -> Self {
        self.position = TweenPosition::At(offset);
        self
    }

    #[must_use]
    pub fn after_previous(mut self, gap: f64) -> Self {
        self.position = TweenPosition::AfterPrevious(gap);
        self
    }

    #[must_use]
    pub fn with_previous(mut self, delta: f64) -> Self {
        self.position = TweenPosition::WithPrevious(delta);
        self
    }

    #[must_use]
    pub fn at_label(mut self, label: impl Into<String>) -> Self {
        self.position = TweenPosition::Label(label.into());
        self
    }

    #[must_use]
    pub fn stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    fn span(&self) -> f64 {
        self.duration + self.stagger * self.targets.len().saturating_sub(1) as f64
    }
}

/// Ordered tween list of one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpec {
    pub tweens: Vec<Tween>,
    pub labels: IndexMap<String, f64>,
}

impl TimelineSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tween(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    #[must_use]
    pub fn label(mut self, name: impl Into<String>, offset: f64) -> Self {
        self.labels.insert(name.into(), offset);
        self
    }

    pub fn push(&mut self, tween: Tween) {
        self.tweens.push(tween);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    from: PropertyValue,
    to: PropertyValue,
    start: f64,
    end: f64,
    ease: Ease,
}

impl Segment {
    fn progress(&self, t: f64) -> f64 {
        if t >= self.end && self.end > 0.0 {
            1.0
        } else if t <= self.start {
            0.0
        } else if self.end - self.start <= 0.0 {
            1.0
        } else {
            ((t - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SlotTrack {
    start_value: PropertyValue,
    segments: Vec<Segment>,
}

/// Timeline with resolved offsets and statically derived from-values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledTimeline {
    tracks: IndexMap<PropertySlot, SlotTrack>,
    duration: f64,
    start_state: SceneState,
    end_state: SceneState,
}

struct PendingSegment<'a> {
    element: ElementId,
    key: PropertyKey,
    target: &'a TargetValue,
    element_index: usize,
    start: f64,
    end: f64,
    ease: Ease,
    order: usize,
}

fn resolve_target(
    target: &TargetValue,
    element_index: usize,
    current: Option<&PropertyValue>,
    element: &ElementId,
    key: PropertyKey,
) -> ScrollyResult<PropertyValue> {
    match target {
        TargetValue::Uniform(value) => Ok(value.clone()),
        TargetValue::PerElement(values) => values.get(element_index).cloned().ok_or_else(|| {
            ScrollyError::InvalidData(format!(
                "missing per-element value for `{element}.{key}` at index {element_index}"
            ))
        }),
        TargetValue::Relative(delta) => {
            let base = current.and_then(PropertyValue::as_number).unwrap_or(0.0);
            Ok(PropertyValue::Number(base + delta))
        }
    }
}

impl CompiledTimeline {
    /// Resolves tween offsets, expands stagger into per-element segments, and
    /// replays them in time order over `base` to derive from-values.
    ///
    /// Segments starting at the same time keep declaration order.
    pub fn compile(spec: &TimelineSpec, base: &SceneState) -> ScrollyResult<Self> {
        let mut pending = Vec::new();
        let mut previous: Option<(f64, f64)> = None;
        let mut order = 0usize;

        for tween in &spec.tweens {
            if !tween.duration.is_finite() || tween.duration < 0.0 {
                return Err(ScrollyError::InvalidData(
                    "tween duration must be finite and >= 0".to_owned(),
                ));
            }
            if !tween.stagger.is_finite() || tween.stagger < 0.0 {
                return Err(ScrollyError::InvalidData(
                    "tween stagger must be finite and >= 0".to_owned(),
                ));
            }

            let start = match &tween.position {
                TweenPosition::At(offset) => *offset,
                TweenPosition::AfterPrevious(gap) => previous.map_or(0.0, |(_, end)| end) + gap,
                TweenPosition::WithPrevious(delta) => {
                    previous.map_or(0.0, |(start, _)| start) + delta
                }
                TweenPosition::Label(name) => *spec.labels.get(name).ok_or_else(|| {
                    ScrollyError::InvalidData(format!("unknown timeline label `{name}`"))
                })?,
            }
            .max(0.0);

            for (element_index, element) in tween.targets.iter().enumerate() {
                let element_start = start + tween.stagger * element_index as f64;
                for target in &tween.properties {
                    pending.push(PendingSegment {
                        element: element.clone(),
                        key: target.key,
                        target: &target.value,
                        element_index,
                        start: element_start,
                        end: element_start + tween.duration,
                        ease: tween.ease,
                        order,
                    });
                    order += 1;
                }
            }
            previous = Some((start, start + tween.span()));
        }

        pending.sort_by(|left, right| {
            left.start
                .total_cmp(&right.start)
                .then(left.order.cmp(&right.order))
        });

        let mut working = base.clone();
        let mut tracks: IndexMap<PropertySlot, SlotTrack> = IndexMap::new();
        let mut duration = 0.0_f64;

        for segment in pending {
            let slot = (segment.element.clone(), segment.key);
            let current = working.slot(&slot).cloned();
            let to = resolve_target(
                segment.target,
                segment.element_index,
                current.as_ref(),
                &segment.element,
                segment.key,
            )?;
            let from = current.unwrap_or_else(|| to.clone());

            tracks
                .entry(slot.clone())
                .or_insert_with(|| SlotTrack {
                    start_value: from.clone(),
                    segments: Vec::new(),
                })
                .segments
                .push(Segment {
                    from,
                    to: to.clone(),
                    start: segment.start,
                    end: segment.end,
                    ease: segment.ease,
                });
            working.set(slot.0, slot.1, to);
            duration = duration.max(segment.end);
        }

        let mut start_state = SceneState::new();
        let mut end_state = SceneState::new();
        for (slot, track) in &tracks {
            start_state.set(slot.0.clone(), slot.1, track.start_value.clone());
            if let Some(value) = working.slot(slot) {
                end_state.set(slot.0.clone(), slot.1, value.clone());
            }
        }

        trace!(
            tweens = spec.tweens.len(),
            slots = tracks.len(),
            duration,
            "compiled stage timeline"
        );

        Ok(Self {
            tracks,
            duration,
            start_state,
            end_state,
        })
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn start_state(&self) -> &SceneState {
        &self.start_state
    }

    #[must_use]
    pub fn end_state(&self) -> &SceneState {
        &self.end_state
    }

    pub fn touched(&self) -> impl Iterator<Item = &PropertySlot> {
        self.tracks.keys()
    }

    #[must_use]
    pub fn touches(&self, slot: &PropertySlot) -> bool {
        self.tracks.contains_key(slot)
    }

    /// Values of every touched slot at local time `t` seconds.
    #[must_use]
    pub fn sample(&self, t: f64) -> SceneState {
        let mut state = SceneState::new();
        for (slot, track) in &self.tracks {
            let value = track
                .segments
                .iter()
                .rev()
                .find_map(|segment| {
                    let progress = segment.progress(t);
                    (progress > 0.0).then(|| {
                        PropertyValue::interpolate(
                            &segment.from,
                            &segment.to,
                            segment.ease.apply(progress),
                        )
                    })
                })
                .unwrap_or_else(|| track.start_value.clone());
            state.set(slot.0.clone(), slot.1, value);
        }
        state
    }

    /// Values at normalized progress. `0` and `1` return the exact resting
    /// states, including for zero-length timelines.
    #[must_use]
    pub fn sample_progress(&self, progress: f64) -> SceneState {
        if progress >= 1.0 {
            self.end_state.clone()
        } else if progress <= 0.0 {
            self.start_state.clone()
        } else if self.duration <= 0.0 {
            self.end_state.clone()
        } else {
            self.sample(progress * self.duration)
        }
    }
}
