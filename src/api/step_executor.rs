use tracing::trace;

use crate::error::{ScrollyError, ScrollyResult};
use crate::render::SceneAdapter;
use crate::sequencer::SequencerStep;

use super::ScrollyEngine;

pub(super) struct StepExecutor;

impl StepExecutor {
    /// Runs sequencer steps in order: hooks go to the filter controller,
    /// value steps are written to the scene.
    ///
    /// A value step may only write a slot held by another stage once that
    /// stage has stopped; anything else is a hand-off violation.
    pub(super) fn execute<S: SceneAdapter>(
        engine: &mut ScrollyEngine<S>,
        steps: Vec<SequencerStep>,
    ) -> ScrollyResult<()> {
        let ScrollyEngine {
            scene,
            context,
            sequencer,
            filter,
            owners,
            ..
        } = engine;
        let (Some(context), Some(sequencer)) = (context.as_ref(), sequencer.as_ref()) else {
            return Ok(());
        };

        for step in steps {
            let (stage, in_flight) = match &step {
                SequencerStep::RunHooks { hooks, .. } => {
                    for hook in hooks {
                        filter.apply_hook(*hook, context, scene)?;
                    }
                    continue;
                }
                SequencerStep::Apply {
                    stage, in_flight, ..
                } => (*stage, *in_flight),
                SequencerStep::CompleteAndYield { stage, .. } => (*stage, false),
            };

            let Some(values) = sequencer.step_values(&step) else {
                continue;
            };
            for (slot, value) in values.iter() {
                if let Some(&owner) = owners.get(slot)
                    && owner != stage
                    && sequencer.is_in_flight(owner)
                {
                    let stages = sequencer.stages();
                    return Err(ScrollyError::StageHandoffViolation {
                        writer: stages[stage].id.clone(),
                        owner: stages[owner].id.clone(),
                        element: slot.0.to_string(),
                        property: slot.1.to_string(),
                    });
                }
                scene.set_property(&slot.0, slot.1, value.clone())?;
                if in_flight {
                    owners.insert(slot.clone(), stage);
                } else if owners.get(slot) == Some(&stage) {
                    owners.remove(slot);
                }
            }
            trace!(stage, in_flight, slots = values.len(), "applied stage values");
        }
        Ok(())
    }
}
