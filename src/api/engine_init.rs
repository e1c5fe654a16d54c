use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::{Record, normalize_records};
use crate::error::{ScrollyError, ScrollyResult};
use crate::render::{ElementId, ElementKind, PropertyKey, PropertyValue, SceneAdapter};
use crate::sequencer::StageSequencer;

use super::narrative::ids;
use super::{
    FilterController, LoadState, Narrative, RenderContext, ScrollyConfig, ScrollyEngine,
    default_layout, load_records_from_path, parse_interviews,
};

impl<S: SceneAdapter> ScrollyEngine<S> {
    /// Creates an engine bound to `scene` and validates `config`.
    ///
    /// Only the load status element exists until records are loaded.
    pub fn new(mut scene: S, config: ScrollyConfig) -> ScrollyResult<Self> {
        config.validate()?;

        let status = ElementId::new(ids::LOAD_STATUS);
        scene.create_element(&status, ElementKind::Text)?;
        scene.set_property(&status, PropertyKey::Visible, PropertyValue::Visible(false))?;

        let layout = default_layout(f64::from(config.viewport.height));
        debug!(
            width = config.viewport.width,
            height = config.viewport.height,
            "created scrolly engine"
        );

        Ok(Self {
            scene,
            config,
            layout,
            load_state: LoadState::Empty,
            context: None,
            sequencer: None,
            filter: FilterController::new(),
            owners: HashMap::new(),
        })
    }

    /// Loads the bulk record export from a JSON string.
    ///
    /// A failure leaves the engine in [`LoadState::Failed`] with the status
    /// element visible, and is also returned to the caller.
    pub fn load_json(&mut self, input: &str) -> ScrollyResult<()> {
        let records = parse_interviews(input);
        self.finish_load(records)
    }

    pub fn load_path(&mut self, path: impl AsRef<Path>) -> ScrollyResult<()> {
        let records = load_records_from_path(path).map(|rows| normalize_records(&rows));
        self.finish_load(records)
    }

    /// Loads already-normalized records.
    pub fn load_records(&mut self, records: Vec<Record>) -> ScrollyResult<()> {
        self.finish_load(Ok(records))
    }

    fn finish_load(&mut self, records: ScrollyResult<Vec<Record>>) -> ScrollyResult<()> {
        let installed = records.and_then(|records| {
            if records.is_empty() {
                return Err(ScrollyError::LoadFailure(
                    "record export holds no interviews".to_owned(),
                ));
            }
            self.install(records)
        });

        let status = ElementId::new(ids::LOAD_STATUS);
        match installed {
            Ok(()) => {
                self.scene
                    .set_property(&status, PropertyKey::Visible, PropertyValue::Visible(false))?;
                self.load_state = LoadState::Ready;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                warn!(error = %message, "record load failed");
                self.scene.set_property(
                    &status,
                    PropertyKey::Text,
                    PropertyValue::Text(format!("failed to load: {message}")),
                )?;
                self.scene
                    .set_property(&status, PropertyKey::Visible, PropertyValue::Visible(true))?;
                self.load_state = LoadState::Failed(message);
                Err(err)
            }
        }
    }

    /// Derives everything from `records` and writes the baseline scene.
    fn install(&mut self, records: Vec<Record>) -> ScrollyResult<()> {
        let context = RenderContext::build(self.config.clone(), records)?;
        let narrative = Narrative::build(&context)?;
        let sequencer =
            StageSequencer::build(narrative.stages, narrative.blueprint.baseline(), &self.layout)?;

        for (id, kind) in narrative.blueprint.elements() {
            if !self.scene.has_element(id) {
                self.scene.create_element(id, kind)?;
            }
        }
        for (slot, value) in narrative.blueprint.baseline().iter() {
            self.scene.set_property(&slot.0, slot.1, value.clone())?;
        }
        FilterController::create_elements(&mut self.scene)?;

        debug!(
            records = context.records.len(),
            elements = narrative.blueprint.len(),
            stages = sequencer.len(),
            "installed narrative"
        );

        self.filter = FilterController::new();
        self.owners.clear();
        self.context = Some(context);
        self.sequencer = Some(sequencer);
        Ok(())
    }
}
