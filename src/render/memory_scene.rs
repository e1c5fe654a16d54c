use indexmap::IndexMap;
use tracing::trace;

use crate::error::{ScrollyError, ScrollyResult};
use crate::render::{ElementId, ElementKind, PropertyKey, PropertyValue, SceneAdapter};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    pub kind: ElementKind,
    pub properties: IndexMap<PropertyKey, PropertyValue>,
}

/// In-memory scene used by tests and headless engine usage.
///
/// Elements keep creation order so snapshots are stable.
#[derive(Debug, Default, Clone)]
pub struct MemoryScene {
    elements: IndexMap<ElementId, SceneElement>,
    write_count: usize,
}

impl MemoryScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&SceneElement> {
        self.elements.get(id)
    }

    pub fn elements(&self) -> impl Iterator<Item = (&ElementId, &SceneElement)> {
        self.elements.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of property writes since creation.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    #[must_use]
    pub fn number(&self, id: &str, key: PropertyKey) -> Option<f64> {
        self.property(&ElementId::new(id), key)
            .and_then(|value| value.as_number())
    }
}

impl SceneAdapter for MemoryScene {
    fn create_element(&mut self, id: &ElementId, kind: ElementKind) -> ScrollyResult<()> {
        if let Some(existing) = self.elements.get(id) {
            if existing.kind != kind {
                return Err(ScrollyError::InvalidData(format!(
                    "element `{id}` already exists as {:?}",
                    existing.kind
                )));
            }
            return Ok(());
        }
        self.elements.insert(
            id.clone(),
            SceneElement {
                kind,
                properties: IndexMap::new(),
            },
        );
        Ok(())
    }

    fn set_property(
        &mut self,
        id: &ElementId,
        key: PropertyKey,
        value: PropertyValue,
    ) -> ScrollyResult<()> {
        let element = self
            .elements
            .get_mut(id)
            .ok_or_else(|| ScrollyError::InvalidData(format!("unknown element `{id}`")))?;
        trace!(element = %id, property = %key, "set property");
        element.properties.insert(key, value);
        self.write_count += 1;
        Ok(())
    }

    fn property(&self, id: &ElementId, key: PropertyKey) -> Option<PropertyValue> {
        self.elements
            .get(id)
            .and_then(|element| element.properties.get(&key))
            .cloned()
    }

    fn has_element(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }
}
