mod memory_scene;
mod primitives;

pub use memory_scene::{MemoryScene, SceneElement};
pub use primitives::{Color, ElementId, ElementKind, PropertyKey, PropertyValue};

use crate::error::ScrollyResult;

/// Contract implemented by any drawing surface.
///
/// The sequencer computes every interpolated value itself and only pushes
/// resolved properties through this trait, so surfaces never run their own
/// animation clocks.
pub trait SceneAdapter {
    /// Creates an element. Creating an existing element with the same kind is
    /// a no-op.
    fn create_element(&mut self, id: &ElementId, kind: ElementKind) -> ScrollyResult<()>;

    fn set_property(
        &mut self,
        id: &ElementId,
        key: PropertyKey,
        value: PropertyValue,
    ) -> ScrollyResult<()>;

    fn property(&self, id: &ElementId, key: PropertyKey) -> Option<PropertyValue>;

    fn has_element(&self, id: &ElementId) -> bool;
}
