//! Public engine surface: configuration, derived data, the default
//! narrative, and the `ScrollyEngine` facade that drives a scene.

mod data_loader;
mod engine;
mod engine_accessors;
mod engine_config;
mod engine_init;
mod engine_snapshot;
mod filter_controller;
mod json_contract;
pub mod narrative;
mod render_context;
mod scale_registry;
mod snapshot_controller;
mod step_executor;

pub use data_loader::{load_records_from_path, load_records_from_str, parse_interviews};
pub use engine::{LoadState, ScrollyEngine};
pub use engine_config::{DensityConfig, PaletteConfig, ScrollyConfig, StageAnchorConfig};
pub use engine_snapshot::{EngineSnapshot, StageSnapshot};
pub use filter_controller::{
    DENSITY_ELEMENT_IDS, DensityFilter, DensityPlot, FilterController, KDE_DENIED_ID,
    KDE_GRANTED_ID, KDE_NORMAL_ID, KDE_X_AXIS_ID, KDE_Y_AXIS_ID,
};
pub use json_contract::{
    ENGINE_SNAPSHOT_JSON_SCHEMA_V1, EngineSnapshotJsonContractV1, SCROLLY_CONFIG_JSON_SCHEMA_V1,
    ScrollyConfigJsonContractV1,
};
pub use narrative::{Narrative, SECTION_NAMES, SceneBlueprint, default_layout, default_stages, ids};
pub use render_context::RenderContext;
pub use scale_registry::{CanvasGeometry, HeadlineRow, PieLayout, ScaleRegistry};
