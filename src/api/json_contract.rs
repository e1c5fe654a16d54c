use serde::{Deserialize, Serialize};

use crate::error::{ScrollyError, ScrollyResult};
use crate::render::SceneAdapter;

use super::{EngineSnapshot, ScrollyConfig, ScrollyEngine};

pub const ENGINE_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;
pub const SCROLLY_CONFIG_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: EngineSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollyConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: ScrollyConfig,
}

impl EngineSnapshot {
    pub fn to_json_contract_v1_pretty(&self) -> ScrollyResult<String> {
        let payload = EngineSnapshotJsonContractV1 {
            schema_version: ENGINE_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ScrollyError::InvalidData(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    /// Accepts both a bare snapshot and a versioned v1 payload.
    pub fn from_json_compat_str(input: &str) -> ScrollyResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<EngineSnapshot>(input) {
            return Ok(snapshot);
        }
        let payload: EngineSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ScrollyError::InvalidData(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != ENGINE_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(ScrollyError::InvalidData(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}

impl ScrollyConfig {
    pub fn to_json_contract_v1_pretty(&self) -> ScrollyResult<String> {
        let payload = ScrollyConfigJsonContractV1 {
            schema_version: SCROLLY_CONFIG_JSON_SCHEMA_V1,
            config: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ScrollyError::InvalidData(format!("failed to serialize config contract v1: {e}"))
        })
    }

    pub fn from_json_compat_str(input: &str) -> ScrollyResult<Self> {
        if let Ok(config) = serde_json::from_str::<ScrollyConfig>(input) {
            return Ok(config);
        }
        let payload: ScrollyConfigJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ScrollyError::InvalidData(format!("failed to parse config json payload: {e}"))
        })?;
        if payload.schema_version != SCROLLY_CONFIG_JSON_SCHEMA_V1 {
            return Err(ScrollyError::InvalidData(format!(
                "unsupported config schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.config)
    }
}

impl<S: SceneAdapter> ScrollyEngine<S> {
    pub fn snapshot_json_contract_v1_pretty(&self) -> ScrollyResult<String> {
        self.snapshot().to_json_contract_v1_pretty()
    }
}
