use thiserror::Error;

pub type ScrollyResult<T> = Result<T, ScrollyError>;

#[derive(Debug, Error)]
pub enum ScrollyError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("failed to load records: {0}")]
    LoadFailure(String),

    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("unknown stage `{0}`")]
    UnknownStage(String),

    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    #[error("stages `{first}` and `{second}` overlap in scroll range and both write `{element}.{property}`")]
    StageConflict {
        first: String,
        second: String,
        element: String,
        property: String,
    },

    #[error("stage `{writer}` wrote `{element}.{property}` while stage `{owner}` was still in flight")]
    StageHandoffViolation {
        writer: String,
        owner: String,
        element: String,
        property: String,
    },
}
