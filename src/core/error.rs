use thiserror::Error;

use crate::core::types::{AttackId, BodyId, BodypartId, WoundId};
use crate::expression::EvalError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Corrupted prototype data. Fatal at load time.
    #[error("Body graph integrity violation in {prototype}: {reason}")]
    GraphIntegrity { prototype: String, reason: String },

    /// Every bodypart of the target is severed.
    #[error("No valid hit location on body {0}")]
    NoValidTarget(BodyId),

    #[error("Could not evaluate {formula} formula of {attack}: {source}")]
    ExpressionEvaluation {
        attack: String,
        formula: &'static str,
        #[source]
        source: EvalError,
    },

    #[error("Body {0} is locked by another mutation")]
    ConcurrentMutationConflict(BodyId),

    #[error("Body not found: {0}")]
    BodyNotFound(BodyId),

    #[error("Body {0} is already live")]
    DuplicateBody(BodyId),

    #[error("Snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("{1} not found on {0}")]
    WoundNotFound(BodyId, WoundId),

    #[error("Bodypart {0} not found")]
    BodypartNotFound(BodypartId),

    #[error("Unknown attack: {0}")]
    UnknownAttack(AttackId),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl EngineError {
    /// Errors that degrade a single attack into a miss instead of halting anything.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::NoValidTarget(_)
                | EngineError::ExpressionEvaluation { .. }
                | EngineError::ConcurrentMutationConflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let body = BodyId::new();
        assert!(EngineError::NoValidTarget(body).is_recoverable());
        assert!(EngineError::ConcurrentMutationConflict(body).is_recoverable());
        assert!(!EngineError::GraphIntegrity {
            prototype: "humanoid".into(),
            reason: "cycle".into(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_graph_error_message() {
        let err = EngineError::GraphIntegrity {
            prototype: "humanoid".into(),
            reason: "bodypart 3 is its own ancestor".into(),
        };
        assert_eq!(
            err.to_string(),
            "Body graph integrity violation in humanoid: bodypart 3 is its own ancestor"
        );
    }
}
