use std::fmt;

use crate::store::StoreError;

use super::SessionState;

/// Reasons a verification session could not assemble or use its parameters.
#[derive(Debug)]
pub enum SessionError {
    /// A byte buffer does not have the size mandated for its type.
    MalformedInput {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// The engine accepted the size but rejected the content.
    Deserialization { field: &'static str },
    /// The verification key could not be read.
    Store(StoreError),
    /// The epoch starts at height 0, so there is no previous epoch end.
    EpochStartUnderflow { epoch: u32 },
    /// The previous epoch's last block is not on the active chain.
    MissingChainEntry { height: u64 },
    /// Operation not allowed in the session's current state.
    InvalidState {
        op: &'static str,
        state: SessionState,
    },
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e)
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MalformedInput {
                field,
                expected,
                found,
            } => write!(
                f,
                "failed to deserialize \"{field}\": expected vector of size {expected}, \
                 found vector of size {found} instead"
            ),
            SessionError::Deserialization { field } => {
                write!(f, "failed to deserialize \"{field}\"")
            }
            SessionError::Store(e) => write!(f, "failed to load \"sc_vk\": {e}"),
            SessionError::EpochStartUnderflow { epoch } => {
                write!(f, "epoch {epoch} starts at height 0, no previous epoch end block")
            }
            SessionError::MissingChainEntry { height } => {
                write!(f, "no block at height {height} on the active chain")
            }
            SessionError::InvalidState { op, state } => {
                write!(f, "{op}() not allowed in session state {state:?}")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(e) => Some(e),
            _ => None,
        }
    }
}
