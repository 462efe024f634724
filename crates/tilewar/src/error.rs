//! Unified error type for the Tilewar server.

use std::path::PathBuf;

use tilewar_protocol::ProtocolError;
use tilewar_room::RoomError;

use crate::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each layer's variant lets `?` convert
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TilewarError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// A config or map file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config or map file is not valid JSON for its type.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No saved map has this id.
    #[error("unknown map {0}")]
    UnknownMap(String),

    /// A map document broke validation rules.
    #[error("map {map_id} is invalid: {}", errors.join("; "))]
    InvalidMap { map_id: String, errors: Vec<String> },

    /// An environment variable held an unusable value.
    #[error("invalid {name}: {reason}")]
    Env { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_protocol::AccessCode;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let tilewar_err: TilewarError = err.into();
        assert!(matches!(tilewar_err, TilewarError::Protocol(_)));
        assert!(tilewar_err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(AccessCode(1234));
        let tilewar_err: TilewarError = err.into();
        assert!(matches!(tilewar_err, TilewarError::Room(_)));
    }

    #[test]
    fn test_invalid_map_lists_every_rule() {
        let err = TilewarError::InvalidMap {
            map_id: "m".into(),
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "map m is invalid: a; b");
    }
}
