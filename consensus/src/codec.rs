//! Binary encoding of consensus payloads

use crate::errors::{ConsensusError, ConsensusResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> ConsensusResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ConsensusError::Encode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ConsensusResult<T> {
    bincode::deserialize(bytes).map_err(|e| ConsensusError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_core::{ToBroadcast, ValidationResult};

    #[test]
    fn test_garbage_is_rejected() {
        let result: ConsensusResult<ToBroadcast> = decode(&[1, 2, 3]);
        assert!(matches!(result, Err(ConsensusError::Decode(_))));
    }

    #[test]
    fn test_encode_decode() {
        let bytes = encode(&ValidationResult::fail("stale")).unwrap();
        let decoded: ValidationResult = decode(&bytes).unwrap();
        assert_eq!(decoded.message, "stale");
    }
}
