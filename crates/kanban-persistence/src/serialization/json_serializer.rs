use kanban_core::{KanbanError, KanbanResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON encoding for the board documents (layout, card meta, user registry)
pub struct JsonSerializer;

impl JsonSerializer {
    /// Pretty-printed so board files stay readable and diffable
    pub fn serialize<T: Serialize>(data: &T) -> KanbanResult<Vec<u8>> {
        serde_json::to_vec_pretty(data).map_err(|e| KanbanError::Serialization(e.to_string()))
    }

    pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> KanbanResult<T> {
        serde_json::from_slice(bytes).map_err(|e| KanbanError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_domain::CardMeta;

    #[test]
    fn test_pretty_print() {
        let serialized = JsonSerializer::serialize(&CardMeta::default()).unwrap();
        let json_str = String::from_utf8(serialized).unwrap();

        assert!(json_str.contains("\"comments\""));
        assert!(json_str.contains("\"revisions\""));
        assert!(json_str.contains('\n'));
    }

    #[test]
    fn test_deserialize_error_is_serialization() {
        let err = JsonSerializer::deserialize::<CardMeta>(b"{ not json").unwrap_err();
        assert!(matches!(err, KanbanError::Serialization(_)));
    }
}
