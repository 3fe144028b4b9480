//! Tagged-map wire shape for persisted keyed collections.
//!
//! Collections are stored as `{"dataType":"Map","value":[["key",value],...]}`
//! -- the shape existing save files carry. Entry order is preserved, and
//! value types round-trip faithfully (numbers stay numbers, strings stay
//! strings, nested containers survive).

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Tag value every encoded collection carries.
const MAP_TAG: &str = "Map";

/// Errors raised while encoding or decoding a tagged map.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected dataType \"Map\", got \"{0}\"")]
    WrongTag(String),
}

#[derive(serde::Serialize, serde::Deserialize)]
struct TaggedMap<K, V> {
    #[serde(rename = "dataType")]
    data_type: String,
    value: Vec<(K, V)>,
}

/// Encode entries into the tagged-map JSON text.
pub fn encode_map<K, V>(entries: &[(K, V)]) -> Result<String, CodecError>
where
    K: Serialize,
    V: Serialize,
{
    let tagged = TaggedMap {
        data_type: MAP_TAG.to_string(),
        value: entries.iter().map(|(k, v)| (k, v)).collect(),
    };
    Ok(serde_json::to_string(&tagged)?)
}

/// Decode tagged-map JSON text back into entries, preserving order.
pub fn decode_map<K, V>(text: &str) -> Result<Vec<(K, V)>, CodecError>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let tagged: TaggedMap<K, V> = serde_json::from_str(text)?;
    if tagged.data_type != MAP_TAG {
        return Err(CodecError::WrongTag(tagged.data_type));
    }
    Ok(tagged.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_round_trip() {
        let entries: Vec<(String, u32)> = vec![];
        let text = encode_map(&entries).unwrap();
        assert_eq!(text, r#"{"dataType":"Map","value":[]}"#);
        let back: Vec<(String, u32)> = decode_map(&text).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn numeric_values_round_trip() {
        let entries = vec![("Scrap".to_string(), 3u32), ("Steel".to_string(), 12u32)];
        let text = encode_map(&entries).unwrap();
        let back: Vec<(String, u32)> = decode_map(&text).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn entry_order_preserved() {
        let entries = vec![
            ("z".to_string(), 1u32),
            ("a".to_string(), 2u32),
            ("m".to_string(), 3u32),
        ];
        let back: Vec<(String, u32)> = decode_map(&encode_map(&entries).unwrap()).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn nested_map_values_round_trip() {
        // A map whose values are themselves tagged-map-shaped JSON values.
        let inner = serde_json::json!({"dataType": "Map", "value": [["Scrap", 1]]});
        let entries = vec![("refine-scrap".to_string(), inner.clone())];
        let text = encode_map(&entries).unwrap();
        let back: Vec<(String, serde_json::Value)> = decode_map(&text).unwrap();
        assert_eq!(back[0].1, inner);
    }

    #[test]
    fn wrong_tag_rejected() {
        let text = r#"{"dataType":"Set","value":[]}"#;
        let result: Result<Vec<(String, u32)>, _> = decode_map(text);
        assert!(matches!(result, Err(CodecError::WrongTag(tag)) if tag == "Set"));
    }

    #[test]
    fn malformed_json_rejected() {
        let result: Result<Vec<(String, u32)>, _> = decode_map("not json {{{");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }

    #[test]
    fn matches_existing_save_shape() {
        // Verbatim text from an existing save file.
        let text = r#"{"dataType":"Map","value":[["Scrap",3]]}"#;
        let back: Vec<(String, u32)> = decode_map(text).unwrap();
        assert_eq!(back, vec![("Scrap".to_string(), 3)]);
    }
}
