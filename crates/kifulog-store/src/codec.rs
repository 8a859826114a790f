//! Text encoding for stored values.
//!
//! A stored value is the protobuf wire encoding of a message, wrapped in
//! standard padded base64 so collection files stay plain text. Line breaks
//! inside the base64 text are skipped on decode; older tooling wrapped its
//! output every 60 columns.

use crate::error::DecodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;

/// Encode a message into its stored text form.
pub fn encode<M: Message>(message: &M) -> String {
    STANDARD.encode(message.encode_to_vec())
}

/// Decode stored text into a message of type `M`.
///
/// Fails with [`DecodeError::Text`] if the value is not base64, or with
/// [`DecodeError::Message`] if the bytes are not a valid `M`.
pub fn decode<M: Message + Default>(value: &str) -> Result<M, DecodeError> {
    let bytes = if value.contains(|c| c == '\n' || c == '\r') {
        let joined: String = value.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        STANDARD.decode(joined)?
    } else {
        STANDARD.decode(value)?
    };
    Ok(M::decode(bytes.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, prost::Message)]
    struct Sample {
        #[prost(string, tag = "1")]
        id: String,
        #[prost(int64, tag = "2")]
        start_ts: i64,
        #[prost(string, repeated, tag = "3")]
        players: Vec<String>,
    }

    fn sample() -> Sample {
        Sample {
            id: "1500000000:alice-bob".to_string(),
            start_ts: 1_500_000_000,
            players: vec!["alice".to_string(), "bob".to_string()],
        }
    }

    #[test]
    fn test_decode_encoded_value() {
        let encoded = encode(&sample());
        let decoded: Sample = decode(&encoded).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_empty_message_encodes_to_empty_text() {
        assert_eq!(encode(&Sample::default()), "");
        let decoded: Sample = decode("").unwrap();
        assert_eq!(decoded, Sample::default());
    }

    #[test]
    fn test_decode_ignores_wrapped_lines() {
        let encoded = encode(&sample());
        let mut wrapped = String::new();
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 10 == 0 {
                wrapped.push('\n');
            }
            wrapped.push(c);
        }
        wrapped.push_str("\r\n");

        let decoded: Sample = decode(&wrapped).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_invalid_base64_is_text_error() {
        let err = decode::<Sample>("not*base64!").unwrap_err();
        assert!(matches!(err, DecodeError::Text(_)), "got {err:?}");
    }

    #[test]
    fn test_invalid_message_is_message_error() {
        // Field 1 claims 5 bytes of string data but only 1 follows.
        let value = STANDARD.encode([0x0a, 0x05, b'a']);
        let err = decode::<Sample>(&value).unwrap_err();
        assert!(matches!(err, DecodeError::Message(_)), "got {err:?}");
    }
}
