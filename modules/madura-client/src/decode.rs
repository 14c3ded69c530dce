use madura_common::parse_literal;
use serde_json::Value;
use tracing::{debug, warn};

/// Outcome of decoding a response body. `Text` means nothing parsed and callers
/// should treat the text as an error indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Structured(Value),
    Text(String),
}

/// Decode a body that should be JSON but may be a Python repr of the same data.
/// Never fails: strict JSON, then JSON over the cleaned-up text, then the literal
/// parser, then the raw text.
pub fn decode_body(body: &[u8]) -> Decoded {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => return Decoded::Structured(value),
        Err(e) => debug!(error = %e, "Response body is not strict JSON, reading as text"),
    }

    let text = String::from_utf8_lossy(body).into_owned();
    let cleaned = text.trim_start_matches('\u{feff}').trim();

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => {
            debug!("Response text parsed as JSON after cleanup");
            return Decoded::Structured(value);
        }
        Err(e) => debug!(error = %e, "Response text is not JSON, trying literal parser"),
    }

    match parse_literal(cleaned) {
        Ok(value) => {
            debug!("Response text decoded as a Python literal");
            Decoded::Structured(value)
        }
        Err(e) => {
            warn!(
                error = %e,
                len = text.len(),
                "Response body could not be decoded, keeping raw text"
            );
            Decoded::Text(text)
        }
    }
}
