// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of inbound command payloads.
//!
//! Decoding never fails: every payload maps to a definite on/off command.
//! The interpretations are tried in a fixed priority order:
//!
//! 1. JSON object with a `val` field → truthiness of `val`
//! 2. Literal `false` / `true`
//! 3. Text starting with an integer → nonzero is on
//! 4. Anything else → off for text, non-empty for binary

use serde_json::Value;

/// How an inbound payload was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedCommand {
    /// A JSON object carrying a `val` field.
    Structured(bool),
    /// The literal text `true` or `false`.
    LiteralBool(bool),
    /// Text beginning with a decimal integer.
    NumericString(i64),
    /// Payload matched none of the above.
    Fallback(bool),
}

impl DecodedCommand {
    /// Interprets a raw payload.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Self {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(payload)
            && let Some(val) = map.get("val")
        {
            return Self::Structured(truthy(val));
        }

        match payload {
            b"false" => return Self::LiteralBool(false),
            b"true" => return Self::LiteralBool(true),
            _ => {}
        }

        match std::str::from_utf8(payload) {
            Ok(text) => leading_integer(text).map_or(Self::Fallback(false), Self::NumericString),
            Err(_) => Self::Fallback(!payload.is_empty()),
        }
    }

    /// Returns the command as an output level.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match *self {
            Self::Structured(on) | Self::LiteralBool(on) | Self::Fallback(on) => on,
            Self::NumericString(n) => n != 0,
        }
    }
}

/// Decodes an inbound payload into an output level.
///
/// # Examples
///
/// ```
/// use pi2mqtt::payload::decode_command;
///
/// assert!(decode_command(br#"{"val":1}"#));
/// assert!(decode_command(b"true"));
/// assert!(decode_command(b"42"));
/// assert!(!decode_command(b"0"));
/// assert!(!decode_command(b"on"));
/// ```
#[must_use]
pub fn decode_command(payload: &[u8]) -> bool {
    let decoded = DecodedCommand::parse(payload);
    tracing::trace!(?decoded, "Decoded command payload");
    decoded.as_bool()
}

/// Extracts a numeric reading from a plain or structured payload.
///
/// Returns `None` when the payload carries no number.
#[must_use]
pub fn decode_reading(payload: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(payload).ok()?;
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => map.get("val").and_then(Value::as_f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// JSON truthiness: `false`, `null`, zero and the empty string are false;
/// everything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses the integer at the start of `text`, after optional leading
/// whitespace and sign. Trailing garbage is ignored (`"12abc"` is 12).
/// Values beyond the `i64` range saturate.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude = rest[..digits].bytes().fold(0_i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
