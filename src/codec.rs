use crate::constants::*;
use std::fmt;

/// A single move frame, always `FRAME_LEN` ASCII bytes.
///
/// ```text
/// #  iii  P  pppp  T  tttt  !
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassthroughError {
    #[error("missing \"C#\" prefix")]
    MissingPrefix,
    #[error("missing \"!\" terminator")]
    MissingTerminator,
}

/// Build a move frame, clamping every field so the fixed widths hold.
pub fn encode_move(id: u32, pulse: u32, duration: u32) -> Frame {
    let id = id.min(MAX_SERVO_ID as u32);
    let pulse = pulse.clamp(PULSE_MIN_US, PULSE_MAX_US);
    let duration = duration.clamp(MIN_DURATION_MS, MAX_DURATION_MS);

    Frame(format!(
        "{FRAME_START}{id:03}{PULSE_MARKER}{pulse:04}{DURATION_MARKER}{duration:04}{FRAME_END}"
    ))
}

/// Returns true if `input` opens with the passthrough prefix, ignoring case.
pub(crate) fn has_passthrough_prefix(input: &str) -> bool {
    input
        .get(..PASSTHROUGH_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PASSTHROUGH_PREFIX))
}

/// Validate a `C#...!` wrapper and drop the leading `C`, leaving the wire payload.
pub fn strip_passthrough(input: &str) -> Result<&str, PassthroughError> {
    if !has_passthrough_prefix(input) {
        return Err(PassthroughError::MissingPrefix);
    }
    if !input.ends_with(FRAME_END) {
        return Err(PassthroughError::MissingTerminator);
    }
    Ok(&input[1..])
}

/// Best-effort ASCII decode of reply bytes; anything non-ASCII is dropped.
pub fn decode_reply(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}
