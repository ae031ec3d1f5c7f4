mod constants;
mod types;
mod codec;
mod parser;
mod controller;
mod transport;

pub use codec::{decode_reply, encode_move, strip_passthrough, Frame, PassthroughError};
pub use controller::{Controller, Outcome};
pub use parser::{parse_line, parse_segment, Diagnostic, Field, ParsedItem, ParsedLine, SegmentError};
pub use transport::{BusTransport, SerialConfig, SerialTransport, TransportError};
pub use types::{ExitKeyword, InvalidDefault, MoveCommand, PassthroughCommand, SessionState, SetDefaultCommand};

// Re-export commonly used items
pub use constants::{DEFAULT_BAUD, DEFAULT_DURATION_MS, DEFAULT_PORT, FRAME_LEN, SETTLE_DELAY};
