use std::time::Duration;

// Frame markers: #<iii>P<pppp>T<tttt>!
pub const FRAME_START: char = '#';
pub const PULSE_MARKER: char = 'P';
pub const DURATION_MARKER: char = 'T';
pub const FRAME_END: char = '!';
pub const FRAME_LEN: usize = 15;

// Input grammar
pub const PASSTHROUGH_PREFIX: &str = "C#";
pub const SET_DEFAULT_PREFIX: &str = "ct";
pub const SEGMENT_SEPARATOR: char = ';';
pub const FIELD_SEPARATOR: char = ',';

// Numeric bounds
pub const MAX_SERVO_ID: u16 = 999;
pub const PULSE_MIN_US: u32 = 500;
pub const PULSE_MAX_US: u32 = 2500;
pub const MIN_DURATION_MS: u32 = 1;
pub const MAX_DURATION_MS: u32 = 9999;
pub const DEFAULT_DURATION_MS: u32 = 1000;

// Timings
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);
pub const PORT_STABILIZE_DELAY: Duration = Duration::from_millis(100);
pub const SERIAL_TIMEOUT: Duration = Duration::from_secs(1);

// Serial defaults
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD: u32 = 115_200;
