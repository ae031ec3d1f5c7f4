use crate::{
    codec::{decode_reply, encode_move, strip_passthrough, Frame},
    constants::SETTLE_DELAY,
    parser::{parse_line, Diagnostic, ParsedItem},
    transport::{BusTransport, TransportError},
    types::{MoveCommand, PassthroughCommand, SessionState},
};
use std::fmt;
use tokio::time::Duration;
use tracing::debug;

/// Result of dispatching one parsed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent(Frame),
    DefaultUpdated(u32),
    Passthrough {
        payload: String,
        reply: Option<String>,
    },
    Skipped(Diagnostic),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Sent(frame) => write!(f, "Sent -> {}", frame),
            Outcome::DefaultUpdated(value) => write!(f, "Default time set to: {} ms", value),
            Outcome::Passthrough { payload, reply } => {
                write!(f, "C# sent -> {}", payload)?;
                if let Some(reply) = reply {
                    write!(f, "\nResponse: {}", reply)?;
                }
                Ok(())
            }
            Outcome::Skipped(diagnostic) => write!(f, "{}", diagnostic),
        }
    }
}

pub struct Controller<T> {
    transport: T,
    state: SessionState,
    settle_delay: Duration,
}

impl<T: BusTransport> Controller<T> {
    pub fn new(transport: T) -> Self {
        Self::with_state(transport, SessionState::new())
    }

    pub fn with_state(transport: T, state: SessionState) -> Self {
        Controller {
            transport,
            state,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn default_duration(&self) -> u32 {
        self.state.default_duration()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Parse a line against the current default and dispatch every item in
    /// order. Stops at the first transport failure.
    pub async fn process_line(&mut self, line: &str) -> Result<Vec<Outcome>, TransportError> {
        let mut outcomes = Vec::new();
        for item in parse_line(line, self.default_duration()) {
            outcomes.push(self.dispatch(item).await?);
        }
        Ok(outcomes)
    }

    pub async fn dispatch(&mut self, item: ParsedItem) -> Result<Outcome, TransportError> {
        match item {
            ParsedItem::Move(cmd) => self.send_command(cmd).await.map(Outcome::Sent),
            ParsedItem::SetDefault(cmd) => Ok(match self.state.set_default(cmd.value as i64) {
                Ok(value) => Outcome::DefaultUpdated(value),
                Err(_) => Outcome::Skipped(Diagnostic::InvalidDefault {
                    raw: cmd.value.to_string(),
                }),
            }),
            ParsedItem::Passthrough(cmd) => self.forward(cmd).await,
            ParsedItem::Skipped(diagnostic) => Ok(Outcome::Skipped(diagnostic)),
        }
    }

    async fn send_command(&mut self, cmd: MoveCommand) -> Result<Frame, TransportError> {
        let frame = cmd.frame();
        self.write_frame(&frame).await?;
        Ok(frame)
    }

    /// Encode and write a single move, clamping out-of-range values.
    pub async fn send_move(&mut self, id: u32, pulse: u32, duration: u32) -> Result<Frame, TransportError> {
        let frame = encode_move(id, pulse, duration);
        self.write_frame(&frame).await?;
        Ok(frame)
    }

    async fn write_frame(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.transport.write(frame.as_bytes()).await?;
        debug!(frame = %frame, "move sent");
        Ok(())
    }

    /// Forward a raw `C#...!` command and collect any reply.
    pub async fn send_passthrough(&mut self, raw: &str) -> Result<Outcome, TransportError> {
        match strip_passthrough(raw.trim()) {
            Ok(payload) => {
                self.forward(PassthroughCommand {
                    payload: payload.to_string(),
                })
                .await
            }
            Err(reason) => Ok(Outcome::Skipped(Diagnostic::InvalidPassthrough { reason })),
        }
    }

    async fn forward(&mut self, cmd: PassthroughCommand) -> Result<Outcome, TransportError> {
        self.transport.write(cmd.payload.as_bytes()).await?;
        debug!(payload = %cmd.payload, "passthrough sent");

        tokio::time::sleep(self.settle_delay).await;

        let mut reply = String::new();
        let mut received = 0usize;
        while self.transport.bytes_available().await? > 0 {
            let chunk = self.transport.read_available().await?;
            if chunk.is_empty() {
                break;
            }
            received += chunk.len();
            reply.push_str(&decode_reply(&chunk));
        }
        debug!(received, decoded = reply.len(), "passthrough reply drained");

        Ok(Outcome::Passthrough {
            payload: cmd.payload,
            reply: (!reply.is_empty()).then_some(reply),
        })
    }
}
