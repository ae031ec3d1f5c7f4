mod logging;

use bus_servo::{
    parse_line, Controller, ExitKeyword, SerialConfig, SerialTransport, SessionState, TransportError,
    DEFAULT_BAUD, DEFAULT_DURATION_MS, DEFAULT_PORT, SETTLE_DELAY,
};
use clap::Parser;
use std::io::{self, BufRead, Write};
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{error, warn};

use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "bus-servo", version, about = "Interactive bus servo controller")]
struct Cli {
    /// Serial device the servo bus is attached to.
    #[arg(long, env = "BUS_SERVO_PORT", default_value = DEFAULT_PORT)]
    port: String,

    /// Serial baud rate.
    #[arg(long, env = "BUS_SERVO_BAUD", default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Move duration (ms) used when a command omits it.
    #[arg(
        long,
        env = "BUS_SERVO_DEFAULT_DURATION",
        default_value_t = DEFAULT_DURATION_MS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    default_duration: u32,

    /// Wait (ms) after a passthrough write before reading the reply.
    #[arg(long, env = "BUS_SERVO_SETTLE_MS", default_value_t = SETTLE_DELAY.as_millis() as u64)]
    settle_ms: u64,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: LogLevel,
}

fn print_banner() {
    let exits: Vec<String> = ExitKeyword::iter().map(|k| k.to_string()).collect();
    println!("{}", "=".repeat(50));
    println!("Bus servo controller");
    println!("{}", "=".repeat(50));
    println!("Commands:");
    println!("  move:         <id>,<pulse_us>[,<time_ms>]");
    println!("                e.g. 0,1640,1000  (servo 0 to 1640us over 1000ms)");
    println!("  multiple:     0,1500;1,2000  (separated by ';')");
    println!("  default time: ct<value>  (e.g. ct500)");
    println!("  passthrough:  C#...!  (e.g. C#000PRAD1500!)");
    println!("  exit:         {}", exits.join(" / "));
    println!("{}", "=".repeat(50));
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Lines are read on a plain thread; a pending read never holds up runtime shutdown.
fn spawn_line_reader<R: BufRead + Send + 'static>(reader: R) -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

async fn run_line(controller: &mut Controller<SerialTransport>, line: &str) -> Result<(), TransportError> {
    for item in parse_line(line, controller.default_duration()) {
        let outcome = controller.dispatch(item).await?;
        println!("{}", outcome);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    print_banner();

    let config = SerialConfig {
        port: cli.port,
        baud: cli.baud,
    };
    let transport = match SerialTransport::open(&config).await {
        Ok(transport) => transport,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    println!("Serial port open: {} @ {} baud", transport.name(), config.baud);

    let mut controller = Controller::with_state(transport, SessionState::with_default(cli.default_duration))
        .with_settle_delay(Duration::from_millis(cli.settle_ms));

    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()));
    println!("\nReady: enter a command");

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted, exiting...");
                break;
            }
        };

        let line = match line {
            Some(Ok(line)) => line,
            None => break,
            Some(Err(err)) => {
                error!(error = %err, "failed to read input");
                break;
            }
        };

        if ExitKeyword::matches(&line) {
            println!("Exiting...");
            break;
        }

        tokio::select! {
            result = run_line(&mut controller, &line) => {
                if let Err(err) = result {
                    error!(error = %err, "command not delivered");
                    println!("Transport error: {err}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(line = %line, "interrupted, remaining commands dropped");
                println!("\nInterrupted");
            }
        }
    }

    controller.into_transport().close();
    println!("Serial port closed");
}
