//! Interactive console driving a robot session.
//!
//! Reads one command per line and prints what the session reports:
//!
//! ```text
//! PLACE 1,2      place the robot facing NORTH
//! MOVE           step forward (ignored at the edge)
//! LEFT / RIGHT   quarter turns
//! REPORT         print x,y,DIRECTION
//! HISTORY [n]    print the persisted history, newest first
//! CLEAR          clear the last error and report
//! HELP           list commands
//! QUIT           leave
//! ```
//!
//! Every command waits for its save to finish, so a persistence error is
//! printed right after the command that caused it. Errors are read from the
//! session's event stream, so a failure repeating the previous message is
//! still printed.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use toyrobot_domain::Command;
use toyrobot_session::{EventReceiver, Outcome, RobotSession};
use toyrobot_store::{HistoryQuery, RobotRepository};

use crate::error::DaemonResult;

const HELP: &str = "\
Commands:
  PLACE x,y     place the robot at (x, y) facing NORTH
  MOVE          move one cell forward
  LEFT          turn 90 degrees counter-clockwise
  RIGHT         turn 90 degrees clockwise
  REPORT        print the robot position
  HISTORY [n]   print the last n persisted states (all when omitted)
  CLEAR         clear the last error and report
  HELP          show this help
  QUIT          exit";

/// One console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Robot(Command),
    History(Option<u32>),
    Clear,
    Help,
    Quit,
    Blank,
}

/// Parse a console line.
///
/// Returns the message to print for an unrecognised line.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ConsoleCommand::Blank);
    };

    match verb.to_uppercase().as_str() {
        "HISTORY" => match (words.next(), words.next()) {
            (None, _) => Ok(ConsoleCommand::History(None)),
            (Some(n), None) => n
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=HistoryQuery::MAX_LIMIT).contains(n))
                .map(|n| ConsoleCommand::History(Some(n)))
                .ok_or_else(|| {
                    format!("HISTORY expects a count between 1 and {}", HistoryQuery::MAX_LIMIT)
                }),
            _ => Err("HISTORY takes at most one argument".to_string()),
        },
        "CLEAR" => Ok(ConsoleCommand::Clear),
        "HELP" | "?" => Ok(ConsoleCommand::Help),
        "QUIT" | "EXIT" => Ok(ConsoleCommand::Quit),
        _ => line
            .parse::<Command>()
            .map(ConsoleCommand::Robot)
            .map_err(|e| format!("{} (type HELP for commands)", e)),
    }
}

/// Run the console until `QUIT` or end of input.
///
/// Issues the session's startup fetch first (unless already issued) and
/// announces a restored robot.
pub async fn run_console<S, R, W>(session: &RobotSession<S>, input: R, mut output: W) -> DaemonResult<()>
where
    S: RobotRepository + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = session.subscribe();

    if session.initialize() {
        session.flush().await;
        if let Some(robot) = session.robot() {
            write_line(&mut output, &format!("Restored robot at {}", robot)).await?;
        }
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(message) => {
                write_line(&mut output, &message).await?;
                continue;
            },
        };
        debug!(?command, "Console command");

        // Only failures caused by this line are printed
        events.drain();

        match command {
            ConsoleCommand::Blank => {},
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => write_line(&mut output, HELP).await?,
            ConsoleCommand::Clear => {
                session.clear_error();
                session.clear_report();
            },
            ConsoleCommand::History(limit) => {
                let query = limit.map_or_else(HistoryQuery::all, HistoryQuery::latest);
                let records = session.history(query).await;
                let failed = print_store_failures(&mut events, &mut output).await?;
                if records.is_empty() && !failed {
                    write_line(&mut output, "No history").await?;
                }
                for record in records {
                    let line = format!(
                        "#{} {} {}",
                        record.id,
                        record.state,
                        record.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                    write_line(&mut output, &line).await?;
                }
            },
            ConsoleCommand::Robot(command) => {
                let outcome = session.execute(command);
                session.flush().await;

                if let Outcome::Rejected(e) = &outcome {
                    write_line(&mut output, &format!("Error: {}", e)).await?;
                    continue;
                }
                if command == Command::Report && outcome.is_applied() {
                    write_line(&mut output, &session.last_report()).await?;
                }
                print_store_failures(&mut events, &mut output).await?;
            },
        }
    }

    output.flush().await?;
    Ok(())
}

/// Print one `Error:` line per failed store call queued on `events`.
///
/// Returns whether anything was printed.
async fn print_store_failures<W: AsyncWrite + Unpin>(
    events: &mut EventReceiver,
    output: &mut W,
) -> DaemonResult<bool> {
    let mut printed = false;
    for event in events.drain() {
        if let Some(message) = event.store_failure() {
            write_line(output, &format!("Error: {}", message)).await?;
            printed = true;
        }
    }
    Ok(printed)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> DaemonResult<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
