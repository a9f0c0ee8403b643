//! playmeterctl - Operator command line for playmeterd
//!
//! Every subcommand is one request over the daemon socket, except `watch`
//! which subscribes and prints events until interrupted.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use playmeter_api::{
    Command, Event, EventPayload, HistoryOrder, ImagePayload, ResponsePayload,
    ServiceStateSnapshot, SessionRecord, Stats, TerminalState, TerminalView,
};
use playmeter_imaging::{decode, encode};
use playmeter_ipc::IpcClient;
use playmeter_util::{TerminalId, default_socket_path, format_clock_time, format_elapsed};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// playmeterctl - Control the playmeterd service
#[derive(Parser, Debug)]
#[command(name = "playmeterctl")]
#[command(about = "Control the playmeterd service", long_about = None)]
struct Args {
    /// Socket path (or set PLAYMETER_SOCKET env var)
    #[arg(short, long, env = "PLAYMETER_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Show terminals, the hourly rate and totals
    Status,
    /// Start a session on an idle terminal
    Start { terminal: u32 },
    /// Stop the session on an occupied terminal and print the bill
    Stop { terminal: u32 },
    /// Set the hourly rate
    Rate { rate: f64 },
    /// Show finished sessions, newest first
    History,
    /// Show total sessions and revenue
    Stats,
    /// Remove all finished sessions
    Clear,
    /// Print live events until interrupted
    Watch,
    /// Edit an image with a text instruction
    EditImage {
        /// Input image file, or a `data:<mime>;base64,...` URL
        input: String,
        /// What to change
        instruction: String,
        /// Where to write the result
        #[arg(short, long, default_value = "edited.png")]
        output: PathBuf,
        /// Print the result as a data URL instead of writing a file
        #[arg(long)]
        data_url: bool,
    },
    /// Check that the service is responding
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to playmeterd at {:?}", args.socket))?;
    debug!(socket = %args.socket.display(), "Connected");

    match args.command {
        Cmd::Status => match client.call(Command::GetState).await? {
            ResponsePayload::State(state) => print!("{}", render_state(&state)),
            other => bail!("Unexpected response: {:?}", other),
        },

        Cmd::Start { terminal } => {
            let terminal_id = TerminalId::new(terminal);
            match client.call(Command::StartSession { terminal_id }).await? {
                ResponsePayload::SessionStarted { started_at, .. } => {
                    println!(
                        "Terminal {} started at {}",
                        terminal_id,
                        format_clock_time(started_at)
                    );
                }
                other => bail!("Unexpected response: {:?}", other),
            }
        }

        Cmd::Stop { terminal } => {
            let terminal_id = TerminalId::new(terminal);
            match client.call(Command::StopSession { terminal_id }).await? {
                ResponsePayload::SessionStopped(record) => println!("{}", render_bill(&record)),
                other => bail!("Unexpected response: {:?}", other),
            }
        }

        Cmd::Rate { rate } => match client.call(Command::SetHourlyRate { rate }).await? {
            ResponsePayload::HourlyRateSet { rate } => println!("Hourly rate set to {:.2}", rate),
            other => bail!("Unexpected response: {:?}", other),
        },

        Cmd::History => match client
            .call(Command::GetHistory {
                order: HistoryOrder::NewestFirst,
            })
            .await?
        {
            ResponsePayload::History { records } => {
                if records.is_empty() {
                    println!("No finished sessions");
                }
                for record in &records {
                    println!("{}", render_history_line(record));
                }
            }
            other => bail!("Unexpected response: {:?}", other),
        },

        Cmd::Stats => match client.call(Command::GetStats).await? {
            ResponsePayload::Stats(stats) => println!("{}", render_stats(&stats)),
            other => bail!("Unexpected response: {:?}", other),
        },

        Cmd::Clear => match client.call(Command::ClearHistory).await? {
            ResponsePayload::HistoryCleared { removed } => {
                println!("Removed {} session(s)", removed)
            }
            other => bail!("Unexpected response: {:?}", other),
        },

        Cmd::Watch => {
            let mut events = client.subscribe().await?;
            loop {
                let event = events.next().await?;
                if let Some(line) = render_event(&event) {
                    println!("{}", line);
                }
                if matches!(event.payload, EventPayload::Shutdown) {
                    break;
                }
            }
        }

        Cmd::EditImage {
            input,
            instruction,
            output,
            data_url,
        } => {
            let image = load_image(&input)?;

            match client.call(Command::EditImage { image, instruction }).await? {
                ResponsePayload::ImageEdited(edited) if data_url => {
                    println!("{}", edited.to_data_url());
                }
                ResponsePayload::ImageEdited(edited) => {
                    let bytes = decode(&edited)?;
                    std::fs::write(&output, &bytes)
                        .with_context(|| format!("Failed to write image {:?}", output))?;
                    println!(
                        "Wrote {} ({}, {} bytes)",
                        output.display(),
                        edited.mime_type,
                        bytes.len()
                    );
                }
                other => bail!("Unexpected response: {:?}", other),
            }
        }

        Cmd::Ping => match client.call(Command::Ping).await? {
            ResponsePayload::Pong => println!("pong"),
            other => bail!("Unexpected response: {:?}", other),
        },
    }

    Ok(())
}

/// Read an edit input from a data URL or an image file
fn load_image(input: &str) -> Result<ImagePayload> {
    if input.starts_with("data:") {
        return ImagePayload::from_data_url(input)
            .context("Malformed data URL, expected data:<mime>;base64,<data>");
    }

    let path = Path::new(input);
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {:?}", path))?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(encode(mime_type.essence_str(), &bytes))
}

fn render_terminal(view: &TerminalView) -> String {
    match view.state {
        TerminalState::Idle => format!("{:>3}  {:<20} idle", view.terminal_id.get(), view.name),
        TerminalState::Occupied => format!(
            "{:>3}  {:<20} {}  {:.2}",
            view.terminal_id.get(),
            view.name,
            format_elapsed(view.elapsed_ms),
            view.projected_cost
        ),
    }
}

fn render_state(state: &ServiceStateSnapshot) -> String {
    let mut out = format!(
        "Hourly rate: {:.2} {}\n",
        state.hourly_rate, state.currency
    );
    for view in &state.terminals {
        out.push_str(&render_terminal(view));
        out.push('\n');
    }
    out.push_str(&format!(
        "Active: {}  {}\n",
        state.active_terminals,
        render_stats(&state.stats)
    ));
    out
}

fn render_bill(record: &SessionRecord) -> String {
    format!(
        "{}: {} ({:.1} min), amount due {:.2}",
        record.terminal_name(),
        format_elapsed(record.duration_ms()),
        record.duration_minutes(),
        record.cost()
    )
}

fn render_history_line(record: &SessionRecord) -> String {
    format!(
        "{}-{}  {:<20} {:>8.1} min  {:>10.2}",
        format_clock_time(record.started_at()),
        format_clock_time(record.ended_at()),
        record.terminal_name(),
        record.duration_minutes(),
        record.cost()
    )
}

fn render_stats(stats: &Stats) -> String {
    format!(
        "Sessions: {}  Revenue: {:.2}",
        stats.total_sessions, stats.total_revenue
    )
}

fn render_event(event: &Event) -> Option<String> {
    match &event.payload {
        EventPayload::SessionStarted { name, .. } => Some(format!("started  {}", name)),
        EventPayload::SessionEnded(record) => Some(format!("stopped  {}", render_bill(record))),
        EventPayload::Tick { readings } => Some(
            readings
                .iter()
                .map(|r| {
                    format!(
                        "[{}] {} {:.2}",
                        r.terminal_id,
                        format_elapsed(r.elapsed_ms),
                        r.projected_cost
                    )
                })
                .collect::<Vec<_>>()
                .join("  "),
        ),
        EventPayload::HourlyRateChanged { rate } => Some(format!("rate     {:.2}", rate)),
        EventPayload::HistoryCleared { removed } => Some(format!("cleared  {}", removed)),
        EventPayload::Shutdown => Some("playmeterd shut down".to_string()),
        EventPayload::StateChanged(_) => None,
    }
}
