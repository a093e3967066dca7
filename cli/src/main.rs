mod error;
mod session;


use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use frames::{Point, ServerMessage, StrokeStyle, Tool, UserRecord, now_ms};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::CliError;
use crate::session::{Encoding, Session, SessionOptions, ws_url};

#[derive(Parser, Debug)]
#[command(name = "whiteboard", about = "Collaborative whiteboard relay CLI")]
struct Cli {
    #[arg(long, env = "WHITEBOARD_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// User id to join as. A random one is generated when absent.
    #[arg(long, env = "WHITEBOARD_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "WHITEBOARD_USER_COLOR", default_value = "#1e88e5")]
    user_color: String,

    /// Frame encoding for websocket sessions.
    #[arg(long, value_enum, default_value_t = Encoding::Json)]
    encoding: Encoding,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check relay health.
    Ping,
    Room(RoomCommand),
    /// Join a room and print every relay event as a JSON line.
    Watch(WatchArgs),
    /// Join a room and draw a synthetic stroke.
    Draw(DrawArgs),
    /// Join a room and clear its canvas.
    Clear { room_id: String },
}

#[derive(Args, Debug)]
struct RoomCommand {
    #[command(subcommand)]
    command: RoomSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoomSubcommand {
    Create { room_id: String },
    Exists { room_id: String },
}

#[derive(Args, Debug)]
struct WatchArgs {
    room_id: String,

    #[arg(long, help = "Exit after this many events")]
    max_events: Option<usize>,
}

#[derive(Args, Debug)]
struct DrawArgs {
    room_id: String,

    #[arg(long, default_value_t = 20)]
    points: u32,

    #[arg(long, value_parser = parse_tool, default_value = "pen")]
    tool: Tool,

    #[arg(long, default_value = "#000000")]
    color: String,

    #[arg(long, default_value_t = 4.0)]
    line_width: f64,

    /// Distance between successive samples, in world units.
    #[arg(long, default_value_t = 5.0)]
    step: f64,

    #[arg(long, default_value_t = 10)]
    interval_ms: u64,

    /// Undo the stroke once it is drawn.
    #[arg(long, default_value_t = false)]
    undo: bool,

    #[arg(long, default_value_t = 5)]
    max_attempts: u32,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    user: UserRecord,
    encoding: Encoding,
}

impl CliContext {
    fn session_options(&self, room_id: &str, max_attempts: Option<u32>) -> Result<SessionOptions, CliError> {
        Ok(SessionOptions {
            ws_url: ws_url(&self.base_url)?,
            room_id: room_id.to_owned(),
            user: self.user.clone(),
            encoding: self.encoding,
            tick: Duration::from_millis(15),
            max_attempts,
        })
    }
}

fn parse_tool(raw: &str) -> Result<Tool, CliError> {
    serde_json::from_value(Value::String(raw.to_owned())).map_err(|_| CliError::InvalidTool(raw.to_owned()))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
        user: UserRecord::new(cli.user_id.unwrap_or_else(|| format!("cli-{}", Uuid::new_v4())), cli.user_color),
        encoding: cli.encoding,
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Room(room) => run_room(&ctx, room).await,
        Command::Watch(args) => run_watch(&ctx, args).await,
        Command::Draw(args) => run_draw(&ctx, args).await,
        Command::Clear { room_id } => run_clear(&ctx, &room_id).await,
    }
}

// =============================================================================
// HTTP COMMANDS
// =============================================================================

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", ctx.base_url.trim_end_matches('/'));
    let response = reqwest::Client::new().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            context: format!("HTTP {}", status.as_u16()),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_room(ctx: &CliContext, room: RoomCommand) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let base = ctx.base_url.trim_end_matches('/');
    let response = match room.command {
        RoomSubcommand::Create { room_id } => {
            client.post(format!("{base}/api/rooms")).json(&serde_json::json!({ "id": room_id })).send().await?
        }
        RoomSubcommand::Exists { room_id } => client.get(format!("{base}/api/rooms/{room_id}/exists")).send().await?,
    };

    let status = response.status();
    let body = response.text().await?;
    let value = room_response(status.as_u16(), &body)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Interpret a room endpoint reply. Error statuses may carry an empty body.
fn room_response(status: u16, body: &str) -> Result<Value, CliError> {
    if !(200..300).contains(&status) {
        let message = if body.is_empty() { "no details".to_owned() } else { body.to_owned() };
        return Err(CliError::ServerError { context: format!("HTTP {status}"), message });
    }
    Ok(serde_json::from_str(body)?)
}

// =============================================================================
// SESSION COMMANDS
// =============================================================================

async fn run_watch(ctx: &CliContext, args: WatchArgs) -> Result<(), CliError> {
    let mut session = Session::new(ctx.session_options(&args.room_id, None)?);
    session.connect().await?;

    let mut seen = 0_usize;
    loop {
        let msg = match session.step().await {
            Ok(Some(msg)) => msg,
            Ok(None) => continue,
            Err(err) if err.is_disconnect() => {
                session.reconnect(err).await?;
                continue;
            }
            Err(err) => return Err(err),
        };
        print_event(&msg)?;
        seen = seen.saturating_add(1);
        if args.max_events.is_some_and(|max| seen >= max) {
            break;
        }
    }
    session.close().await
}

async fn run_draw(ctx: &CliContext, args: DrawArgs) -> Result<(), CliError> {
    let mut session = Session::new(ctx.session_options(&args.room_id, Some(args.max_attempts))?);
    session.connect().await?;

    let style = StrokeStyle { tool: args.tool, color: args.color.clone(), line_width: args.line_width, ..StrokeStyle::default() };
    let actions = session.engine_mut().set_style(style);
    session.dispatch(actions).await?;

    let interval = Duration::from_millis(args.interval_ms);
    let actions = session.engine_mut().begin_stroke(Point::new(0.0, 0.0), now_ms());
    session.dispatch(actions).await?;
    let stroke_id = session.engine().active_stroke().map(|d| d.id.clone());

    for i in 1..args.points {
        session.pause(interval).await?;
        let actions = session.engine_mut().extend_stroke(sample_at(i, args.step), now_ms());
        session.dispatch(actions).await?;
    }
    let actions = session.engine_mut().end_stroke();
    session.dispatch(actions).await?;

    if args.undo {
        let actions = session.engine_mut().undo();
        session.dispatch(actions).await?;
    }

    // Let the last frames drain before leaving.
    session.pause(Duration::from_millis(100)).await?;
    let points = stroke_id.as_deref().and_then(|id| session.engine().drawings().get(id)).map_or(0, |d| d.points.len());
    info!(stroke = ?stroke_id, points, "stroke drawn");
    println!("{}", serde_json::json!({ "id": stroke_id, "points": points }));
    session.close().await
}

async fn run_clear(ctx: &CliContext, room_id: &str) -> Result<(), CliError> {
    let mut session = Session::new(ctx.session_options(room_id, Some(3))?);
    session.connect().await?;
    let actions = session.engine_mut().clear_canvas();
    session.dispatch(actions).await?;
    session.pause(Duration::from_millis(100)).await?;
    println!("cleared {room_id}");
    session.close().await
}

/// Point `i` of a gentle sine path along the x axis.
fn sample_at(i: u32, step: f64) -> Point {
    let x = f64::from(i) * step;
    Point::new(x, (x / 40.0).sin() * 20.0)
}

fn print_event(msg: &ServerMessage) -> Result<(), CliError> {
    println!("{}", frames::to_json(msg)?);
    Ok(())
}
