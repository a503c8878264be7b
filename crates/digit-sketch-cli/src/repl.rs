//! Interactive drawing shell.
//!
//! Launch with `digit-sketch repl`. Strokes are entered as surface
//! coordinates, `/predict` classifies the drawing. Type `/help` for
//! available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use digit_sketch::{save_png, ModelStatus, Point};

use crate::presenter;
use crate::session::PadSession;
use crate::types::CliError;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/down", "Put the pen down at x y"),
    ("/move", "Draw to x y"),
    ("/up", "Lift the pen"),
    ("/line", "Draw a line x1 y1 x2 y2"),
    ("/clear", "Clear the drawing"),
    ("/predict", "Classify the drawing"),
    ("/preview", "Show the 28x28 model input"),
    ("/save", "Save the drawing as PNG"),
    ("/model", "Load an ONNX model"),
    ("/status", "Show model status"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// Commands whose names start with `prefix`.
fn command_candidates(prefix: &str) -> Vec<Pair> {
    COMMANDS
        .iter()
        .filter(|(cmd, _)| cmd.starts_with(prefix))
        .map(|(cmd, desc)| Pair {
            display: format!("{cmd:<12} {desc}"),
            replacement: format!("{cmd} "),
        })
        .collect()
}

/// File extension offered when completing the argument of `cmd`.
fn argument_extension(cmd: &str) -> Option<&'static str> {
    match cmd {
        "/model" => Some("onnx"),
        "/save" => Some("png"),
        _ => None,
    }
}

/// Sorted names in `dir` with extension `ext` that start with `prefix`.
fn file_candidates(dir: &std::path::Path, ext: &str, prefix: &str) -> Vec<Pair> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| Pair {
            replacement: format!("{name} "),
            display: name,
        })
        .collect()
}

/// Completes command names, then `.onnx`/`.png` files for `/model` and `/save`.
#[derive(Default)]
struct SketchHelper;

impl Completer for SketchHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        let Some((cmd, arg)) = input.split_once(' ') else {
            return Ok((0, command_candidates(input)));
        };
        let Some(ext) = argument_extension(cmd) else {
            return Ok((pos, Vec::new()));
        };
        let arg_start = pos - arg.len();
        Ok((
            arg_start,
            file_candidates(std::path::Path::new("."), ext, arg.trim_start()),
        ))
    }
}

impl Hinter for SketchHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos != line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .map(|(cmd, _)| *cmd)
            .find(|cmd| cmd.len() > line.len() && cmd.starts_with(line))
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for SketchHelper {}
impl Validator for SketchHelper {}
impl Helper for SketchHelper {}

/// Tab accepts a visible hint, otherwise lists completions.
struct TabKey;

impl ConditionalEventHandler for TabKey {
    fn handle(&self, _: &Event, _: RepeatCount, _: bool, ctx: &EventContext<'_>) -> Option<Cmd> {
        Some(if ctx.has_hint() {
            Cmd::CompleteHint
        } else {
            Cmd::Complete
        })
    }
}

/// Parse exactly `count` whitespace-separated coordinates.
fn parse_coords(args: &str, count: usize) -> Result<Vec<f32>, String> {
    let values = args
        .split_whitespace()
        .map(|s| {
            s.parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{s}' is not a number"))
        })
        .collect::<Result<Vec<f32>, String>>()?;
    if values.len() != count {
        return Err(format!("expected {count} numbers, got {}", values.len()));
    }
    Ok(values)
}

/// Load a model in the background so drawing can start right away.
fn spawn_load(session: &PadSession, path: String) {
    eprintln!("  \x1b[90m{}\x1b[0m {path}", presenter::LOADING);
    let loader = session.clone();
    tokio::spawn(async move {
        let outcome = loader.load_model(&path).await;
        let status = loader.status().await;
        eprintln!("\n  {}", presenter::load_outcome_line(&outcome, &status));
    });
}

/// Run the interactive REPL.
///
/// Must be called from a multi-threaded runtime; line editing blocks the
/// current worker.
pub async fn run(session: PadSession, model_path: String) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mdigit-sketch v{}\x1b[0m \x1b[90m: handwritten digit recognition\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    spawn_load(&session, model_path);
    eprintln!("  {}", presenter::DRAW_PROMPT);

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<SketchHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(SketchHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabKey)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".digit_sketch_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mdigit>\x1b[0m ";

    loop {
        match tokio::task::block_in_place(|| rl.readline(prompt)) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let mut parts = input.splitn(2, ' ');
                let cmd = parts.next().unwrap_or("");
                let args = parts.next().unwrap_or("").trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "down" => cmd_down(&session, args).await,
                    "move" => cmd_move(&session, args).await,
                    "up" => session.stop_stroke().await,
                    "line" => cmd_line(&session, args).await,
                    "clear" => {
                        session.clear().await;
                        eprintln!("  {}", presenter::DRAW_PROMPT);
                    }
                    "predict" => cmd_predict(&session).await,
                    "preview" => {
                        let features = session.features().await;
                        eprint!("{}", presenter::render_preview(&features));
                    }
                    "save" => cmd_save(&session, args).await,
                    "model" => cmd_model(&session, args),
                    "status" => cmd_status(&session).await,
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Coordinates are pixels on the drawing surface, origin top-left.");
    eprintln!();
}

async fn cmd_down(session: &PadSession, args: &str) {
    match parse_coords(args, 2) {
        Ok(v) => session.start_stroke(Point::new(v[0], v[1])).await,
        Err(e) => eprintln!("  Usage: /down <x> <y> ({e})"),
    }
}

async fn cmd_move(session: &PadSession, args: &str) {
    match parse_coords(args, 2) {
        Ok(v) => session.continue_stroke(Point::new(v[0], v[1])).await,
        Err(e) => eprintln!("  Usage: /move <x> <y> ({e})"),
    }
}

async fn cmd_line(session: &PadSession, args: &str) {
    match parse_coords(args, 4) {
        Ok(v) => {
            session
                .line(Point::new(v[0], v[1]), Point::new(v[2], v[3]))
                .await
        }
        Err(e) => eprintln!("  Usage: /line <x1> <y1> <x2> <y2> ({e})"),
    }
}

async fn cmd_predict(session: &PadSession) {
    eprintln!("  \x1b[90m{}\x1b[0m", presenter::PREDICTING);
    match session.predict().await {
        Ok(prediction) => {
            eprintln!();
            for line in presenter::render_text(&prediction).lines() {
                eprintln!("  {line}");
            }
            eprintln!();
        }
        Err(CliError::ModelBusy) => {
            eprintln!("  {}", CliError::ModelBusy);
        }
        Err(e) => eprintln!("  {}", presenter::prediction_error_line(&e)),
    }
}

async fn cmd_save(session: &PadSession, args: &str) {
    let Some(path) = args.split_whitespace().next() else {
        eprintln!("  Usage: /save <file.png>");
        return;
    };
    let surface = session.snapshot().await;
    match save_png(&surface, path) {
        Ok(()) => eprintln!("  Saved: {path}"),
        Err(e) => eprintln!("  Failed to save: {e}"),
    }
}

fn cmd_model(session: &PadSession, args: &str) {
    let Some(path) = args.split_whitespace().next() else {
        eprintln!("  Usage: /model <file.onnx>");
        return;
    };
    if session.is_busy() {
        eprintln!("  {}", CliError::ModelBusy);
        return;
    }
    spawn_load(session, path.to_string());
}

async fn cmd_status(session: &PadSession) {
    if session.is_busy() {
        eprintln!("  Model busy (loading or predicting)");
        return;
    }
    let status = session.status().await;
    eprintln!("  {}", presenter::status_line(&status));
    if let ModelStatus::NotLoaded = status {
        eprintln!("  Use /model <file.onnx> to load one.");
    }
    if session.snapshot().await.is_blank() {
        eprintln!("  {}", presenter::DRAW_PROMPT);
    }
}
