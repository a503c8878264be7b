//! digit-sketch: handwritten digit recognition from the terminal.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use digit_sketch::{save_png, surface_from_source, Canvas, GestureScript, Prediction};

use digit_sketch_cli::config::{ignored_size_flags, resolve_model_path, surface_config};
use digit_sketch_cli::presenter;
use digit_sketch_cli::session::PadSession;
use digit_sketch_cli::types::CliResult;

#[derive(Parser)]
#[command(
    name = "digit-sketch",
    about = "Classify hand-drawn digits with an ONNX model",
    version
)]
struct Cli {
    /// Path to the ONNX digit model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Drawing surface width in pixels (ignored by `predict`, which uses the image size).
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Drawing surface height in pixels (ignored by `predict`, which uses the image size).
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Pen stroke width in pixels.
    #[arg(long, global = true)]
    line_width: Option<f32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a drawing stored as an image file or data URL.
    Predict {
        /// Image file (PNG, JPEG, ...) or `data:image/...;base64,` URL.
        /// Light strokes on a dark background.
        image: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replay a recorded gesture script onto a fresh canvas.
    Replay {
        /// Gesture script (JSON).
        script: String,

        /// Save the resulting drawing as PNG.
        #[arg(long)]
        save: Option<String>,

        /// Only draw, do not classify.
        #[arg(long)]
        no_predict: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load the model and print its input/output metadata as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   digit-sketch completions bash > ~/.local/share/bash-completion/completions/digit-sketch
    ///   digit-sketch completions zsh > ~/.zfunc/_digit-sketch
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch the interactive drawing shell (default).
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let model_path = resolve_model_path(cli.model.as_deref());
    let config = surface_config(cli.width, cli.height, cli.line_width);

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "digit-sketch", &mut std::io::stdout());
        }

        Commands::Repl => {
            let session = PadSession::new(config)?;
            digit_sketch_cli::repl::run(session, model_path).await?;
        }

        command => {
            let result = match command {
                Commands::Predict { image, json } => {
                    for flag in ignored_size_flags(cli.width, cli.height) {
                        tracing::warn!("{flag} has no effect on predict; the image sets the size");
                    }
                    cmd_predict(&image, json, &model_path, config.line_width).await
                }
                Commands::Replay {
                    script,
                    save,
                    no_predict,
                    json,
                } => {
                    cmd_replay(&script, save.as_deref(), no_predict, json, &model_path, config)
                        .await
                }
                Commands::Info => cmd_info(&model_path, config).await,
                Commands::Completions { .. } | Commands::Repl => Ok(()),
            };

            if let Err(e) = result {
                eprintln!("Error: {e}");
                std::process::exit(e.exit_code());
            }
        }
    }

    Ok(())
}

fn print_prediction(prediction: &Prediction, source: &str, json: bool) -> CliResult<()> {
    if json {
        println!("{}", presenter::render_json(prediction, source)?);
    } else {
        print!("{}", presenter::render_text(prediction));
    }
    Ok(())
}

async fn cmd_predict(image: &str, json: bool, model_path: &str, line_width: f32) -> CliResult<()> {
    let surface = surface_from_source(image, line_width)?;
    let session = PadSession::with_canvas(Canvas::from_surface(surface));
    session.load_model(model_path).await?;
    let prediction = session.predict().await?;
    let source = if image.starts_with("data:") {
        "data URL"
    } else {
        image
    };
    print_prediction(&prediction, source, json)
}

async fn cmd_replay(
    script_path: &str,
    save: Option<&str>,
    no_predict: bool,
    json: bool,
    model_path: &str,
    config: digit_sketch::SurfaceConfig,
) -> CliResult<()> {
    let script = GestureScript::from_file(script_path)?;
    let session = PadSession::new(config)?;
    let stats = session.replay(&script).await;
    tracing::info!(
        "Replayed {} events ({} strokes, {} dropped)",
        stats.applied,
        stats.strokes,
        stats.dropped
    );

    if let Some(path) = save {
        save_png(&session.snapshot().await, path)?;
        eprintln!("Saved: {path}");
    }

    if no_predict {
        return Ok(());
    }

    session.load_model(model_path).await?;
    let prediction = session.predict().await?;
    print_prediction(&prediction, script_path, json)
}

async fn cmd_info(model_path: &str, config: digit_sketch::SurfaceConfig) -> CliResult<()> {
    let session = PadSession::new(config)?;
    let info = session.load_model(model_path).await?;
    let report = serde_json::json!({
        "model_path": model_path,
        "model": info,
        "resolved_input_shape": info.resolved_input_shape().ok(),
        "surface": config,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
