use anyhow::{Context, Result};
use chatviz::client::BACKEND_URL_ENV;
use chatviz::client::DEFAULT_BACKEND_URL;
use chatviz::{ChartKind, Client, ControlPanel, VisualizationPayload};
use chatviz::{export, viz};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "chatviz",
    version,
    about = "Upload tables, ask questions, and chart the answers"
)]
struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = BACKEND_URL_ENV, default_value = DEFAULT_BACKEND_URL)]
    backend: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a .csv or .xlsx file and print the table it was loaded into.
    Upload {
        file: PathBuf,
    },
    /// Ask a question about an uploaded table (and optionally chart/export the answer).
    Ask(AskArgs),
    /// Chart a payload file without contacting the backend.
    Render(RenderArgs),
    /// Write a payload file as visualization_data.csv.
    Export {
        /// JSON file with `{labels, values}`.
        #[arg(long)]
        payload: PathBuf,
        /// Target directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Table id returned by `upload`.
    #[arg(long)]
    table: String,
    question: String,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// JSON file with `{labels, values}`.
    #[arg(long)]
    payload: PathBuf,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Chart kind: bar, horizontal_bar, line, pie, scatter. Defaults to the suggested kind.
    #[arg(long)]
    kind: Option<String>,
    /// Hide a series by label (repeatable).
    #[arg(long = "hide")]
    hide: Vec<String>,
    /// Stack bars.
    #[arg(long, default_value_t = false)]
    stacked: bool,
    /// Draw the chart to this path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the plot.
    #[arg(long, default_value_t = 800)]
    width: u32,
    /// Height of the plot.
    #[arg(long, default_value_t = viz::types::CHART_HEIGHT_PX)]
    height: u32,
    /// Save the original data as visualization_data.csv in this directory.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Save the chart description as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Upload { file } => cmd_upload(&cli.backend, &file),
        Command::Ask(args) => cmd_ask(&cli.backend, args),
        Command::Render(args) => {
            let raw = read_payload(&args.payload)?;
            present(raw, None, &args.view)
        }
        Command::Export { payload, out } => {
            let raw = read_payload(&payload)?;
            let path = export::save_csv(&raw, &out)?;
            eprintln!("Saved {} rows to {}", raw.labels.len(), path.display());
            Ok(())
        }
    }
}

fn cmd_upload(backend: &str, file: &Path) -> Result<()> {
    let table = Client::new(backend).upload(file)?;
    println!("{}", table.table_name);
    eprintln!("Loaded {} rows", table.rows_loaded);
    Ok(())
}

fn cmd_ask(backend: &str, args: AskArgs) -> Result<()> {
    let resp = Client::new(backend).query(&args.question, &args.table)?;
    println!("{}", resp.answer);
    if let Some(reason) = resp.visualization_reason.as_deref().filter(|r| !r.is_empty()) {
        println!("{reason}");
    }
    match resp.formatted_data_for_visualization {
        Some(raw) => present(raw, resp.visualization.as_deref(), &args.view),
        None => Ok(()),
    }
}

fn read_payload(path: &Path) -> Result<VisualizationPayload> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

/// Apply the view flags to a fresh panel, then print the series picker and write outputs.
fn present(raw: VisualizationPayload, hint: Option<&str>, view: &ViewArgs) -> Result<()> {
    let mut panel = ControlPanel::new(raw, hint);

    if let Some(kind) = view.kind.as_deref() {
        match kind.parse::<ChartKind>() {
            Ok(k) => panel.select_chart_kind(k),
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        }
    }
    for label in &view.hide {
        if panel.state().visibility.is_visible(label) {
            panel.toggle_series(label);
        }
    }
    if view.stacked != panel.stacked() {
        panel.toggle_stacked();
    }

    println!("Chart: {}", panel.chart_kind().display_name());
    for entry in panel.legend_entries() {
        let mark = if entry.visible { 'x' } else { ' ' };
        println!("  [{mark}] {} {}", entry.swatch, entry.label);
    }
    if let Some(notice) = panel.rendered().notice() {
        println!("{notice}");
    }

    if let Some(path) = view.plot.as_ref() {
        viz::plot_chart(panel.rendered(), path, view.width, view.height)?;
        eprintln!("Wrote plot to {}", path.display());
    }
    if let Some(dir) = view.csv.as_ref() {
        let path = export::save_csv(panel.raw(), dir)?;
        eprintln!("Saved {} rows to {}", panel.raw().labels.len(), path.display());
    }
    if let Some(path) = view.json.as_ref() {
        match panel.rendered().chart() {
            Some(desc) => {
                let s = serde_json::to_string_pretty(desc)?;
                std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
                eprintln!("Wrote chart description to {}", path.display());
            }
            None => eprintln!("No chart to describe; skipped {}", path.display()),
        }
    }
    Ok(())
}
