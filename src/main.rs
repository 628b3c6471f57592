use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use texbz::config::Options;
use texbz::optimizer::run;
use tracing::error;
use tracing_subscriber::EnvFilter;

const BANNER: &str = "texbz. Compress TEXB with Zopfli's DEFLATE compression.";

#[derive(Parser)]
#[command(
    name = "texbz",
    about = "Recompress TEXB with Zopfli's DEFLATE compression",
    after_help = "Use - for stdin/stdout. TEXBZ_NUMITER (or HNH_NUMITER) sets the Zopfli iteration count (default 1)."
)]
struct Cli {
    /// Input TEXB file
    input: Option<PathBuf>,
    /// Output TEXB file [default: input]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    eprintln!("{BANNER}");
    let cli = Cli::parse();

    let Some(input) = cli.input else {
        eprintln!("{}", Cli::command().render_usage());
        eprintln!("Recompress TEXB with Zopfli's DEFLATE compression.\n");
        return;
    };
    let output = cli.output.unwrap_or_else(|| input.clone());

    if let Err(e) = run(&input, &output, Options::from_env()) {
        error!("{e}");
        std::process::exit(e.exit_code());
    }
}
