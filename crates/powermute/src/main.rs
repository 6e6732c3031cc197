//! PowerMute CLI — inspect and dry-run the battery LED, warning, and
//! charging-sound overrides.

use clap::Parser;

mod cli;

#[derive(Parser)]
#[command(
    name = "powermute",
    version,
    about = "Battery LED, low-battery warning, and charging-sound overrides"
)]
struct Args {
    /// Output as JSON (for config, simulate)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = cli::run(args.command, args.json) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
