use clap::Parser;

/// Run an HTTP API smoke suite described in a TOML file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the suite file
    #[arg(short, long, default_value = "suites/reqres.toml")]
    pub path: String,

    /// Send every request to this base URL instead of the one in the suite
    #[arg(short, long)]
    pub base_url: Option<String>,
}
