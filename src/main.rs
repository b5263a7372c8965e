use anyhow::Context;
use clap::Parser;

use gamegate::StartupOptions;

#[derive(Debug, Parser)]
#[command(name = "gamegate", version, about = "Carmine Impact launcher")]
struct Cli {
    /// Log in with the platform identity ticket before trying the saved token.
    #[arg(long)]
    steam: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    gamegate::run(StartupOptions {
        platform_identity: cli.steam,
    })
    .context("launcher startup failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steam_flag_is_optional() {
        assert!(!Cli::parse_from(["gamegate"]).steam);
        assert!(Cli::parse_from(["gamegate", "--steam"]).steam);
        assert!(Cli::try_parse_from(["gamegate", "--other"]).is_err());
    }
}
