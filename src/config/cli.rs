use clap::Parser;
use std::path::PathBuf;

/// Runs with no flags; everything else comes from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "lucky7-etl")]
#[command(about = "Scrapes Lucky 7 card results into a CSV file")]
pub struct CliArgs {
    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Write logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let args = CliArgs::try_parse_from(["lucky7-etl"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.verbose);
        assert!(!args.log_json);
    }

    #[test]
    fn test_config_and_verbose() {
        let args = CliArgs::try_parse_from(["lucky7-etl", "--config", "lucky7.toml", "-v"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("lucky7.toml")));
        assert!(args.verbose);
    }
}
