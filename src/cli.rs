use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "groupsync")]
#[command(version)]
#[command(about = "Sync Groups.io subgroup membership from YAML definitions", long_about = None)]
#[command(after_help = "Without -d or -g only the local definitions are validated.\n\
With credentials set, the remote state is also fetched and the planned changes shown.")]
pub struct Cli {
    /// Render the Markdown member directory
    #[arg(short = 'd', long = "directory")]
    pub directory: bool,

    /// Apply membership changes to Groups.io
    #[arg(short = 'g', long = "groupsio")]
    pub groupsio: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory holding the definitions and assets/config.yml
    #[arg(long, value_name = "DIR", default_value = "groups")]
    pub config_dir: String,

    /// Where to write the directory pages
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Groups.io account email
    #[arg(long, env = "GROUPSIO_USERNAME", hide_env_values = true)]
    pub username: Option<String>,

    /// Groups.io account password
    #[arg(long, env = "GROUPSIO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Groups.io API base URL
    #[arg(long, hide = true, default_value = groupsio::DEFAULT_API_BASE)]
    pub api_base: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["groupsync"]).unwrap();
        assert!(!cli.directory);
        assert!(!cli.groupsio);
        assert_eq!(cli.config_dir, "groups");
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.api_base, groupsio::DEFAULT_API_BASE);
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from(["groupsync", "-d", "-g", "-vv", "--config-dir", "~/g"])
            .unwrap();
        assert!(cli.directory);
        assert!(cli.groupsio);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config_dir, "~/g");
    }
}
