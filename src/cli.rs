use crate::resolve::TimeWindow;
use clap::{Parser, ValueEnum};

/// Generate opponent scouting reports from GRID-style esports data.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Game title to scout in (e.g. "val", "lol", "cs2")
    #[arg(short, long)]
    pub game: Option<String>,

    /// Team to scout (fuzzy matched against the directory)
    #[arg(short, long)]
    pub team: Option<String>,

    /// Optional second team for a head-to-head block
    #[arg(long)]
    pub opponent: Option<String>,

    /// How many recent series to scout
    #[arg(short = 'n', long, default_value_t = 5)]
    pub last_n: usize,

    /// How far back to look for series
    #[arg(short, long, value_enum, default_value_t = WindowArg::Last6Months)]
    pub window: WindowArg,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Emit the report as JSON instead of markdown
    #[arg(long)]
    pub json: bool,

    /// Set the GRID API key in the config file and exit
    #[arg(long)]
    pub set_api_key: Option<String>,

    /// Print the config file location and exit
    #[arg(long)]
    pub config_path: bool,

    /// Mirror logs to stdout
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    LastMonth,
    Last3Months,
    Last6Months,
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::LastMonth => TimeWindow::LastMonth,
            WindowArg::Last3Months => TimeWindow::Last3Months,
            WindowArg::Last6Months => TimeWindow::Last6Months,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["gridscout", "--game", "val", "--team", "G2"]).unwrap();
        assert_eq!(args.game.as_deref(), Some("val"));
        assert_eq!(args.last_n, 5);
        assert_eq!(args.window, WindowArg::Last6Months);
        assert!(!args.debug);
        assert!(!args.json);
    }

    #[test]
    fn test_json_output_flag() {
        let args =
            Args::try_parse_from(["gridscout", "-g", "val", "-t", "G2", "--json"]).unwrap();
        assert!(args.json);
    }

    #[test]
    fn test_window_values() {
        let args = Args::try_parse_from([
            "gridscout", "-g", "val", "-t", "G2", "--window", "last-month", "-n", "10",
        ])
        .unwrap();
        assert_eq!(args.window, WindowArg::LastMonth);
        assert_eq!(TimeWindow::from(args.window), TimeWindow::LastMonth);
        assert_eq!(args.last_n, 10);
    }

    #[test]
    fn test_utility_flags_need_no_team() {
        let args = Args::try_parse_from(["gridscout", "--config-path"]).unwrap();
        assert!(args.config_path);
        assert!(args.team.is_none());
    }
}
