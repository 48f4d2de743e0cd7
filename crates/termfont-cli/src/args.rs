use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

/// Terminal whose font is changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Target {
    /// The native macOS Terminal.app (front window)
    #[default]
    Terminal,
    /// Alacritty, through its TOML config file
    Alacritty,
}

impl Target {
    /// Get a human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Target::Terminal => "Terminal.app",
            Target::Alacritty => "Alacritty",
        }
    }

    /// Name as accepted by `--target`
    pub fn name(self) -> &'static str {
        match self {
            Target::Terminal => "terminal",
            Target::Alacritty => "alacritty",
        }
    }
}

/// Terminal font picker
#[derive(Parser)]
#[command(name = "termfont")]
#[command(about = "Pick an installed font and apply it to Terminal.app or Alacritty", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Simulate actions without changing anything
    #[arg(
        global = true,
        long,
        help = "Print intended changes without applying them"
    )]
    pub dry_run: bool,

    /// Reduce output to errors only
    #[arg(
        global = true,
        long,
        help = "Silence routine status output",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Show additional status output
    #[arg(
        global = true,
        long,
        help = "Show verbose status messages",
        conflicts_with = "quiet"
    )]
    pub verbose: bool,

    /// Output as JSON (deterministic ordering); completions are unaffected
    #[arg(
        global = true,
        long,
        help = "Output results of set, list and refresh as JSON"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a font and apply it to a terminal
    #[command(alias = "s")]
    Set {
        #[arg(
            short,
            long,
            value_enum,
            default_value = "terminal",
            help = "Terminal to configure"
        )]
        target: Target,

        #[arg(
            short,
            long,
            help = "Font family to apply; skips the interactive selector"
        )]
        family: Option<String>,

        #[arg(
            short,
            long,
            help = "Font style (defaults to Regular when only --family is given)"
        )]
        style: Option<String>,

        #[arg(
            short,
            long,
            help = "Rebuild the font cache before selecting",
            conflicts_with = "family"
        )]
        refresh: bool,

        #[arg(
            long,
            value_name = "PATH",
            value_hint = ValueHint::FilePath,
            help = "Also save the raw SPFontsDataType JSON when the cache is rebuilt",
            conflicts_with = "family"
        )]
        export_json: Option<PathBuf>,
    },

    /// List cached fonts
    #[command(alias = "l")]
    List {
        #[arg(short, long, help = "Rebuild the font cache before listing")]
        refresh: bool,

        #[arg(long, help = "Show each family once instead of every style")]
        families: bool,

        #[arg(
            long,
            value_name = "PATH",
            value_hint = ValueHint::FilePath,
            help = "Also save the raw SPFontsDataType JSON when the cache is rebuilt"
        )]
        export_json: Option<PathBuf>,
    },

    /// Rebuild the font cache for newly installed fonts
    #[command(alias = "r")]
    Refresh {
        #[arg(
            long,
            value_name = "PATH",
            value_hint = ValueHint::FilePath,
            help = "Also save the raw SPFontsDataType JSON"
        )]
        export_json: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell (bash, zsh, fish, powershell, elvish)
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

/// Map clap error kinds to exit codes (0 for help/version, 1 for other errors)
pub fn exit_code_for_clap_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
