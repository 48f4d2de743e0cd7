//! CLI interface for termfont
//!
//! Picks a font from the cached list of installed fonts (or takes one from the
//! command line) and applies it to Terminal.app or Alacritty.

mod args;
mod ops;

pub use args::*;
pub use ops::*;

use clap::Parser;
use termfont_core::config::TermfontConfig;
use termfont_core::FontResult;

/// Main CLI handler
pub fn run_cli(cli: Cli, config: &TermfontConfig, toolkit: &Toolkit) -> FontResult<()> {
    let opts = OperationOptions::new(cli.dry_run, cli.quiet, cli.verbose).with_json(cli.json);

    match cli.command {
        Commands::Set {
            target,
            family,
            style,
            refresh,
            export_json,
        } => {
            let request = SetRequest {
                target,
                family,
                style,
                refresh,
                export_json,
            };
            handle_set_command(config, toolkit, request, opts)?;
        }
        Commands::List {
            refresh,
            families,
            export_json,
        } => {
            handle_list_command(
                config,
                toolkit,
                refresh,
                families,
                export_json,
                cli.json,
                opts,
            )?;
        }
        Commands::Refresh { export_json } => {
            handle_refresh_command(config, toolkit, export_json, opts)?;
        }
        Commands::Completions { shell } => {
            write_completions(shell, std::io::stdout())?;
        }
    }

    Ok(())
}

/// CLI entry point
pub fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = exit_code_for_clap_error(err.kind());
            let _ = err.print();
            std::process::exit(code);
        }
    };

    // completions must work even where no home directory can be resolved
    if let Commands::Completions { shell } = cli.command {
        if let Err(e) = write_completions(shell, std::io::stdout()) {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match TermfontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Configuration: {:?}", config);

    let toolkit = create_toolkit(&config);

    if let Err(e) = run_cli(cli, &config, &toolkit) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(exit_code_for_error(&e));
    }
}
