use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde_json::{json, to_string_pretty, Value};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use termfont_core::alacritty::{self, ApplyOutcome};
use termfont_core::cache::{self, FontCache};
use termfont_core::config::TermfontConfig;
use termfont_core::{Font, FontEnumerator, FontError, FontResult, FontSelector, TerminalScripter};
use termfont_platform_mac::{FzfSelector, SystemProfiler, TerminalApp};

use crate::args::{Cli, Target};

/// The external tools a command may drive
#[derive(Clone)]
pub struct Toolkit {
    pub enumerator: Arc<dyn FontEnumerator>,
    pub selector: Arc<dyn FontSelector>,
    pub terminal: Arc<dyn TerminalScripter>,
}

/// Create the process-backed tools for this machine
pub fn create_toolkit(config: &TermfontConfig) -> Toolkit {
    Toolkit {
        enumerator: Arc::new(SystemProfiler::new()),
        selector: Arc::new(FzfSelector::new(config.tools.selector.clone())),
        terminal: Arc::new(TerminalApp::new()),
    }
}

/// Output controls for CLI commands
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub quiet: bool,
    pub verbose: bool,
    /// Print a JSON result on stdout instead of status lines
    pub json: bool,
}

impl OutputOptions {
    pub fn should_print(&self) -> bool {
        !self.quiet && !self.json
    }

    pub fn should_print_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }
}

/// Execution controls shared by commands
#[derive(Debug, Clone, Copy)]
pub struct OperationOptions {
    pub dry_run: bool,
    pub output: OutputOptions,
}

impl OperationOptions {
    pub fn new(dry_run: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            output: OutputOptions {
                quiet,
                verbose,
                json: false,
            },
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.output.json = json;
        self
    }
}

pub(crate) fn log_status(opts: &OperationOptions, message: &str) {
    if opts.output.should_print() {
        println!("{}", message);
    }
}

pub(crate) fn log_verbose(opts: &OperationOptions, message: &str) {
    if opts.output.should_print_verbose() {
        eprintln!("{}", message);
    }
}

fn print_json(opts: &OperationOptions, value: &Value) -> FontResult<()> {
    if opts.output.json {
        let json = to_string_pretty(value).map_err(|e| {
            FontError::InvalidFormat(format!("Failed to serialize result to JSON: {}", e))
        })?;
        println!("{}", json);
    }
    Ok(())
}

/// JSON result of `set`
pub fn set_result_json(target: Target, font: &Font, dry_run: bool) -> Value {
    json!({
        "target": target.name(),
        "family": font.family,
        "style": font.style,
        "dry_run": dry_run,
    })
}

/// JSON result of `refresh`; `records` is `None` when nothing was rebuilt
pub fn refresh_result_json(cache_file: &Path, records: Option<usize>, dry_run: bool) -> Value {
    json!({
        "cache_file": cache_file.display().to_string(),
        "records": records,
        "dry_run": dry_run,
    })
}

/// Arguments of the `set` command
#[derive(Debug, Clone, Default)]
pub struct SetRequest {
    pub target: Target,
    pub family: Option<String>,
    pub style: Option<String>,
    pub refresh: bool,
    pub export_json: Option<PathBuf>,
}

/// Open the font cache described by `config`, printing the rebuild notice to stderr
pub fn open_cache(
    config: &TermfontConfig,
    toolkit: &Toolkit,
    export_json: Option<PathBuf>,
    opts: &OperationOptions,
) -> FontCache {
    let quiet = opts.output.quiet;
    FontCache::new(&config.paths.cache_file, toolkit.enumerator.clone())
        .with_raw_capture(export_json)
        .with_progress(move |notice| {
            if !quiet {
                eprintln!("{}", notice);
            }
        })
}

/// Decide which font to apply.
///
/// A family given on the command line is used as-is (style defaults to
/// Regular). Otherwise the cached list goes through the selector; an explicit
/// style still overrides the selected one.
pub fn resolve_font(
    cache: &FontCache,
    selector: &dyn FontSelector,
    family: Option<&str>,
    style: Option<&str>,
    refresh: bool,
) -> FontResult<Font> {
    if let Some(family) = family.map(str::trim).filter(|f| !f.is_empty()) {
        return Ok(Font::with_default_style(family, style));
    }

    let candidates = cache.load(refresh)?;
    let selection = selector.select(&candidates)?;
    let selected = Font::from_selection(&selection)?;

    Ok(match style.map(str::trim).filter(|s| !s.is_empty()) {
        Some(style) => Font::new(selected.family, style),
        None => selected,
    })
}

/// Apply `font` to `target`
pub fn apply_to_target(
    config: &TermfontConfig,
    toolkit: &Toolkit,
    target: Target,
    font: &Font,
    opts: &OperationOptions,
) -> FontResult<()> {
    log_verbose(opts, &format!("Target: {}", target.description()));

    match target {
        Target::Terminal => {
            if opts.dry_run {
                log_status(
                    opts,
                    &format!(
                        "DRY-RUN: would set the Terminal.app font to {}",
                        font.family
                    ),
                );
                return Ok(());
            }

            toolkit.terminal.set_font_family(&font.family)?;
            log_status(
                opts,
                &format!("✅ Set the Terminal.app font to {}", font.family),
            );
        }
        Target::Alacritty => {
            let path = &config.paths.alacritty_config;
            log_verbose(opts, &format!("Config: {}", path.display()));

            if opts.dry_run {
                let preview = alacritty::preview_font(path, font)?;
                log_status(
                    opts,
                    &format!("DRY-RUN: would write {}:\n{}", path.display(), preview),
                );
                return Ok(());
            }

            match alacritty::apply_font(path, font)? {
                ApplyOutcome::Created { path } => {
                    log_status(
                        opts,
                        &format!("✅ Created {} with font {}", path.display(), font),
                    );
                }
                ApplyOutcome::Updated { path, backup } => {
                    log_verbose(opts, &format!("Backup: {}", backup.display()));
                    log_status(
                        opts,
                        &format!("✅ Set font {} in {}", font, path.display()),
                    );
                }
            }
        }
    }

    Ok(())
}

/// Handle the set command
pub fn handle_set_command(
    config: &TermfontConfig,
    toolkit: &Toolkit,
    request: SetRequest,
    opts: OperationOptions,
) -> FontResult<()> {
    let cache = open_cache(config, toolkit, request.export_json, &opts);
    let font = resolve_font(
        &cache,
        toolkit.selector.as_ref(),
        request.family.as_deref(),
        request.style.as_deref(),
        request.refresh,
    )?;

    log_verbose(&opts, &format!("Font: {}", font));
    apply_to_target(config, toolkit, request.target, &font, &opts)?;
    print_json(&opts, &set_result_json(request.target, &font, opts.dry_run))
}

/// List rendering options resolved from CLI flags
#[derive(Debug, Clone, Copy)]
pub struct ListRenderOptions {
    pub families_only: bool,
    pub json: bool,
}

/// Possible render outputs for list command
#[derive(Debug, PartialEq)]
pub enum ListRender {
    Lines(Vec<String>),
    Json(String),
}

/// Prepare list output according to options (sorted and deduplicated)
pub fn render_list_output(fonts: Vec<Font>, opts: ListRenderOptions) -> FontResult<ListRender> {
    let fonts: BTreeSet<Font> = fonts.into_iter().collect();

    if opts.families_only {
        let families: BTreeSet<String> = fonts.into_iter().map(|f| f.family).collect();
        if opts.json {
            let json = to_string_pretty(&families).map_err(|e| {
                FontError::InvalidFormat(format!("Failed to serialize family list to JSON: {}", e))
            })?;
            return Ok(ListRender::Json(json));
        }
        return Ok(ListRender::Lines(families.into_iter().collect()));
    }

    if opts.json {
        let json = to_string_pretty(&fonts).map_err(|e| {
            FontError::InvalidFormat(format!("Failed to serialize font list to JSON: {}", e))
        })?;
        return Ok(ListRender::Json(json));
    }

    Ok(ListRender::Lines(
        fonts.iter().map(Font::display_name).collect(),
    ))
}

/// Handle the list command
pub fn handle_list_command(
    config: &TermfontConfig,
    toolkit: &Toolkit,
    refresh: bool,
    families_only: bool,
    export_json: Option<PathBuf>,
    json: bool,
    opts: OperationOptions,
) -> FontResult<()> {
    let cache = open_cache(config, toolkit, export_json, &opts);
    let fonts = cache::records(&cache.load(refresh)?)?;
    log_verbose(
        &opts,
        &format!("{} records in {}", fonts.len(), cache.path().display()),
    );

    match render_list_output(
        fonts,
        ListRenderOptions {
            families_only,
            json,
        },
    )? {
        ListRender::Lines(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        ListRender::Json(json) => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Handle the refresh command
pub fn handle_refresh_command(
    config: &TermfontConfig,
    toolkit: &Toolkit,
    export_json: Option<PathBuf>,
    opts: OperationOptions,
) -> FontResult<()> {
    if opts.dry_run {
        log_status(
            &opts,
            &format!(
                "DRY-RUN: would rebuild the font cache at {}",
                config.paths.cache_file.display()
            ),
        );
        return print_json(
            &opts,
            &refresh_result_json(&config.paths.cache_file, None, true),
        );
    }

    let cache = open_cache(config, toolkit, export_json, &opts);
    let count = cache::records(&cache.refresh()?)?.len();
    log_status(
        &opts,
        &format!(
            "✅ Cached {} fonts in {}",
            count,
            cache.path().display()
        ),
    );

    print_json(&opts, &refresh_result_json(cache.path(), Some(count), false))
}

/// Generate shell completion script for the given shell
pub fn write_completions<W: Write>(shell: Shell, mut writer: W) -> FontResult<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();

    generate(shell, &mut command, bin_name.as_str(), &mut writer);

    Ok(())
}

/// Map a failed command to the process exit code (130 when the selection was cancelled)
pub fn exit_code_for_error(error: &FontError) -> i32 {
    match error {
        FontError::SelectionCancelled => 130,
        _ => 1,
    }
}
