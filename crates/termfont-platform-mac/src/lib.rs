//! macOS platform implementation for termfont
//!
//! Each collaborator wraps one command-line tool: `system_profiler` for the
//! installed-font report, a fuzzy finder (fzf by default) for selection, and
//! `osascript` for talking to Terminal.app. The commands run synchronously and
//! are never retried.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;
use termfont_core::{FontEnumerator, FontError, FontResult, FontSelector, TerminalScripter};

/// Font enumeration through `system_profiler -json SPFontsDataType`
pub struct SystemProfiler {
    program: String,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self {
            program: "system_profiler".to_string(),
        }
    }

    /// Use a different executable with the same interface
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl FontEnumerator for SystemProfiler {
    fn enumerate(&self) -> FontResult<Vec<u8>> {
        log::debug!("Running {} -json SPFontsDataType", self.program);

        let output = Command::new(&self.program)
            .args(["-json", "SPFontsDataType"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FontError::EnumerationFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FontError::EnumerationFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Interactive selection through fzf or a compatible finder
pub struct FzfSelector {
    command: Vec<String>,
}

impl FzfSelector {
    /// `command` is the program followed by its arguments
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for FzfSelector {
    fn default() -> Self {
        Self::new(vec!["fzf".to_string()])
    }
}

impl FontSelector for FzfSelector {
    fn select(&self, candidates: &[u8]) -> FontResult<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| FontError::SelectorFailed("empty selector command".to_string()))?;

        // stderr stays attached to the terminal: fzf draws its UI there
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FontError::SelectorFailed(format!("{}: {}", program, e)))?;

        // filters stream output while reading, so stdout is drained concurrently
        let writer = child.stdin.take().map(|mut stdin| {
            let candidates = candidates.to_vec();
            thread::spawn(move || match stdin.write_all(&candidates) {
                // the selector may exit before reading everything
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                result => result,
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|e| FontError::SelectorFailed(format!("{}: {}", program, e)))?;

        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| FontError::SelectorFailed("candidate writer panicked".to_string()))??;
        }

        match output.status.code() {
            Some(0) => {}
            // fzf: 1 = no match, 130 = interrupted
            Some(1) | Some(130) => return Err(FontError::SelectionCancelled),
            _ => {
                return Err(FontError::SelectorFailed(format!(
                    "{} exited with {}",
                    program, output.status
                )))
            }
        }

        let selection = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        if selection.trim().is_empty() {
            return Err(FontError::SelectionCancelled);
        }

        log::debug!("Selector returned {:?}", selection);
        Ok(selection)
    }
}

/// Terminal.app control through `osascript`
pub struct TerminalApp {
    _private: (),
}

impl TerminalApp {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for TerminalApp {
    fn default() -> Self {
        Self::new()
    }
}

/// AppleScript that sets the font of Terminal's first window
pub fn terminal_font_script(family: &str) -> String {
    format!(
        "tell application \"Terminal\" to set the font name of window 1 to \"{}\"",
        escape_applescript(family)
    )
}

fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl TerminalScripter for TerminalApp {
    fn set_font_family(&self, family: &str) -> FontResult<()> {
        let script = terminal_font_script(family);
        log::debug!("Running osascript -e {:?}", script);

        let output = Command::new("osascript")
            .args(["-e", &script])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FontError::ScriptingFailed(format!("osascript: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FontError::ScriptingFailed(format!(
                "osascript exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
