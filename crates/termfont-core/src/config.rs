//! Configuration management for termfont
//!
//! termfont has no config file of its own; file locations and the selector
//! command come from the user's home directory and a few environment
//! variables.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the font cache location
pub const CACHE_FILE_VAR: &str = "TERMFONT_CACHE_FILE";
/// Environment variable overriding the Alacritty config location
pub const ALACRITTY_CONFIG_VAR: &str = "TERMFONT_ALACRITTY_CONFIG";
/// Environment variable overriding the selector command (program and arguments)
pub const SELECTOR_VAR: &str = "TERMFONT_SELECTOR";

/// Selector used when none is configured
pub const DEFAULT_SELECTOR: &str = "fzf";

/// Global configuration for termfont operations
#[derive(Debug, Clone, PartialEq)]
pub struct TermfontConfig {
    /// File locations
    pub paths: Paths,
    /// External tool settings
    pub tools: Tools,
}

/// Files termfont reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    /// Font cache (`~/.local/share/fonts.txt`)
    pub cache_file: PathBuf,
    /// Alacritty config (`~/.config/alacritty/alacritty.toml`)
    pub alacritty_config: PathBuf,
}

/// External tools
#[derive(Debug, Clone, PartialEq)]
pub struct Tools {
    /// Selector program followed by its arguments
    pub selector: Vec<String>,
}

impl TermfontConfig {
    /// Create configuration from the home directory and environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(dirs::home_dir(), |key| env::var(key).ok())
    }

    /// Resolve configuration from an explicit home directory and variable lookup
    pub fn from_lookup<F>(home: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup_path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        let cache_file = match lookup_path(CACHE_FILE_VAR) {
            Some(path) => path,
            None => default_cache_file(home.as_deref())
                .with_context(|| format!("Cannot locate the font cache; set {}", CACHE_FILE_VAR))?,
        };

        let alacritty_config = match lookup_path(ALACRITTY_CONFIG_VAR) {
            Some(path) => path,
            None => default_alacritty_config(home.as_deref()).with_context(|| {
                format!(
                    "Cannot locate the Alacritty config; set {}",
                    ALACRITTY_CONFIG_VAR
                )
            })?,
        };

        let selector = lookup(SELECTOR_VAR)
            .map(|value| parse_command(&value))
            .unwrap_or_else(|| vec![DEFAULT_SELECTOR.to_string()]);

        let config = Self {
            paths: Paths {
                cache_file,
                alacritty_config,
            },
            tools: Tools { selector },
        };
        config.validate()?;
        Ok(config)
    }

    /// Default configuration rooted at `home`
    pub fn for_home(home: &Path) -> Self {
        Self {
            paths: Paths {
                cache_file: home.join(".local").join("share").join("fonts.txt"),
                alacritty_config: home.join(".config").join("alacritty").join("alacritty.toml"),
            },
            tools: Tools {
                selector: vec![DEFAULT_SELECTOR.to_string()],
            },
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.tools.selector.is_empty() {
            anyhow::bail!("Selector command is empty; check {}", SELECTOR_VAR);
        }

        for (name, path) in [
            ("font cache", &self.paths.cache_file),
            ("Alacritty config", &self.paths.alacritty_config),
        ] {
            if path.file_name().is_none() {
                anyhow::bail!("The {} path has no file name: {:?}", name, path);
            }
        }

        Ok(())
    }
}

fn default_cache_file(home: Option<&Path>) -> Result<PathBuf> {
    let home = home.context("home directory is unknown")?;
    Ok(TermfontConfig::for_home(home).paths.cache_file)
}

fn default_alacritty_config(home: Option<&Path>) -> Result<PathBuf> {
    let home = home.context("home directory is unknown")?;
    Ok(TermfontConfig::for_home(home).paths.alacritty_config)
}

fn parse_command(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_paths() {
        let config =
            TermfontConfig::from_lookup(Some(PathBuf::from("/Users/me")), lookup(&[])).unwrap();

        assert_eq!(
            config.paths.cache_file,
            PathBuf::from("/Users/me/.local/share/fonts.txt")
        );
        assert_eq!(
            config.paths.alacritty_config,
            PathBuf::from("/Users/me/.config/alacritty/alacritty.toml")
        );
        assert_eq!(config.tools.selector, vec!["fzf".to_string()]);
    }

    #[test]
    fn test_env_override() {
        let config = TermfontConfig::from_lookup(
            Some(PathBuf::from("/Users/me")),
            lookup(&[
                (CACHE_FILE_VAR, "/tmp/fonts.txt"),
                (ALACRITTY_CONFIG_VAR, "/tmp/alacritty.toml"),
                (SELECTOR_VAR, "sk --height 40%"),
            ]),
        )
        .unwrap();

        assert_eq!(config.paths.cache_file, PathBuf::from("/tmp/fonts.txt"));
        assert_eq!(
            config.paths.alacritty_config,
            PathBuf::from("/tmp/alacritty.toml")
        );
        assert_eq!(config.tools.selector, vec!["sk", "--height", "40%"]);
    }

    #[test]
    fn test_missing_home_needs_overrides() {
        assert!(TermfontConfig::from_lookup(None, lookup(&[])).is_err());

        let config = TermfontConfig::from_lookup(
            None,
            lookup(&[
                (CACHE_FILE_VAR, "/tmp/fonts.txt"),
                (ALACRITTY_CONFIG_VAR, "/tmp/alacritty.toml"),
            ]),
        )
        .unwrap();
        assert_eq!(config.paths.cache_file, PathBuf::from("/tmp/fonts.txt"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let config = TermfontConfig::from_lookup(
            Some(PathBuf::from("/home/me")),
            lookup(&[(CACHE_FILE_VAR, "  ")]),
        )
        .unwrap();
        assert_eq!(
            config.paths.cache_file,
            PathBuf::from("/home/me/.local/share/fonts.txt")
        );
    }

    #[test]
    fn test_validation() {
        let mut config = TermfontConfig::for_home(Path::new("/home/me"));
        assert!(config.validate().is_ok());

        config.tools.selector.clear();
        assert!(config.validate().is_err());

        let result = TermfontConfig::from_lookup(
            Some(PathBuf::from("/home/me")),
            lookup(&[(SELECTOR_VAR, "   ")]),
        );
        assert!(result.is_err());

        let mut config = TermfontConfig::for_home(Path::new("/home/me"));
        config.paths.cache_file = PathBuf::from("/");
        assert!(config.validate().is_err());
    }
}
