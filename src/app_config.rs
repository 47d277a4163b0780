//! Configuration file loading for harvest defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use harvest_core::HarvestConfig;

/// Directory name used under the user's config home.
const CONFIG_DIR_NAME: &str = "arxiv-harvest";

/// File-backed overrides for [`HarvestConfig`].
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Replacement query list. Empty means keep the defaults.
    pub queries: Vec<String>,
    /// Folder receiving papers and the history file.
    pub base_dir: Option<PathBuf>,
    /// Skip papers published before this year.
    pub cutoff_year: Option<i32>,
    /// Result cap per query (1..=2000).
    pub max_results_per_query: Option<u32>,
    /// Download attempts per paper (1..=10).
    pub max_download_attempts: Option<u32>,
    /// Backoff after a failed download attempt, in seconds.
    pub retry_delay_secs: Option<u64>,
    /// Cool-down after a rate-limited download attempt, in seconds.
    pub rate_limit_cooldown_secs: Option<u64>,
    /// Cool-down after a failed query, in seconds.
    pub query_cooldown_secs: Option<u64>,
    /// Pause after each successful download, in seconds.
    pub politeness_delay_secs: Option<u64>,
    /// Minimum gap between search API requests, in seconds.
    pub api_delay_secs: Option<u64>,
    /// Search requests per query (1..=10).
    pub max_search_attempts: Option<u32>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds (longest gap without data).
    pub read_timeout_secs: Option<u64>,
    /// Search API endpoint override.
    pub search_endpoint: Option<String>,
}

impl FileConfig {
    /// Validates the values that have no counterpart check in [`HarvestConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        validate_delay_secs("retry_delay_secs", self.retry_delay_secs)?;
        validate_delay_secs("rate_limit_cooldown_secs", self.rate_limit_cooldown_secs)?;
        validate_delay_secs("query_cooldown_secs", self.query_cooldown_secs)?;
        validate_delay_secs("politeness_delay_secs", self.politeness_delay_secs)?;
        validate_delay_secs("api_delay_secs", self.api_delay_secs)?;
        if let Some(endpoint) = &self.search_endpoint
            && url::Url::parse(endpoint).is_err()
        {
            bail!("Invalid config value for `search_endpoint`: '{endpoint}' is not a URL");
        }
        Ok(())
    }

    /// Overlays the values present in this file onto `base`.
    #[must_use]
    pub fn apply_to(self, mut base: HarvestConfig) -> HarvestConfig {
        if !self.queries.is_empty() {
            base.queries = self.queries;
        }
        if let Some(dir) = self.base_dir {
            base.base_directory = dir;
        }
        if let Some(year) = self.cutoff_year {
            base.cutoff_year = year;
        }
        if let Some(max) = self.max_results_per_query {
            base.max_results_per_query = max;
        }
        if let Some(attempts) = self.max_download_attempts {
            base.max_download_attempts = attempts;
        }
        if let Some(secs) = self.retry_delay_secs {
            base.pacing.retry_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.rate_limit_cooldown_secs {
            base.pacing.rate_limit_cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = self.query_cooldown_secs {
            base.pacing.query_cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = self.politeness_delay_secs {
            base.pacing.politeness_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.api_delay_secs {
            base.pacing.api_delay = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_search_attempts {
            base.max_search_attempts = attempts;
        }
        if let Some(secs) = self.connect_timeout_secs {
            base.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.read_timeout_secs {
            base.read_timeout_secs = secs;
        }
        if let Some(endpoint) = self.search_endpoint {
            base.search_endpoint = endpoint;
        }
        base
    }
}

fn validate_delay_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > 3600 {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 0..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/arxiv-harvest/config.toml`
/// 2. `$HOME/.config/arxiv-harvest/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Builds the harvest configuration from defaults and an optional file.
///
/// An explicit path must exist. The default path is only read when present.
/// The merged result is validated before it is returned.
pub fn load_config(explicit_path: Option<&Path>) -> Result<HarvestConfig> {
    let file_config = match explicit_path {
        Some(path) => Some(load_file_config(path)?),
        None => match resolve_default_config_path() {
            Some(path) if path.exists() => Some(load_file_config(&path)?),
            _ => None,
        },
    };

    let config = file_config
        .map(|file| file.apply_to(HarvestConfig::default()))
        .unwrap_or_default();
    config.validate().context("Invalid harvest configuration")?;
    Ok(config)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = |field: &str| format!("Invalid `{field}` value on line {line_no}");

        match key {
            "query" => {
                let parsed = parse_string_literal(value).with_context(|| invalid(key))?;
                cfg.queries.push(parsed);
            }
            "base_dir" => {
                let parsed = parse_string_literal(value).with_context(|| invalid(key))?;
                cfg.base_dir = Some(PathBuf::from(parsed));
            }
            "cutoff_year" => {
                let parsed = value.parse::<i32>().with_context(|| invalid(key))?;
                cfg.cutoff_year = Some(parsed);
            }
            "max_results_per_query" => {
                cfg.max_results_per_query =
                    Some(parse_integer_u32(value).with_context(|| invalid(key))?);
            }
            "max_download_attempts" => {
                cfg.max_download_attempts =
                    Some(parse_integer_u32(value).with_context(|| invalid(key))?);
            }
            "retry_delay_secs" => {
                cfg.retry_delay_secs = Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "rate_limit_cooldown_secs" => {
                cfg.rate_limit_cooldown_secs =
                    Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "query_cooldown_secs" => {
                cfg.query_cooldown_secs =
                    Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "politeness_delay_secs" => {
                cfg.politeness_delay_secs =
                    Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "api_delay_secs" => {
                cfg.api_delay_secs = Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "max_search_attempts" => {
                cfg.max_search_attempts =
                    Some(parse_integer_u32(value).with_context(|| invalid(key))?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs =
                    Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs =
                    Some(parse_integer_u64(value).with_context(|| invalid(key))?);
            }
            "search_endpoint" => {
                let parsed = parse_string_literal(value).with_context(|| invalid(key))?;
                cfg.search_endpoint = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut open_quote: Option<char> = None;
    for (index, ch) in line.char_indices() {
        match (ch, open_quote) {
            ('"' | '\'', None) => open_quote = Some(ch),
            (c, Some(q)) if c == q => open_quote = None,
            ('#', None) => return &line[..index],
            _ => {}
        }
    }
    line
}

// Queries carry double quotes for phrase search, so single quotes are accepted too.
fn parse_string_literal(raw_value: &str) -> Result<String> {
    let quoted = raw_value.len() >= 2
        && ((raw_value.starts_with('"') && raw_value.ends_with('"'))
            || (raw_value.starts_with('\'') && raw_value.ends_with('\'')));
    if !quoted {
        bail!("Expected quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u32(raw_value: &str) -> Result<u32> {
    let value = parse_integer_u64(raw_value)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u32"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
cutoff_year = 2024
base_dir = "papers"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.cutoff_year, Some(2024));
        assert_eq!(cfg.base_dir, Some(PathBuf::from("papers")));
        assert!(cfg.queries.is_empty());
        assert!(cfg.max_results_per_query.is_none());
    }

    #[test]
    fn test_parse_config_repeated_query_lines_collect_in_order() {
        let cfg = parse_config_str(
            r#"
query = '"Embodied AI" AND "Transformer"'
query = "Legged Locomotion"
"#,
        )
        .expect("queries should parse");
        assert_eq!(
            cfg.queries,
            vec![
                r#""Embodied AI" AND "Transformer""#.to_string(),
                "Legged Locomotion".to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_queries_replace_defaults() {
        let cfg = parse_config_str("query = 'Sim-to-Real'").expect("query should parse");
        let merged = cfg.apply_to(HarvestConfig::default());
        assert_eq!(merged.queries, vec!["Sim-to-Real".to_string()]);
    }

    #[test]
    fn test_apply_keeps_defaults_for_missing_keys() {
        let cfg = parse_config_str("politeness_delay_secs = 0").expect("delay should parse");
        let merged = cfg.apply_to(HarvestConfig::default());
        let defaults = HarvestConfig::default();
        assert_eq!(merged.pacing.politeness_delay, Duration::ZERO);
        assert_eq!(merged.pacing.retry_delay, defaults.pacing.retry_delay);
        assert_eq!(merged.queries, defaults.queries);
        assert_eq!(merged.cutoff_year, defaults.cutoff_year);
    }

    #[test]
    fn test_parse_config_search_pacing_keys() {
        let cfg = parse_config_str("api_delay_secs = 10\nmax_search_attempts = 5\n")
            .expect("search pacing should parse");
        let merged = cfg.apply_to(HarvestConfig::default());
        assert_eq!(merged.pacing.api_delay, Duration::from_secs(10));
        assert_eq!(merged.max_search_attempts, 5);
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
max_results_per_query = 25 # per keyword
query = "C# bindings" # hash inside quotes is kept
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.max_results_per_query, Some(25));
        assert_eq!(cfg.queries, vec!["C# bindings".to_string()]);
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("base_dir = papers").expect_err("unquoted string");
        assert!(err.to_string().contains("base_dir"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("max_download_attempts = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("max_download_attempts"));
    }

    #[test]
    fn test_parse_config_rejects_delay_above_range() {
        let err = parse_config_str("query_cooldown_secs = 3601").expect_err("delay too large");
        assert!(err.to_string().contains("query_cooldown_secs"));
    }

    #[test]
    fn test_parse_config_rejects_bad_endpoint() {
        let err = parse_config_str("search_endpoint = 'not a url'").expect_err("bad endpoint");
        assert!(err.to_string().contains("search_endpoint"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("cutoff_year 2023").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_load_config_explicit_path_must_exist() {
        let temp_dir = TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("absent.toml");
        let err = load_config(Some(&missing)).expect_err("missing file should fail");
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn test_load_config_validates_merged_values() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "max_download_attempts = 0\n").expect("write config");

        let err = load_config(Some(&path)).expect_err("zero attempts should be rejected");
        assert!(format!("{err:#}").contains("max_download_attempts"));
    }

    #[test]
    fn test_load_config_reads_explicit_file() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "base_dir = \"/tmp/papers\"\nmax_download_attempts = 5\n",
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("config should load");
        assert_eq!(config.base_directory, PathBuf::from("/tmp/papers"));
        assert_eq!(config.max_download_attempts, 5);
    }
}
