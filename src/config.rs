use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;

/// All DataMall services hang off this single endpoint.
pub(crate) const DEFAULT_URL: &str = "http://datamall2.mytransport.sg/ltaodataservice";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
}

pub(crate) fn load_config(url: Option<String>, key: Option<String>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("DATAMALL_URL").ok());
    let mut key = key.or_else(|| std::env::var("DATAMALL_API_KEY").ok());

    let rc_candidates = rc_candidates();

    if url.is_none() || key.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if key.is_none() {
                    key = cfg.key;
                }
                break;
            }
        }
    }

    let url = url.unwrap_or_else(|| DEFAULT_URL.to_string());

    let key = match key {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: key (set DATAMALL_API_KEY or put `key:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: key (set DATAMALL_API_KEY or create .datamallrc)");
        }
    };

    Ok(ClientConfig { url, key })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                continue;
            }
            match k {
                "url" => cfg.url = Some(v.to_string()),
                "key" => cfg.key = Some(v.to_string()),
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) DATAMALL_RC (explicit)
    // 2) ./.datamallrc (current working directory)
    // 3) ~/.datamallrc
    if let Ok(p) = std::env::var("DATAMALL_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".datamallrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".datamallrc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_arguments_win() {
        let cfg = load_config(
            Some("http://localhost:9999/odata".to_string()),
            Some("abc-123".to_string()),
        )
        .unwrap();

        assert_eq!(cfg.url, "http://localhost:9999/odata");
        assert_eq!(cfg.key, "abc-123");
    }

    #[test]
    fn rc_file_parses_comments_and_quotes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# DataMall credentials").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "key: \"0a1b2c3d-4e5f-6a7b-8c9d-0e1f2a3b4c5d\"").unwrap();
        writeln!(file, "url: 'http://example.invalid/ltaodataservice'").unwrap();
        writeln!(file, "unknown: ignored").unwrap();

        let cfg = read_rc(file.path()).unwrap();

        assert_eq!(
            cfg.key.as_deref(),
            Some("0a1b2c3d-4e5f-6a7b-8c9d-0e1f2a3b4c5d")
        );
        assert_eq!(
            cfg.url.as_deref(),
            Some("http://example.invalid/ltaodataservice")
        );
    }

    #[test]
    fn rc_file_skips_empty_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key:").unwrap();
        writeln!(file, "url: http://example.invalid").unwrap();

        let cfg = read_rc(file.path()).unwrap();

        assert!(cfg.key.is_none());
        assert_eq!(cfg.url.as_deref(), Some("http://example.invalid"));
    }

    #[test]
    fn strip_quotes_handles_both_styles() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\"\""), "");
    }
}
