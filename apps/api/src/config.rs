use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    pub default_word_limit: usize,
    pub stylesheet_path: String,
    pub blocklist_path: Option<String>,
    /// Sessions untouched for this long are dropped. 0 keeps them until closed.
    pub session_idle_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "llama3.2"),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            default_word_limit: parse_env("DEFAULT_WORD_LIMIT", 100)?,
            stylesheet_path: env_or("STYLESHEET_PATH", "static/style.css"),
            blocklist_path: std::env::var("BLOCKLIST_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            session_idle_secs: parse_env("SESSION_IDLE_SECS", 3600)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Reads the stylesheet once at startup. A missing file yields an empty sheet.
pub fn load_stylesheet(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(css) => css,
        Err(e) => {
            tracing::warn!("Stylesheet '{path}' could not be read ({e}); serving an empty sheet");
            String::new()
        }
    }
}

/// Reads extra disallowed words, one per line. Blank lines and `#` comments are skipped.
pub fn load_blocklist(path: &str) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read blocklist '{path}'"))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("FORUM_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("FORUM_TEST_BAD_NUMBER", "lots");
        let result: Result<u16> = parse_env("FORUM_TEST_BAD_NUMBER", 1);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("FORUM_TEST_BAD_NUMBER"), "error names the variable: {err}");
    }

    #[test]
    fn test_load_stylesheet_missing_file_is_empty() {
        assert_eq!(load_stylesheet("/definitely/not/here/style.css"), "");
    }

    #[test]
    fn test_load_stylesheet_reads_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "body {{ color: red; }}").unwrap();
        let css = load_stylesheet(file.path().to_str().unwrap());
        assert_eq!(css, "body { color: red; }\n");
    }

    #[test]
    fn test_load_blocklist_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# local additions").unwrap();
        writeln!(file, "frick").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  darn it  ").unwrap();
        let words = load_blocklist(file.path().to_str().unwrap()).unwrap();
        assert_eq!(words, vec!["frick".to_string(), "darn it".to_string()]);
    }

    #[test]
    fn test_load_blocklist_missing_file_errors() {
        assert!(load_blocklist("/definitely/not/here/words.txt").is_err());
    }
}
