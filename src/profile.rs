//! Host-side environment profile for the director CLI.
//!
//! Rendered as `KEY="value"` lines that a shell can `source`. Regenerated on
//! every run; the file is truncated, never merged.

use std::io;
use std::path::{Path, PathBuf};

pub const ENV_NAME: &str = "BOSH_ENV_NAME";
pub const CLIENT: &str = "BOSH_CLIENT";
pub const CLIENT_SECRET: &str = "BOSH_CLIENT_SECRET";
pub const ENVIRONMENT: &str = "BOSH_ENVIRONMENT";
pub const CA_CERT: &str = "BOSH_CA_CERT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentProfile {
    pub environment: String,
    pub client: String,
    pub client_secret: String,
    pub url: String,
    pub ca_cert_path: PathBuf,
}

/// Escape for a double-quoted shell string
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('\\' | '"' | '$' | '`')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse `KEY="value"` lines; blank lines, comments and malformed lines are skipped.
///
/// A leading `export ` is accepted. Unquoted values are taken verbatim.
pub fn parse_assignments(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, raw) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            let value = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
                Some(inner) => unescape_value(inner),
                None => raw.to_string(),
            };
            Some((key.to_string(), value))
        })
        .collect()
}

impl EnvironmentProfile {
    /// Assignments in the order they are written
    pub fn assignments(&self) -> Vec<(String, String)> {
        vec![
            (ENV_NAME.to_string(), self.environment.clone()),
            (CLIENT.to_string(), self.client.clone()),
            (CLIENT_SECRET.to_string(), self.client_secret.clone()),
            (ENVIRONMENT.to_string(), self.url.clone()),
            (
                CA_CERT.to_string(),
                self.ca_cert_path.to_string_lossy().to_string(),
            ),
        ]
    }

    pub fn render(&self) -> String {
        self.assignments()
            .into_iter()
            .map(|(key, value)| format!("{}=\"{}\"\n", key, escape_value(&value)))
            .collect()
    }

    /// Rebuild a profile from rendered content; `None` if a key is missing.
    pub fn parse(content: &str) -> Option<Self> {
        let pairs = parse_assignments(content);
        let get = |key: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        Some(EnvironmentProfile {
            environment: get(ENV_NAME)?,
            client: get(CLIENT)?,
            client_secret: get(CLIENT_SECRET)?,
            url: get(ENVIRONMENT)?,
            ca_cert_path: PathBuf::from(get(CA_CERT)?),
        })
    }

    /// Truncate and write the profile.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.render())
    }
}

/// Read a profile file back as environment assignments
pub fn load_assignments(path: &Path) -> io::Result<Vec<(String, String)>> {
    Ok(parse_assignments(&std::fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> EnvironmentProfile {
        EnvironmentProfile {
            environment: "vbox".into(),
            client: "admin".into(),
            client_secret: "pa\"ss$word`x\\".into(),
            url: "https://192.168.11.6:25555".into(),
            ca_cert_path: PathBuf::from("/tmp/director-ca.crt"),
        }
    }

    #[test]
    fn test_render_format() {
        let mut profile = sample();
        profile.client_secret = "plain".into();
        assert_eq!(
            profile.render(),
            "BOSH_ENV_NAME=\"vbox\"\n\
             BOSH_CLIENT=\"admin\"\n\
             BOSH_CLIENT_SECRET=\"plain\"\n\
             BOSH_ENVIRONMENT=\"https://192.168.11.6:25555\"\n\
             BOSH_CA_CERT=\"/tmp/director-ca.crt\"\n"
        );
    }

    #[test]
    fn test_special_characters_escaped_and_recovered() {
        let profile = sample();
        let rendered = profile.render();
        assert!(rendered.contains(r#"BOSH_CLIENT_SECRET="pa\"ss\$word\`x\\""#));
        assert_eq!(EnvironmentProfile::parse(&rendered), Some(profile));
    }

    #[test]
    fn test_parse_accepts_export_and_comments() {
        let pairs = parse_assignments("# header\nexport A=\"1\"\n\nB=two\nnot an assignment\n");
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_missing_key() {
        assert_eq!(EnvironmentProfile::parse("BOSH_CLIENT=\"admin\"\n"), None);
    }

    #[test]
    fn test_write_truncates_previous_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("director-env.sh");
        std::fs::write(&path, "STALE=\"1\"\n".repeat(50)).unwrap();

        sample().write(&path).unwrap();
        let assignments = load_assignments(&path).unwrap();
        assert_eq!(assignments.len(), 5);
        assert!(assignments.iter().all(|(k, _)| k != "STALE"));
    }
}
