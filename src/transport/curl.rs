use crate::config::CurlLogSettings;
use crate::transport::types::Attachment;
use reqwest::Method;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const RULER_WIDTH: usize = 80;

/// Append-only sink for reproducible curl commands.
///
/// Constructed once from [`CurlLogSettings`] and shared by every transport that should report
/// into it. Writes are serialized through a mutex so concurrent workflow runs do not interleave
/// entries.
pub struct CommandLog {
    enabled: bool,
    console: bool,
    file: Option<Mutex<File>>,
}

impl CommandLog {
    /// Build a sink from settings, opening the log file in append mode.
    pub fn new(settings: &CurlLogSettings) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }

        let file = settings.file.as_ref().and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(Mutex::new(file)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to open curl log file");
                    None
                }
            }
        });

        tracing::info!(
            file = ?settings.file,
            console = settings.console,
            "Curl command logging enabled"
        );

        Self {
            enabled: true,
            console: settings.console,
            file,
        }
    }

    /// Sink that drops everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            console: false,
            file: None,
        }
    }

    /// Whether commands should be rendered at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append one framed entry for an operation.
    pub fn record(&self, operation: &str, command: &str) {
        if !self.enabled {
            return;
        }

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        let entry = format_entry(operation, &timestamp, command);
        tracing::debug!(target: "nebuia_curl", operation, "{command}");

        if self.console {
            eprint!("{entry}");
        }

        if let Some(file) = &self.file {
            let mut guard = match file.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(err) = guard.write_all(entry.as_bytes()) {
                tracing::warn!(error = %err, "Failed to append curl command");
            }
        }
    }
}

fn format_entry(operation: &str, timestamp: &str, command: &str) -> String {
    let ruler = "=".repeat(RULER_WIDTH);
    format!(
        "\n{ruler}\nOPERATION: {operation}\nTIMESTAMP: {timestamp}\nCURL COMMAND:\n{command}\n{ruler}\n"
    )
}

/// Render a request as an equivalent shell command line.
pub fn render_curl_command(
    method: &Method,
    url: &str,
    headers: &[(&str, &str)],
    query: &[(String, String)],
    body: Option<&Value>,
    attachment: Option<&Attachment>,
    connect_timeout: Duration,
) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        method.as_str().to_uppercase(),
    ];

    let full_url = if query.is_empty() {
        url.to_string()
    } else {
        let query_string = query
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{url}?{query_string}")
    };
    parts.push(shell_quote(&full_url));

    for (key, value) in headers {
        parts.push("-H".to_string());
        parts.push(shell_quote(&format!("{key}: {value}")));
    }

    match attachment {
        Some(attachment) => {
            for (key, value) in &attachment.fields {
                parts.push("-F".to_string());
                parts.push(shell_quote(&format!("{key}={value}")));
            }
            parts.push("-F".to_string());
            parts.push(shell_quote(&format!(
                "{}=@{}",
                attachment.field, attachment.file_name
            )));
        }
        None => {
            if let Some(body) = body {
                parts.push("--data".to_string());
                parts.push(shell_quote(&body.to_string()));
            }
        }
    }

    parts.push("--connect-timeout".to_string());
    parts.push(connect_timeout.as_secs().to_string());

    parts.join(" ")
}

/// POSIX shell quoting: safe words pass through, everything else is single-quoted.
fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r#"'"'"'"#))
    }
}
