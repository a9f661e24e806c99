//! Output formatting for eventstream (text, json)

use clap::ValueEnum;
use colored::Colorize;
use eventstream_client::SessionEvent;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One event per line (default)
    #[default]
    Text,
    /// One JSON object per notification
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print a session notification in the configured format.
    ///
    /// Event lines go to stdout; in text mode status changes are reported
    /// on stderr so stdout only carries events. `reconnect_ms` is `None`
    /// when the session will not reconnect.
    pub fn print_notification(&self, notification: &SessionEvent, reconnect_ms: Option<u64>) {
        match self.format {
            OutputFormat::Text => match notification {
                SessionEvent::Opened => self.success("Stream open"),
                SessionEvent::Event(line) => println!("{}", line),
                SessionEvent::Error(reason) => self.warn(&format_error(reason, reconnect_ms)),
            },
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(notification) {
                    println!("{}", json);
                }
            }
        }
    }
}

fn format_error(reason: &Option<String>, reconnect_ms: Option<u64>) -> String {
    let message = match reason {
        Some(reason) => format!("Stream error: {}", reason),
        None => "Stream ended by server".to_string(),
    };
    match reconnect_ms {
        Some(ms) => format!("{} (reconnecting in {}ms)", message, ms),
        None => format!("{} (not reconnecting)", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("table"), None);
    }

    #[test]
    fn test_format_error() {
        assert_eq!(
            format_error(&None, Some(3000)),
            "Stream ended by server (reconnecting in 3000ms)"
        );
        assert_eq!(
            format_error(&Some("Connection error: refused".into()), Some(50)),
            "Stream error: Connection error: refused (reconnecting in 50ms)"
        );
    }

    #[test]
    fn test_format_terminal_error() {
        assert_eq!(
            format_error(&Some("Stream cancelled".into()), None),
            "Stream error: Stream cancelled (not reconnecting)"
        );
    }
}
