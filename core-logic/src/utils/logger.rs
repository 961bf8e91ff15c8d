use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Directives used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVES: &str = "warn,task_result=info,core_logic=info,pharos_bot=info";

/// Install the console logger.
///
/// Output goes to stdout through a non-blocking writer. The returned guard
/// flushes pending lines on drop and MUST be kept alive by the caller.
pub fn setup_logger() -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(filter);

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();

    guard
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// Colourize the outcome words in a log line.
pub(crate) fn colorize(msg: String) -> String {
    if msg.contains("SUCCESS") || msg.contains("Success") {
        let green_text = Style::new().fg(Color::LightGreen).bold();
        msg.replace("SUCCESS", &format!("{}", green_text.paint("SUCCESS")))
            .replace("Success", &format!("{}", green_text.paint("Success")))
    } else if msg.contains("FAILED") || msg.contains("Failed") {
        let red_text = Style::new().fg(Color::LightRed).bold();
        msg.replace("FAILED", &format!("{}", red_text.paint("FAILED")))
            .replace("Failed", &format!("{}", red_text.paint("Failed")))
    } else {
        msg
    }
}

fn level_badge(level: &Level) -> String {
    match *level {
        Level::ERROR => Color::Red.bold().paint("ERR").to_string(),
        Level::WARN => Color::Yellow.bold().paint("WRN").to_string(),
        Level::INFO => Color::Cyan.paint("INF").to_string(),
        Level::DEBUG => Color::Blue.paint("DBG").to_string(),
        Level::TRACE => Color::DarkGray.paint("TRC").to_string(),
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);

        let timestamp = Local::now().format("%H:%M:%S");
        let dimmed = Style::new().dimmed();

        write!(
            writer,
            "{} {} {}",
            dimmed.paint(timestamp.to_string()),
            level_badge(event.metadata().level()),
            colorize(msg_visitor.message)
        )?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_leaves_plain_lines_alone() {
        assert_eq!(colorize("Balance: 1.0".to_string()), "Balance: 1.0");
    }

    #[test]
    fn test_colorize_marks_outcomes() {
        let ok = colorize("Faucet SUCCESS".to_string());
        assert!(ok.contains("\u{1b}["));
        let bad = colorize("Wrap FAILED".to_string());
        assert!(bad.contains("\u{1b}["));
    }
}
