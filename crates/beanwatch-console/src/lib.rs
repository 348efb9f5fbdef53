//! Colourful console output for change notification.
//!
//! Provides a custom `tracing` layer that formats beanwatch events with
//! colours. Enabled through the `console` feature of the facade crate.

use std::io::{self, Write};
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "beanwatch=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. Leaves an
/// already installed global subscriber in place.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ChangeConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats beanwatch events with colours.
pub struct ChangeConsoleLayer;

impl<S: Subscriber> Layer<S> for ChangeConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        // Only handle beanwatch events
        if !metadata.target().starts_with("beanwatch") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    message: Option<String>,
    event: Option<String>,
    source: Option<String>,
    property: Option<String>,
    old: Option<String>,
    new: Option<String>,
    value: Option<String>,
    prefix: Option<String>,
    error: Option<String>,
    site: Option<String>,
    decision: Option<String>,
    collection_policy: Option<String>,
    index: Option<u64>,
    listeners: Option<u64>,
    intercepted: Option<bool>,
}

impl EventVisitor {
    fn set_str(&mut self, name: &str, s: String) {
        match name {
            "message" => self.message = Some(s),
            "event" => self.event = Some(s),
            "source" => self.source = Some(s),
            "property" => self.property = Some(s),
            "old" => self.old = Some(s),
            "new" => self.new = Some(s),
            "value" => self.value = Some(s),
            "prefix" => self.prefix = Some(s),
            "error" => self.error = Some(s),
            "site" => self.site = Some(s),
            "decision" => self.decision = Some(s),
            "collection_policy" => self.collection_policy = Some(s),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_str(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_str(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "index" => self.index = Some(value),
            "listeners" => self.listeners = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "intercepted" {
            self.intercepted = Some(value);
        }
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    let body = match v.event.as_deref() {
        Some("property_change") => format_property_change(v),
        Some("dispatch") => format_dispatch(v),
        Some("change_suppressed") => format_suppressed(v),
        Some("listener_failed") => format_listener_failed(v),
        Some("capture_failed") => format_capture_failed(v),
        Some("classify") => format_classify(v),
        Some("interceptor_installed") => format!(
            "{} interceptor installed, collection policy ({})",
            "[Intercept]".bright_cyan(),
            v.collection_policy.as_deref().unwrap_or("Ignore").yellow()
        ),
        _ => match &v.message {
            Some(message) => message.clone(),
            None => return String::new(),
        },
    };

    format!("{} {} {}", timestamp().bright_black(), format_level(level), body)
}

fn format_property_change(v: &EventVisitor) -> String {
    let prefix = match v.prefix.as_deref() {
        Some(p) if !p.is_empty() => format!("[{}]", p),
        _ => "[Change]".to_string(),
    };
    format!(
        "{} {}.{}: {} {} {}",
        prefix.bright_cyan(),
        v.source.as_deref().unwrap_or("?").white().bold(),
        v.property.as_deref().unwrap_or("?").bright_white(),
        v.old.as_deref().unwrap_or("?").bright_black(),
        "->".bright_blue(),
        v.new.as_deref().unwrap_or("?").bright_green()
    )
}

fn format_dispatch(v: &EventVisitor) -> String {
    format!(
        "{} {}.{} to {} listener(s)",
        "[Dispatch]".bright_cyan(),
        v.source.as_deref().unwrap_or("?").white(),
        v.property.as_deref().unwrap_or("?").white(),
        v.listeners.unwrap_or(0).to_string().yellow()
    )
}

fn format_suppressed(v: &EventVisitor) -> String {
    format!(
        "{} {}.{} unchanged ({})",
        "[Change]".bright_cyan(),
        v.source.as_deref().unwrap_or("?").white(),
        v.property.as_deref().unwrap_or("?").white(),
        v.value.as_deref().unwrap_or("?").bright_black()
    )
}

fn format_listener_failed(v: &EventVisitor) -> String {
    format!(
        "{} listener #{} failed on {}.{}: {}",
        "[Dispatch]".bright_cyan(),
        v.index.unwrap_or(0),
        v.source.as_deref().unwrap_or("?").white(),
        v.property.as_deref().unwrap_or("?").white(),
        v.error.as_deref().unwrap_or("unknown error").bright_red()
    )
}

fn format_capture_failed(v: &EventVisitor) -> String {
    format!(
        "{} {} {}.{}",
        "[Intercept]".bright_cyan(),
        v.message
            .as_deref()
            .unwrap_or("could not retrieve value for property")
            .yellow(),
        v.source.as_deref().unwrap_or("?").white(),
        v.property.as_deref().unwrap_or("?").white()
    )
}

fn format_classify(v: &EventVisitor) -> String {
    let verdict = if v.intercepted.unwrap_or(false) {
        "intercepted".bright_green().to_string()
    } else {
        "skipped".bright_black().to_string()
    };
    format!(
        "{} {} {} {}",
        "[Intercept]".bright_cyan(),
        v.site.as_deref().unwrap_or("?").white(),
        verdict,
        v.decision.as_deref().unwrap_or("").bright_black()
    )
}

fn format_level(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR".bright_red().to_string(),
        Level::WARN => " WARN".yellow().to_string(),
        Level::INFO => " INFO".bright_green().to_string(),
        Level::DEBUG => "DEBUG".bright_blue().to_string(),
        Level::TRACE => "TRACE".bright_black().to_string(),
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}
