//! Output rendering for validation runs.
//!
//! Supports `human` (default) and `json` outputs. The JSON form carries every
//! event and a top-level summary. Reports go to stdout; progress lines go to
//! the hub's sink (stderr).

use crate::models::Event;
use crate::report::Report;
use crate::utils::{glyph, use_colors};
use crate::validators::CATALOG;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Print a finished report in the requested format.
pub fn print_report(report: &Report, output: &str) {
    match output {
        "json" => println!("{:#}", compose_report_json(report)),
        _ => {
            for line in render_human(report, use_colors(output)) {
                println!("{}", line);
            }
        }
    }
}

/// Human lines: one per failure or noted pass, then the summary.
pub fn render_human(report: &Report, color: bool) -> Vec<String> {
    let mut lines: Vec<String> = report
        .events()
        .iter()
        .filter(|ev| ev.is_failure() || ev.message().is_some())
        .map(|ev| event_line(ev, color))
        .collect();
    let s = report.summary();
    let summary = format!(
        "— Summary — passed={} failures={} errors={} warnings={} files={}",
        s.passed, s.failures, s.errors, s.warnings, s.files
    );
    lines.push(if color { summary.bold().to_string() } else { summary });
    lines
}

fn event_line(ev: &Event, color: bool) -> String {
    let (tag, icon) = match (ev.is_failure(), ev.severity()) {
        (_, "warning" | "warn") => ("⟦warn⟧", "▲"),
        (true, _) => ("⟦error⟧", "✖"),
        (false, _) => ("⟦info⟧", "◆"),
    };
    let message = ev.message().unwrap_or_default();
    if !color {
        return format!("{} {} {} ❲{}❳ — {}", icon, tag, ev.file(), ev.source(), message);
    }
    let (tag, icon) = match tag {
        "⟦error⟧" => (tag.red().bold().to_string(), icon.red().to_string()),
        "⟦warn⟧" => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        _ => (tag.blue().bold().to_string(), icon.blue().to_string()),
    };
    format!(
        "{} {} {} ❲{}❳ — {}",
        icon,
        tag,
        ev.file().bold(),
        ev.source(),
        message
    )
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    json!({
        "events": report.events(),
        "summary": report.summary(),
    })
}

/// The settled line a validator prints once its progress is over.
pub fn spinner_message(text: &str, success: bool) -> String {
    format!("{} {}", glyph(success), text)
}

/// Print every selectable validator name.
pub fn print_validators(output: &str) {
    match output {
        "json" => println!("{:#}", compose_validators_json()),
        _ => {
            let color = use_colors(output);
            for (group, phases) in CATALOG {
                if color {
                    println!("{}", group.bold());
                } else {
                    println!("{}", group);
                }
                for phase in phases.iter() {
                    println!("  {}", phase);
                }
            }
        }
    }
}

pub fn compose_validators_json() -> JsonVal {
    let items: Vec<_> = CATALOG
        .iter()
        .map(|(group, phases)| json!({"name": group, "phases": phases}))
        .collect();
    json!({ "validators": items })
}
