//! Small helpers shared by printers and validators.

use owo_colors::OwoColorize;
use std::path::Path;

/// Colors are used unless the caller asked for JSON or `NO_COLOR` is set.
pub fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// `[✔]`/`[✖]`, colored unless `NO_COLOR` is set.
pub fn glyph(success: bool) -> String {
    let color = use_colors("human");
    match (success, color) {
        (true, true) => format!("[{}]", "✔".green()),
        (true, false) => "[✔]".to_string(),
        (false, true) => format!("[{}]", "✖".red()),
        (false, false) => "[✖]".to_string(),
    }
}

/// Render `path` relative to the current working directory when possible.
pub fn rel_to_wd(path: &Path) -> String {
    let rel = std::env::current_dir()
        .ok()
        .and_then(|wd| pathdiff::diff_paths(path, wd))
        .unwrap_or_else(|| path.to_path_buf());
    rel.to_string_lossy().replace('\\', "/")
}
