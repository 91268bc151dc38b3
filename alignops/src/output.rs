//! Stdout rendering shared by subcommands.

use alignops_core::diagnostic::{Diagnostics, Severity};
use alignops_core::pipeline::Tally;

/// Diagnostics shown in full before the rest are summarized by kind.
const DIAGNOSTIC_LIMIT: usize = 20;

/// Print diagnostics, errors first, followed by per-kind counts.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }

    let mut ordered: Vec<_> = diagnostics.iter().collect();
    ordered.sort_by_key(|d| d.severity() != Severity::Error);

    println!("diagnostics:");
    for d in ordered.iter().take(DIAGNOSTIC_LIMIT) {
        println!("  {d}");
    }
    if ordered.len() > DIAGNOSTIC_LIMIT {
        println!("  ... {} more", ordered.len() - DIAGNOSTIC_LIMIT);
    }

    let counts = diagnostics
        .counts()
        .into_iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("  by kind: {counts}");
}

pub fn print_tally(tally: &Tally) {
    println!("{tally}");
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((at, _)) => format!("{}...", &text[..at]),
        None => text.to_string(),
    }
}
