//! Surface that writes the status region to stderr and results to stdout.

use client_core::{render::render_list_view, ControlId, ControlState, ListView, Surface};
use shared::domain::Severity;

pub struct TerminalSurface;

fn tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Neutral => "",
        Severity::Info => "[info] ",
        Severity::Success => "[ok] ",
        Severity::Error => "[error] ",
    }
}

impl Surface for TerminalSurface {
    fn status(&self, severity: Severity, message: &str) {
        if message.is_empty() {
            return;
        }
        eprintln!("{}{message}", tag(severity));
    }

    fn results(&self, view: &ListView) {
        match view {
            ListView::Loading => eprint!("{}", render_list_view(view)),
            other => print!("{}", render_list_view(other)),
        }
    }

    fn control(&self, control: ControlId, state: ControlState) {
        tracing::debug!(?control, busy = state.is_busy(), label = state.label(), "control");
    }
}
