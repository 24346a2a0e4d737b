//! Progress UI for save runs, driven by pipeline events.

use std::io::Write;

use fetchtv_core::{OutcomeKind, SaveEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

/// Spawns the event renderer.
/// Returns the sender to hand to the pipeline and the handle to await once
/// the pipeline (and with it the sender) has been dropped.
pub(crate) fn spawn_event_renderer() -> (UnboundedSender<SaveEvent>, JoinHandle<()>) {
    let (tx, rx) = unbounded_channel();
    let handle = tokio::spawn(render_events(rx));
    (tx, handle)
}

async fn render_events(mut rx: UnboundedReceiver<SaveEvent>) {
    let mut bar: Option<ProgressBar> = None;
    while let Some(event) = rx.recv().await {
        match event {
            SaveEvent::ItemStarted { title, .. } => {
                let started = ProgressBar::new_spinner();
                started.set_style(
                    ProgressStyle::with_template("{spinner} {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                started.set_message(format!("Writing: [{title}]"));
                bar = Some(started);
            }
            SaveEvent::Progress {
                bytes_written,
                expected_bytes,
                ..
            } => {
                if let Some(bar) = &bar {
                    if let Some(total) = expected_bytes
                        && bar.length() != Some(total)
                    {
                        bar.set_length(total);
                        bar.set_style(
                            ProgressStyle::with_template(
                                "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                            )
                            .unwrap_or_else(|_| ProgressStyle::default_bar()),
                        );
                    }
                    bar.set_position(bytes_written);
                }
            }
            SaveEvent::ItemFinished {
                title,
                kind,
                message,
                ..
            } => {
                if let Some(bar) = bar.take() {
                    bar.finish_and_clear();
                }
                if let Some(line) = finished_line(&title, kind, message.as_deref()) {
                    print_line(&line);
                }
            }
            SaveEvent::NothingNew => print_line("\t -- There is nothing new to record"),
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}

fn finished_line(title: &str, kind: OutcomeKind, message: Option<&str>) -> Option<String> {
    match (kind, message) {
        (OutcomeKind::SkippedAlreadySaved, _) => None,
        (OutcomeKind::Completed, _) => Some(format!("\t -- Saved: [{title}]")),
        (OutcomeKind::CompletedShort, Some(message)) => {
            Some(format!("\t -- Saved: [{title}]\n\t\t -- [!] {message}"))
        }
        (_, Some(message)) => Some(format!("\t\t -- [!] {message}: [{title}]")),
        (_, None) => Some(format!("\t\t -- [!] {kind:?}: [{title}]")),
    }
}

fn print_line(line: &str) {
    let mut stdout = std::io::stdout().lock();
    // stdout closing mid-run is not worth aborting the save for
    let _ = writeln!(stdout, "{line}");
}
