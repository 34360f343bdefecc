//! Terminal rendering of a live session.
//!
//! The report goes to stdout as it grows; log entries, layout hints and the
//! task board go to stderr so the report can be piped.

use anyhow::{Result, bail};
use std::io::Write;
use swarm_application::{DriveOutcome, SessionService};
use swarm_core::Layout;
use swarm_core::session::{QueryRequest, SessionSnapshot};
use swarm_core::task::{Task, TaskStatus};
use swarm_interaction::StreamProvider;

/// What changed between two snapshots of the same session.
#[derive(Debug, Default, PartialEq)]
pub struct Delta {
    /// Report text to write. When `rewound` is set it restarts the line the
    /// report diverged on.
    pub report: String,
    /// The report no longer extends what was printed.
    pub rewound: bool,
    pub log_lines: Vec<String>,
    pub layout: Option<Layout>,
    pub tasks: Option<Vec<Task>>,
}

/// Tracks how much of a session has already been shown.
#[derive(Debug, Default)]
pub struct SessionPrinter {
    printed: String,
    log_count: usize,
    layout: Layout,
    tasks: Vec<Task>,
}

impl SessionPrinter {
    pub fn advance(&mut self, snapshot: &SessionSnapshot) -> Delta {
        let session = &snapshot.session;
        let mut delta = Delta::default();

        let start = if session.report.starts_with(self.printed.as_str()) {
            self.printed.len()
        } else {
            delta.rewound = true;
            let common = common_prefix_len(&self.printed, &session.report);
            session.report[..common].rfind('\n').map_or(0, |idx| idx + 1)
        };
        delta.report = session.report[start..].to_string();
        self.printed.clone_from(&session.report);

        if let Some(fresh) = session.log_lines.get(self.log_count..) {
            delta.log_lines = fresh.to_vec();
        }
        self.log_count = session.log_lines.len();

        if session.layout != self.layout {
            self.layout = session.layout;
            delta.layout = Some(session.layout);
        }

        if snapshot.tasks != self.tasks {
            self.tasks = snapshot.tasks.clone();
            delta.tasks = Some(snapshot.tasks.clone());
        }

        delta
    }
}

/// Length in bytes of the longest common prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, left), right)| left != right)
        .map_or_else(|| a.len().min(b.len()), |((idx, _), _)| idx)
}

fn status_mark(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::InProgress => "[~]",
        TaskStatus::Completed => "[x]",
    }
}

fn show(delta: Delta) -> Result<()> {
    for line in &delta.log_lines {
        eprintln!("  » {line}");
    }
    if let Some(layout) = delta.layout {
        eprintln!("  layout: {layout}");
    }
    if let Some(tasks) = &delta.tasks {
        eprintln!("  mission ({} tasks)", tasks.len());
        for task in tasks {
            eprintln!("    {} {}", status_mark(task.status), task.description);
        }
    }
    if delta.rewound || !delta.report.is_empty() {
        let mut stdout = std::io::stdout().lock();
        if delta.rewound {
            stdout.write_all(b"\n")?;
        }
        stdout.write_all(delta.report.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

fn show_summary(snapshot: &SessionSnapshot) {
    let session = &snapshot.session;
    if !session.report.ends_with('\n') && !session.report.is_empty() {
        println!();
    }
    if !session.references.is_empty() {
        eprintln!("\n  sources:");
        for reference in &session.references {
            eprintln!("    - {} <{}>", reference.title, reference.uri);
        }
    }
    if let Some(payload) = &session.structured_payload {
        eprintln!("\n  data: {payload}");
    }
}

/// Submits `request`, renders the session until its driver stops, and
/// reports a failed session as an error.
pub async fn stream_session<P: StreamProvider + 'static>(
    service: &SessionService<P>,
    request: QueryRequest,
    json: bool,
) -> Result<()> {
    let mut updates = service.subscribe().await;
    let handle = service.submit(request).await?;
    let session_id = handle.session_id().to_string();
    let token = handle.cancellation_token();

    let mut printer = SessionPrinter::default();
    let driver = handle.wait();
    tokio::pin!(driver);

    let outcome = loop {
        tokio::select! {
            outcome = &mut driver => break outcome?,
            Some(snapshot) = updates.recv() => {
                if !json && snapshot.session.id == session_id {
                    show(printer.advance(&snapshot))?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[Cli] interrupt received, cancelling session={}", session_id);
                token.cancel();
            }
        }
    };

    while let Ok(snapshot) = updates.try_recv() {
        if !json && snapshot.session.id == session_id {
            show(printer.advance(&snapshot))?;
        }
    }

    let Some(snapshot) = service.snapshot(&session_id).await else {
        bail!("Session {session_id} disappeared");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        show_summary(&snapshot);
    }

    match outcome {
        DriveOutcome::Completed => Ok(()),
        DriveOutcome::Cancelled => {
            eprintln!("\n  cancelled");
            Ok(())
        }
        DriveOutcome::Failed => {
            let message = snapshot
                .session
                .failure
                .as_ref()
                .map(|failure| failure.user_message())
                .unwrap_or_else(|| "The request failed.".to_string());
            bail!(message)
        }
    }
}
