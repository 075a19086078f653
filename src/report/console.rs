use std::time::Instant;

use tracing::{error, info, warn};

use super::{ReportEvent, ReportSink};

/// Sink that writes events through tracing and times phases.
#[derive(Debug, Default)]
pub struct ConsoleReport {
    errors: usize,
    //innermost phase last
    phases: Vec<(String, Instant)>,
}

impl ConsoleReport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for ConsoleReport {
    fn emit(&mut self, event: ReportEvent) {
        match event {
            ReportEvent::Info(message) => info!("{}", message),
            ReportEvent::Warning(message) => warn!("{}", message),
            ReportEvent::Error(message) => {
                self.errors += 1;
                error!("{}", message);
            }
            ReportEvent::PhaseStart(name) => {
                info!("{} started", name);
                self.phases.push((name, Instant::now()));
            }
            ReportEvent::PhaseEnd(name) => {
                // Unwind to the matching start so an unbalanced end
                // doesn't leave stale entries behind
                while let Some((started_name, started_at)) = self.phases.pop() {
                    if started_name == name {
                        info!("{} completed in {}ms", name, started_at.elapsed().as_millis());
                        return;
                    }
                }
                info!("{} completed", name);
            }
        }
    }

    fn error_count(&self) -> usize {
        self.errors
    }
}
