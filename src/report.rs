mod console;

pub use console::ConsoleReport;

/// One report event. Severities carry a message; phase markers scope
/// timed sections for observability. Events are a side channel only,
/// never consulted for control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Info(String),
    Warning(String),
    Error(String),
    PhaseStart(String),
    PhaseEnd(String),
}

/// Append-only event sink. Written from a single thread only.
///
/// Implementations accumulate severity so the command can derive its
/// exit code from whether any error was reported.
pub trait ReportSink {
    fn emit(&mut self, event: ReportEvent);

    /// Number of error events emitted so far.
    fn error_count(&self) -> usize;

    fn info(&mut self, message: String) {
        self.emit(ReportEvent::Info(message));
    }

    fn warning(&mut self, message: String) {
        self.emit(ReportEvent::Warning(message));
    }

    fn error(&mut self, message: String) {
        self.emit(ReportEvent::Error(message));
    }

    fn phase_start(&mut self, name: &str) {
        self.emit(ReportEvent::PhaseStart(name.to_string()));
    }

    fn phase_end(&mut self, name: &str) {
        self.emit(ReportEvent::PhaseEnd(name.to_string()));
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Sink that keeps every event in memory for inspection after a run.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReport {
    events: Vec<ReportEvent>,
    errors: usize,
}

#[cfg(test)]
impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn infos(&self) -> Vec<&str> {
        self.filter(|e| match e {
            ReportEvent::Info(m) => Some(m.as_str()),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.filter(|e| match e {
            ReportEvent::Warning(m) => Some(m.as_str()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<&str> {
        self.filter(|e| match e {
            ReportEvent::Error(m) => Some(m.as_str()),
            _ => None,
        })
    }

    fn filter<'a>(&'a self, f: impl Fn(&'a ReportEvent) -> Option<&'a str>) -> Vec<&'a str> {
        self.events.iter().filter_map(f).collect()
    }
}

#[cfg(test)]
impl ReportSink for MemoryReport {
    fn emit(&mut self, event: ReportEvent) {
        if matches!(event, ReportEvent::Error(_)) {
            self.errors += 1;
        }
        self.events.push(event);
    }

    fn error_count(&self) -> usize {
        self.errors
    }
}
