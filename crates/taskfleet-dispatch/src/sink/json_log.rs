//! JSON-lines sink: console plus a timestamped log file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use taskfleet_core::{LifecycleEvent, RunReport};

use super::{ObservabilitySink, SinkError};
use crate::summary;

/// Console destination, stdout unless replaced.
type Console = Mutex<Box<dyn Write + Send>>;

/// Writes each event as one JSON line to the console (stdout by default)
/// and to `<dir>/log_YYYYMMDD_HHMMSS.json`.
pub struct JsonLogSink {
    file: Option<(PathBuf, Mutex<File>)>,
    console: Option<Console>,
    color: bool,
}

impl JsonLogSink {
    /// Create a sink logging to a new timestamped file under `dir`.
    ///
    /// The directory is created if missing.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let name = format!("log_{}.json", chrono::Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file: Some((path, Mutex::new(file))),
            console: Some(stdout_console()),
            color: true,
        })
    }

    /// Create a sink that only writes to the console.
    pub fn console_only() -> Self {
        Self {
            file: None,
            console: Some(stdout_console()),
            color: true,
        }
    }

    /// Builder method to toggle console output.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console.then(stdout_console);
        self
    }

    /// Builder method to send console output to `writer` instead of stdout.
    pub fn with_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Some(Mutex::new(Box::new(writer)));
        self
    }

    /// Builder method to toggle colors in the summary table.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Path of the log file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }
}

impl ObservabilitySink for JsonLogSink {
    fn emit(&self, event: &LifecycleEvent) -> Result<(), SinkError> {
        let line = event.to_json_line()?;

        if let Some(console) = &self.console {
            let mut out = lock(console);
            writeln!(out, "{}", line)?;
            out.flush()?;
        }

        if let Some((_, file)) = &self.file {
            let mut file = lock(file);
            writeln!(file, "{}", line)?;
            file.flush()?;
        }

        Ok(())
    }

    fn render_summary(&self, report: &RunReport) -> Result<(), SinkError> {
        let Some(console) = &self.console else {
            return Ok(());
        };

        let mut out = lock(console);
        writeln!(out)?;
        writeln!(out, "EXECUTION SUMMARY")?;
        write!(out, "{}", summary::render_table(report, self.color))?;
        if let Some(path) = self.path() {
            writeln!(out)?;
            writeln!(out, "Logs saved to: {}", path.display())?;
        }
        out.flush()?;
        Ok(())
    }
}

fn stdout_console() -> Console {
    Mutex::new(Box::new(io::stdout()))
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use taskfleet_core::{finalize, Outcome};

    /// Console writer whose contents stay readable after the sink owns it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("taskfleet-log-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_events_appended_to_file() {
        let dir = temp_dir();
        let sink = JsonLogSink::create(&dir).unwrap().with_console(false);

        sink.emit(&LifecycleEvent::start(2)).unwrap();
        sink.emit(&LifecycleEvent::start(3)).unwrap();

        let path = sink.path().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("log_") && name.ends_with(".json"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "start");
        assert_eq!(lines[1]["details"]["total_tasks"], 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_summary_written_to_console() {
        let dir = temp_dir();
        let console = SharedBuffer::default();
        let sink = JsonLogSink::create(&dir)
            .unwrap()
            .with_color(false)
            .with_writer(console.clone());

        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            "task_a".to_string(),
            Outcome::success(json!("Hello from Task A"), 0, Duration::from_millis(250)),
        );
        let report = finalize(outcomes);

        sink.emit(&LifecycleEvent::summary(&report)).unwrap();
        sink.render_summary(&report).unwrap();

        let out = console.contents();
        let mut lines = out.lines();
        let event: Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(event["event"], "summary");
        assert!(out.contains("EXECUTION SUMMARY"));
        assert!(out.contains(&summary::render_table(&report, false)));
        let path = sink.path().unwrap().display().to_string();
        assert!(out.trim_end().ends_with(&format!("Logs saved to: {}", path)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_console_disabled_skips_summary() {
        let sink = JsonLogSink::console_only().with_console(false);
        let report = finalize(BTreeMap::new());
        sink.render_summary(&report).unwrap();
        sink.emit(&LifecycleEvent::start(1)).unwrap();
    }

    #[test]
    fn test_console_only_has_no_path() {
        let sink = JsonLogSink::console_only();
        assert!(sink.path().is_none());
    }
}
