//! Reader — turns lines from a serial-like source into published records.
//!
//! One record is published per non-empty line: the capture timestamp is
//! attached at read time and the result is sent to the `sonda/uart` channel.
//! No acknowledgement is awaited; the loop runs until the process is
//! terminated or the source fails hard.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::info;

use crate::wire::format_record;

/// A source of raw probe lines.
///
/// `next_line` blocks with a bounded wait. `Ok(None)` means the wait timed
/// out or the line was empty; the caller discards it and reads again. `Err`
/// means the source itself failed and the loop should stop.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Reads lines from a serial device node (e.g. `/dev/ttyAMA0`). Framing and
/// read timeouts are the tty's; an empty line surfaces as `Ok(None)`. End of
/// input means the device is gone and is an error, not a timeout — a timed-out
/// tty read yields an empty line, never EOF.
pub struct DeviceSource {
    reader: BufReader<File>,
    path: PathBuf,
}

impl DeviceSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open serial device {}", path.display()))?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
        })
    }
}

impl LineSource for DeviceSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("failed to read from serial device")?;
        if n == 0 {
            bail!(
                "serial device {} reached end of input (disconnected?)",
                self.path.display()
            );
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(trimmed.to_string()))
    }
}

/// Emits an incrementing counter once per interval, for bench-testing the
/// pipeline without probe hardware attached.
pub struct SimulatedSource {
    interval: Duration,
    counter: u64,
}

impl SimulatedSource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            counter: 0,
        }
    }
}

impl LineSource for SimulatedSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        std::thread::sleep(self.interval);
        self.counter += 1;
        Ok(Some(self.counter.to_string()))
    }
}

/// Read lines and publish one timestamped record per line until the source
/// or the publish path fails.
pub fn run_publish_loop(
    source: &mut dyn LineSource,
    publish: &mut dyn FnMut(String) -> Result<()>,
) -> Result<()> {
    loop {
        let Some(line) = source.next_line()? else {
            continue;
        };

        let timestamp = Local::now().naive_local();
        let record = format_record(timestamp, &line);
        info!("Read: {record}");
        publish(record)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Yields a fixed script of results, then errors to stop the loop.
    struct ScriptedSource {
        script: Vec<Option<String>>,
    }

    impl LineSource for ScriptedSource {
        fn next_line(&mut self) -> Result<Option<String>> {
            if self.script.is_empty() {
                bail!("script exhausted");
            }
            Ok(self.script.remove(0))
        }
    }

    #[test]
    fn publishes_one_record_per_nonempty_line() {
        let mut source = ScriptedSource {
            script: vec![
                Some("21.5".to_string()),
                None, // timeout: discarded
                Some("21.6".to_string()),
            ],
        };

        let mut published = Vec::new();
        let result = run_publish_loop(&mut source, &mut |record| {
            published.push(record);
            Ok(())
        });

        assert!(result.is_err(), "loop stops only when the source fails");
        assert_eq!(published.len(), 2);
        assert!(published[0].ends_with(": 21.5"));
        assert!(published[1].ends_with(": 21.6"));
        // "<YYYY-MM-DD HH:MM:SS>: <line>" is 21 bytes of prefix
        assert_eq!(published[0].len(), "YYYY-MM-DD HH:MM:SS: 21.5".len());
    }

    #[test]
    fn device_source_fails_when_input_ends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uart");
        std::fs::write(&path, "21.5\n").unwrap();

        let mut source = DeviceSource::open(&path).unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("21.5"));

        // End of input is a disconnect, not a timeout: the loop must stop
        // instead of spinning on empty reads.
        let err = source.next_line().unwrap_err();
        assert!(err.to_string().contains("end of input"));
    }

    #[test]
    fn simulated_source_counts_up_from_one() {
        let mut source = SimulatedSource::new(Duration::from_millis(0));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("1"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn publish_errors_propagate() {
        let mut source = ScriptedSource {
            script: vec![Some("21.5".to_string())],
        };
        let result = run_publish_loop(&mut source, &mut |_| bail!("broker gone"));
        assert!(result.is_err());
    }
}
