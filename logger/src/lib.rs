use std::{
    fs::File,
    io::{self, Write},
    sync::Mutex,
    time::Instant,
};

use chrono::Utc;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// Where log lines end up: the console or a file in the temp directory.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum LogKind {
    Stdout,

    /// Writes to <tmpdir>/satsuma-<timestamp>.log
    File,
}

struct Logger {
    sink: Mutex<Box<dyn Write + Send>>,
    start_instant: Instant,
}

impl Logger {
    fn new(kind: LogKind) -> Self {
        let sink: Box<dyn Write + Send> = match kind {
            LogKind::Stdout => Box::new(io::stdout()),
            LogKind::File => {
                let filename = format!("satsuma-{}.log", Utc::now().timestamp());
                let path = std::env::temp_dir().join(filename);
                Box::new(File::create(path).unwrap())
            }
        };

        Self {
            sink: Mutex::new(sink),
            start_instant: Instant::now(),
        }
    }

    fn log<T>(&self, data: T)
    where
        T: std::fmt::Display,
    {
        let elapsed = self.start_instant.elapsed();
        let seconds = elapsed.as_secs();
        let hours = seconds / 3600;
        let minutes = (seconds / 60) % 60;
        let seconds = seconds % 60;
        let milliseconds = elapsed.subsec_millis();

        if let Ok(ref mut sink) = self.sink.lock() {
            writeln!(
                sink,
                "[{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}] {data}"
            )
            .unwrap();
        }
    }
}

/// Installs the global log sink. Calling it twice keeps the first sink.
pub fn init_logger(kind: LogKind) {
    LOGGER.set(Logger::new(kind)).ok();
}

/// Logs a line through the global sink. A no-op until `init_logger` runs,
/// so library code can log unconditionally.
pub fn log<T>(data: T)
where
    T: std::fmt::Display,
{
    if let Some(logger) = LOGGER.get() {
        logger.log(data);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{init_logger, log, LogKind};

    #[test]
    fn logger_file() {
        init_logger(LogKind::File);
        log("ok".to_string());

        let files = fs::read_dir(std::env::temp_dir()).unwrap();
        for f in files.flatten() {
            let p = f.path();
            if let Some(ext) = p.extension() {
                let s = p.to_str().unwrap();
                if ext == "log" && s.contains("satsuma") {
                    let content = fs::read_to_string(p.clone()).unwrap();
                    fs::remove_file(p).unwrap();
                    assert_eq!(content, "[00:00:00.000] ok\n".to_string());
                }
            }
        }
    }
}
