use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

pub trait Logger {
    fn log(&mut self, message: &str);
    fn debug_log(&mut self, message: &str);
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// stdout carries the KEY=VALUE report, so everything else goes to stderr
#[derive(Debug)]
pub struct StderrLogger {
    debug: bool,
}

impl StderrLogger {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl Logger for StderrLogger {
    fn log(&mut self, message: &str) {
        eprintln!("{}: {}", timestamp(), message);
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            eprintln!("{}: [DEBUG] {}", timestamp(), message);
        }
    }
}

#[derive(Debug)]
pub struct FileLogger {
    log_file: PathBuf,
    debug: bool,
}

impl FileLogger {
    pub fn new(log_file: &Path, debug: bool) -> std::io::Result<Self> {
        // Create log directory if it doesn't exist
        if let Some(parent) = log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(FileLogger {
            log_file: log_file.to_path_buf(),
            debug,
        })
    }

    fn write_to_file(&self, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        writeln!(file, "{}: {}", timestamp(), message)
    }
}

impl Logger for FileLogger {
    fn log(&mut self, message: &str) {
        if let Err(e) = self.write_to_file(message) {
            eprintln!("Failed to write to log file: {}", e);
        }
    }

    fn debug_log(&mut self, message: &str) {
        if self.debug {
            if let Err(e) = self.write_to_file(&format!("[DEBUG] {}", message)) {
                eprintln!("Failed to write debug log: {}", e);
            }
        }
    }
}

// MultiLogger allows logging to multiple destinations
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn Logger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, logger: Box<dyn Logger>) -> Self {
        self.loggers.push(logger);
        self
    }
}

impl Logger for MultiLogger {
    fn log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.log(message);
        }
    }

    fn debug_log(&mut self, message: &str) {
        for logger in &mut self.loggers {
            logger.debug_log(message);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Default)]
    pub(crate) struct MockLogger {
        pub logs: Vec<String>,
    }

    impl Logger for MockLogger {
        fn log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }

        fn debug_log(&mut self, message: &str) {
            self.logs.push(format!("DEBUG: {}", message));
        }
    }

    #[test]
    fn file_logger_skips_debug_lines_unless_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("signer.log");

        let mut quiet = FileLogger::new(&path, false).unwrap();
        quiet.log("first");
        quiet.debug_log("hidden");

        let mut loud = FileLogger::new(&path, true).unwrap();
        loud.debug_log("shown");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": first"));
        assert!(lines[1].ends_with(": [DEBUG] shown"));
    }

    #[test]
    fn multi_logger_fans_out_to_every_destination() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a.log");
        let second = temp_dir.path().join("b.log");

        let mut logger = MultiLogger::new()
            .with(Box::new(FileLogger::new(&first, false).unwrap()))
            .with(Box::new(FileLogger::new(&second, false).unwrap()));
        logger.log("issued");

        for path in [first, second] {
            let content = fs::read_to_string(path).unwrap();
            assert!(content.contains("issued"));
        }
    }
}
