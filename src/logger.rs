use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static VISAGE_LOGGER: Lazy<VisageLogger> = Lazy::new(VisageLogger::new);

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    VISAGE_LOGGER.update_config(config.clone());

    if let Err(e) = log::set_logger(&*VISAGE_LOGGER) {
        return Err(format!("Failed to set logger: {:?}", e));
    }

    log::set_max_level(config.min_level.to_log_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Convert to log crate's Level
    pub fn to_log_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        self.to_log_level().to_level_filter()
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One emitted line, also the JSON shape in production mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub line: u32,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, module: String, line: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            message,
            module,
            line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_module: bool,
    pub timestamp_format: String,
    pub output_json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_module: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    /// JSON lines at info level, for hosted deployments.
    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_colors: true,
            output_json: false,
            ..Default::default()
        }
    }

    /// Debug mode gets the development profile.
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            Self::development()
        } else {
            Self::production()
        }
    }
}

pub struct VisageLogger {
    config: Mutex<LoggerConfig>,
}

impl VisageLogger {
    pub fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
        }
    }

    pub fn update_config(&self, new_config: LoggerConfig) {
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_console_output(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = entry.level.as_str();

        if !config.show_colors {
            let module = if config.show_module {
                format!("{}:{} ", entry.module, entry.line)
            } else {
                String::new()
            };
            return format!("{} [{}] {}{}", timestamp, level, module, entry.message);
        }

        let module = if config.show_module {
            format!("{} ", format!("{}:{}", entry.module, entry.line).bright_blue())
        } else {
            String::new()
        };
        format!(
            "{} [{}] {}{}",
            timestamp.bright_black(),
            level.color(entry.level.color()).bold(),
            module,
            entry.message
        )
    }

    fn create_log_entry(&self, record: &Record) -> LogEntry {
        LogEntry::new(
            LogLevel::from_log_level(record.level()),
            record.args().to_string(),
            record.module_path().unwrap_or("unknown").to_string(),
            record.line().unwrap_or(0),
        )
    }
}

impl Default for VisageLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl log::Log for VisageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_log_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = self.create_log_entry(record);
        if let Ok(config) = self.config.lock() {
            let line = if config.output_json {
                serde_json::to_string(&entry).unwrap_or_default()
            } else {
                self.format_console_output(&entry, &config)
            };
            // stderr for errors so hosting platforms flag them
            if entry.level >= LogLevel::Error {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}

/// Logs how long a pipeline stage took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("Starting {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("{} took {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, port: u16) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Listening on http://0.0.0.0:{}", port);
}

/// Never prints credentials, only whether they are set.
pub fn log_config_info(config: &crate::config::AppConfig) {
    let set = |v: &Option<String>| if v.is_some() { "set" } else { "missing" };
    log::info!("Configuration loaded:");
    log::info!("   Provider: {:?}", config.generation.provider);
    log::info!(
        "   Images per request: {} ({}), concurrency {}",
        config.generation.image_count,
        config.generation.image_size,
        config.generation.concurrency
    );
    log::info!(
        "   Failure policy: {:?}, retries {}",
        config.generation.failure_policy,
        config.generation.retries
    );
    log::info!(
        "   Prompt strategy: {:?}, age required: {}",
        config.generation.prompt_strategy,
        config.generation.require_age
    );
    log::info!("   OpenAI key: {}", set(&config.openai.api_key));
    log::info!(
        "   Cloudinary: cloud {}, key {}, secret {}",
        set(&config.cloudinary.cloud_name),
        set(&config.cloudinary.api_key),
        set(&config.cloudinary.api_secret)
    );
    log::info!("   Allowed origins: {}", config.server.allowed_origins.join(", "));
    log::info!("   Debug mode: {}", config.server.debug);
}
