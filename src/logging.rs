use std::{fs::OpenOptions, path::PathBuf};

#[cfg(target_os = "macos")]
const PLATFORM_LOG_SEGMENTS: &[&str] = &["Library", "Logs", "OllamaTrayHero"];
#[cfg(not(target_os = "macos"))]
const PLATFORM_LOG_SEGMENTS: &[&str] = &[".config", "ollama-tray-hero", "logs"];

const LOG_FILE_NAME: &str = "ollama-tray-hero.log";

pub fn log_directory() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    for segment in PLATFORM_LOG_SEGMENTS {
        path.push(segment);
    }
    Some(path)
}

pub fn log_file_path() -> Option<PathBuf> {
    let mut dir = log_directory()?;
    dir.push(LOG_FILE_NAME);
    Some(dir)
}

/// Installs the global logger. `RUST_LOG` overrides the default `info`
/// level; output goes to the log file, or stderr when it cannot be opened.
pub fn init() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let file = log_directory()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok())
        .and_then(|_| log_file_path())
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // A logger installed by an embedding shell wins.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_in_log_directory() {
        let (Some(dir), Some(file)) = (log_directory(), log_file_path()) else {
            return;
        };
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert!(file.ends_with(LOG_FILE_NAME));
    }
}
