//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform dei tool esterni.
//! L'unico tool richiesto è `ffmpeg`; il path può essere forzato da
//! configurazione, altrimenti viene cercato nel `PATH` di sistema.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
        }

        Self { commands }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Resolve a tool to an executable path.
    ///
    /// An explicit override wins when it exists; otherwise every `PATH`
    /// entry is searched for the platform command name.
    pub fn resolve_tool(&self, base_name: &str, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                debug!("Using configured {}: {}", base_name, path.display());
                return Some(path.to_path_buf());
            }
            debug!("Configured {} does not exist: {}", base_name, path.display());
            return None;
        }

        let command = self.get_command(base_name);
        let found = env::var_os("PATH").and_then(|paths| {
            env::split_paths(&paths)
                .map(|dir| dir.join(command))
                .find(|candidate| candidate.is_file())
        });
        match &found {
            Some(path) => debug!("Resolved {} -> {}", base_name, path.display()),
            None => debug!("{} not found in PATH", base_name),
        }
        found
    }

    /// Check if a tool is available
    pub fn is_command_available(&self, base_name: &str, explicit: Option<&Path>) -> bool {
        self.resolve_tool(base_name, explicit).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform.get_command("ffmpeg");
        if cfg!(windows) {
            assert_eq!(ffmpeg, "ffmpeg.exe");
        } else {
            assert_eq!(ffmpeg, "ffmpeg");
        }
        assert_eq!(platform.get_command("unknown-tool"), "unknown-tool");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("my-ffmpeg");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let platform = PlatformCommands::instance();
        assert_eq!(platform.resolve_tool("ffmpeg", Some(&fake)), Some(fake.clone()));
    }

    #[test]
    fn test_missing_explicit_path_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let platform = PlatformCommands::instance();
        assert!(!platform.is_command_available("ffmpeg", Some(&missing)));
    }
}
