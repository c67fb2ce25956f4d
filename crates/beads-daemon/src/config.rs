// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: the persisted layout under one workspace's
//! `<beads>` directory (spec.md §6.1).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Paths and tunables for one workspace daemon. Every path is derived
/// from `beads_dir`, mirroring the teacher's `Config::load` pattern of
/// computing one state root and joining fixed filenames onto it.
#[derive(Debug, Clone)]
pub struct Config {
    pub beads_dir: PathBuf,
    pub db_path: PathBuf,
    pub issues_jsonl_path: PathBuf,
    pub sync_base_path: PathBuf,
    pub sync_state_path: PathBuf,
    pub sync_conflicts_path: PathBuf,
    pub sync_lock_path: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub redirect_path: PathBuf,
    pub config_yaml_path: PathBuf,
    pub issue_prefix: String,
    pub debounce_quiet_period: Duration,
}

impl Config {
    pub fn for_workspace(beads_dir: impl AsRef<Path>, issue_prefix: impl Into<String>) -> Self {
        let beads_dir = beads_dir.as_ref().to_path_buf();
        Self {
            db_path: beads_dir.join("beads.db"),
            issues_jsonl_path: beads_dir.join("issues.jsonl"),
            sync_base_path: beads_dir.join("sync_base.jsonl"),
            sync_state_path: beads_dir.join("sync-state.json"),
            sync_conflicts_path: beads_dir.join("sync_conflicts.json"),
            sync_lock_path: beads_dir.join(".sync.lock"),
            socket_path: beads_dir.join("bd.sock"),
            lock_path: beads_dir.join("bd.lock"),
            log_path: beads_dir.join("daemon.log"),
            redirect_path: beads_dir.join("redirect"),
            config_yaml_path: beads_dir.join("config.yaml"),
            issue_prefix: issue_prefix.into(),
            debounce_quiet_period: Duration::from_millis(500),
            beads_dir,
        }
    }

    /// Loads `config.yaml` (spec.md §6.1: "Startup-time config (yaml-only
    /// keys)"), overlaying `BEADS_`-prefixed environment variables, and
    /// folding the result's overrides onto this config. A missing file is
    /// not an error -- every field has a default.
    pub fn load_startup_overrides(&mut self) -> Result<(), figment::Error> {
        let settings: WorkspaceSettings = Figment::new()
            .merge(Yaml::file(&self.config_yaml_path))
            .merge(Env::prefixed("BEADS_"))
            .extract()?;

        if let Some(prefix) = settings.issue_prefix {
            self.issue_prefix = prefix;
        }
        if let Some(ms) = settings.debounce_quiet_period_ms {
            self.debounce_quiet_period = Duration::from_millis(ms);
        }
        Ok(())
    }
}

/// Schema of `config.yaml` (spec.md §6.1). Every field is optional so a
/// partial or absent file still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub issue_prefix: Option<String>,
    #[serde(default)]
    pub debounce_quiet_period_ms: Option<u64>,
    #[serde(default)]
    pub sync_branch: Option<String>,
    #[serde(default)]
    pub custom_statuses: Vec<String>,
    #[serde(default)]
    pub custom_labels_allowlist: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_fixed_filenames_from_beads_dir() {
        let cfg = Config::for_workspace("/tmp/proj/.beads", "bd");
        assert_eq!(cfg.socket_path, Path::new("/tmp/proj/.beads/bd.sock"));
        assert_eq!(cfg.db_path, Path::new("/tmp/proj/.beads/beads.db"));
        assert_eq!(cfg.sync_lock_path, Path::new("/tmp/proj/.beads/.sync.lock"));
    }
}
