// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `config.toml` in the state directory.
//!
//! Every key is optional; anything left out keeps the engine default.
//! Breaker thresholds only seed a fresh state.

use std::path::Path;
use std::time::Duration;

use dg_adapters::{CommandDeployer, DockerResolver, LocalResolver, ResolverRouter};
use dg_engine::GuardConfig;
use serde::Deserialize;
use tracing::info;

use crate::lifecycle::LifecycleError;

const DEFAULT_DEPLOY_TIMEOUT_SECS: u64 = 15 * 60;
const DEFAULT_RESOLVE_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub recovery_trigger_threshold: Option<u32>,
    pub health_history_limit: Option<usize>,
    pub stale_lock_secs: Option<u64>,
    pub snapshot_every: Option<u64>,
    pub breaker: BreakerSettings,
    pub registry: RegistrySettings,
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerSettings {
    pub recovery_threshold: Option<u32>,
    pub deployment_threshold: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Docker,
    #[default]
    Local,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
    pub kind: RegistryKind,
    /// Default `registry/repository` for digest validation
    pub location: Option<String>,
    pub attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploySettings {
    /// Shell command run for every redeploy and rollback
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Read `path`, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(LifecycleError::Io(e)),
        };
        let settings = Self::parse(&text)
            .map_err(|e| LifecycleError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let settings: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        let positive = [
            ("recovery_trigger_threshold", self.recovery_trigger_threshold.map(u64::from)),
            ("health_history_limit", self.health_history_limit.map(|n| n as u64)),
            ("snapshot_every", self.snapshot_every),
            ("breaker.recovery_threshold", self.breaker.recovery_threshold.map(u64::from)),
            ("breaker.deployment_threshold", self.breaker.deployment_threshold.map(u64::from)),
            ("registry.attempts", self.registry.attempts.map(u64::from)),
            ("deploy.timeout_secs", self.deploy.timeout_secs),
        ];
        match positive.iter().find(|(_, value)| *value == Some(0)) {
            Some((key, _)) => Err(format!("{key} must be at least 1")),
            None => Ok(()),
        }
    }

    pub fn guard_config(&self) -> GuardConfig {
        let defaults = GuardConfig::default();
        GuardConfig {
            recovery_trigger_threshold: self
                .recovery_trigger_threshold
                .unwrap_or(defaults.recovery_trigger_threshold),
            health_history_limit: self.health_history_limit.unwrap_or(defaults.health_history_limit),
            stale_lock_secs: self.stale_lock_secs.unwrap_or(defaults.stale_lock_secs),
            snapshot_every: self.snapshot_every.unwrap_or(defaults.snapshot_every),
            recovery_threshold: self.breaker.recovery_threshold.unwrap_or(defaults.recovery_threshold),
            deployment_threshold: self
                .breaker
                .deployment_threshold
                .unwrap_or(defaults.deployment_threshold),
            default_location: self.registry.location.clone().filter(|l| !l.trim().is_empty()),
        }
    }

    pub fn resolver(&self) -> ResolverRouter {
        match self.registry.kind {
            RegistryKind::Local => ResolverRouter::Local(LocalResolver),
            RegistryKind::Docker => {
                let attempts = self.registry.attempts.unwrap_or(DEFAULT_RESOLVE_ATTEMPTS);
                let delay = self.registry.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS);
                ResolverRouter::Docker(DockerResolver::new(attempts, Duration::from_millis(delay)))
            }
        }
    }

    pub fn deployer(&self) -> CommandDeployer {
        let timeout = self.deploy.timeout_secs.unwrap_or(DEFAULT_DEPLOY_TIMEOUT_SECS);
        CommandDeployer::new(
            self.deploy.command.clone().filter(|c| !c.trim().is_empty()),
            Duration::from_secs(timeout),
        )
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
