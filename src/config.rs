//! Container options and their loading from the environment or JSON.

use std::env;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Default maximum resolution depth.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Default environment variable prefix used by [`ContainerOptions::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "FERROUS_WIRE";

/// Policy for a re-entrant request of a key that is still being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum CycleMode {
    /// Fail with [`DiError::CycleDetected`].
    #[default]
    Strict,
    /// Hand out the provisional, not yet wired instance.
    Lenient,
}

/// Policy for calling `teardown` more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum RepeatTeardown {
    /// Later calls only clean instances built since the previous call.
    #[default]
    Ignore,
    /// Later calls fail with [`DiError::AlreadyTornDown`].
    Reject,
}

impl FromStr for CycleMode {
    type Err = DiError;

    fn from_str(s: &str) -> DiResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(CycleMode::Strict),
            "lenient" => Ok(CycleMode::Lenient),
            other => Err(DiError::InvalidConfig(format!("unknown cycle mode '{}'", other))),
        }
    }
}

impl FromStr for RepeatTeardown {
    type Err = DiError;

    fn from_str(s: &str) -> DiResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(RepeatTeardown::Ignore),
            "reject" => Ok(RepeatTeardown::Reject),
            other => Err(DiError::InvalidConfig(format!("unknown teardown policy '{}'", other))),
        }
    }
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CycleMode::Strict => "strict",
            CycleMode::Lenient => "lenient",
        })
    }
}

/// Options governing a container's build and teardown behavior.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ContainerOptions, CycleMode, RepeatTeardown};
///
/// let options = ContainerOptions::lenient().with_max_depth(64);
/// assert_eq!(options.cycle_mode, CycleMode::Lenient);
/// assert_eq!(options.max_depth, 64);
/// assert_eq!(options.repeat_teardown, RepeatTeardown::Ignore);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// How re-entrant requests of in-progress keys are treated
    pub cycle_mode: CycleMode,
    /// Longest allowed chain of nested builds
    pub max_depth: usize,
    /// What a second `teardown` call does
    pub repeat_teardown: RepeatTeardown,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            cycle_mode: CycleMode::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
            repeat_teardown: RepeatTeardown::Ignore,
        }
    }
}

impl ContainerOptions {
    /// Default options: strict cycles, depth 1024, idempotent teardown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options with strict cycle handling.
    pub fn strict() -> Self {
        Self::default().with_cycle_mode(CycleMode::Strict)
    }

    /// Default options with lenient cycle handling.
    pub fn lenient() -> Self {
        Self::default().with_cycle_mode(CycleMode::Lenient)
    }

    pub fn with_cycle_mode(mut self, mode: CycleMode) -> Self {
        self.cycle_mode = mode;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_repeat_teardown(mut self, policy: RepeatTeardown) -> Self {
        self.repeat_teardown = policy;
        self
    }

    /// Loads options from `FERROUS_WIRE_*` environment variables.
    ///
    /// See [`from_env_with_prefix`](Self::from_env_with_prefix).
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Loads options from `<PREFIX>_CYCLE_MODE`, `<PREFIX>_MAX_DEPTH` and
    /// `<PREFIX>_REPEAT_TEARDOWN`. Unset variables keep their defaults; set
    /// but unparsable ones fail with [`DiError::InvalidConfig`].
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let mut options = Self::default();
        let var = |name: &str| env::var(format!("{}_{}", prefix.to_uppercase(), name)).ok();

        if let Some(mode) = var("CYCLE_MODE") {
            options.cycle_mode = mode.parse()?;
        }
        if let Some(depth) = var("MAX_DEPTH") {
            options.max_depth = depth
                .trim()
                .parse()
                .map_err(|_| DiError::InvalidConfig(format!("max depth '{}' is not a number", depth)))?;
        }
        if let Some(policy) = var("REPEAT_TEARDOWN") {
            options.repeat_teardown = policy.parse()?;
        }

        Ok(options)
    }

    /// Parses options from JSON; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::InvalidConfig(e.to_string()))
    }
}
