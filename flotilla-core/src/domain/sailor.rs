//! Sailor domain model
//!
//! Represents a worker host that executes chores and reports state via
//! heartbeat. The record holds what the captain persists; the current
//! status is always derived from heartbeat age and usage, never stored.

use serde::{Deserialize, Serialize};

use crate::domain::chore::ChoreRequest;

fn default_port() -> u16 {
    8001
}

/// A worker host in the crew, keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sailor {
    /// Unique identifier across the crew
    pub name: String,

    /// Network endpoint the captain reaches the sailor on
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Free-form capability tags (e.g. "GPU", "CPU")
    #[serde(default)]
    pub services: Vec<String>,

    /// Advertised capacity, refreshed from heartbeats; zero until the
    /// sailor first reports in
    #[serde(default)]
    pub cpus: u32,
    #[serde(default)]
    pub gpus: u32,
    #[serde(default)]
    pub ram: u64,

    /// Current allocation as last reported / booked
    #[serde(default)]
    pub used_cpus: u32,
    #[serde(default)]
    pub used_gpus: u32,

    /// Unix seconds of the last heartbeat; 0 means never seen
    #[serde(default)]
    pub last_seen: i64,

    /// Maximum wall-clock any one chore may run here (`DD-hh:mm:ss`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<String>,
}

/// Status of a sailor, derived from heartbeat age and usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SailorStatus {
    /// Alive with free capacity and nothing running
    Ready,

    /// Alive and running at least one chore
    Working,

    /// Alive but all advertised capacity is allocated
    Full,

    /// No heartbeat within the liveness deadline
    Down,
}

impl std::fmt::Display for SailorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SailorStatus::Ready => write!(f, "READY"),
            SailorStatus::Working => write!(f, "WORKING"),
            SailorStatus::Full => write!(f, "FULL"),
            SailorStatus::Down => write!(f, "DOWN"),
        }
    }
}

impl Sailor {
    /// Creates a preregistered sailor with static fields only; capacity
    /// stays zero until the sailor reports it over heartbeat.
    pub fn preregistered(
        name: String,
        ip: String,
        port: u16,
        services: Vec<String>,
        max_time: Option<String>,
    ) -> Self {
        Self {
            name,
            ip,
            port,
            services,
            cpus: 0,
            gpus: 0,
            ram: 0,
            used_cpus: 0,
            used_gpus: 0,
            last_seen: 0,
            max_time,
        }
    }

    /// Base URL of the sailor's HTTP endpoint.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }

    pub fn free_cpus(&self) -> u32 {
        self.cpus.saturating_sub(self.used_cpus)
    }

    pub fn free_gpus(&self) -> u32 {
        self.gpus.saturating_sub(self.used_gpus)
    }

    /// Derives the current status from heartbeat age and usage.
    ///
    /// `deadline_secs` is the liveness deadline: a sailor not heard from
    /// for longer than that is DOWN regardless of its recorded usage.
    pub fn status(&self, now: i64, deadline_secs: i64) -> SailorStatus {
        if now - self.last_seen > deadline_secs {
            return SailorStatus::Down;
        }
        if self.used_cpus >= self.cpus && self.used_gpus >= self.gpus {
            return SailorStatus::Full;
        }
        if self.used_cpus > 0 || self.used_gpus > 0 {
            return SailorStatus::Working;
        }
        SailorStatus::Ready
    }

    /// Returns true iff this sailor can take the given request right now:
    /// alive, providing the requested service tag, matching an explicit
    /// sailor name, and with enough free CPUs and GPUs.
    pub fn fits(&self, request: &ChoreRequest, now: i64, deadline_secs: i64) -> bool {
        if self.status(now, deadline_secs) == SailorStatus::Down {
            return false;
        }
        if let Some(service) = &request.service {
            if !self.services.iter().any(|s| s == service) {
                return false;
            }
        }
        if let Some(name) = &request.sailor {
            if *name != self.name {
                return false;
            }
        }
        self.free_cpus() >= request.cpus && self.free_gpus() >= request.gpus
    }
}
