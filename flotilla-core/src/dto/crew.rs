//! Crew DTOs
//!
//! Bodies for sailor preregistration, removal, the inbound heartbeat and
//! its reply, and the enriched sailor view returned by crew listings.

use serde::{Deserialize, Serialize};

use crate::domain::chore::{Chore, ChoreStatus};
use crate::domain::sailor::{Sailor, SailorStatus};

/// Request to preregister a sailor (admin action).
///
/// Only static fields are taken here; capacity arrives later over
/// heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreregisterSailor {
    pub name: String,
    pub ip: String,

    /// Sailor HTTP port; defaults to 8001 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    pub services: ServiceList,

    /// Optional per-chore wall-clock limit (`DD-hh:mm:ss`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<String>,
}

/// Service tags, accepted either as a JSON array or as the legacy
/// comma-separated string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceList {
    List(Vec<String>),
    Csv(String),
}

impl Default for ServiceList {
    fn default() -> Self {
        ServiceList::List(Vec::new())
    }
}

impl ServiceList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ServiceList::List(tags) => tags,
            ServiceList::Csv(csv) => csv
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Request to remove a sailor from the crew (admin action).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveSailor {
    pub name: String,
}

/// GPU capacity as reported by a sailor: either a plain count or a list
/// of per-device descriptors (count = list length).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GpuSpec {
    Count(u32),
    List(Vec<serde_json::Value>),
}

impl GpuSpec {
    pub fn count(&self) -> u32 {
        match self {
            GpuSpec::Count(n) => *n,
            GpuSpec::List(devices) => devices.len() as u32,
        }
    }
}

/// One running-chore entry inside a heartbeat report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningChore {
    pub chore_id: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Sailor's view of the chore, in the shared status vocabulary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChoreStatus>,

    /// Free-form latest status line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infos: Option<String>,

    /// Exit code once the process finished; 0 is success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<i32>,
}

/// Sailor → captain liveness and state report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub name: String,

    /// Capacity refresh; fields left out keep their stored values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpus: Option<GpuSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,

    #[serde(default)]
    pub used_cpus: u32,
    #[serde(default)]
    pub used_gpus: u32,

    #[serde(default)]
    pub running: Vec<RunningChore>,
}

/// Heartbeat reply: the queued work for the reporting sailor.
///
/// `assign` carries every chore assigned to the sailor that it did not
/// report as running; `cancel` carries every reported chore the captain
/// already considers finished. Re-sending either is harmless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatReply {
    pub assign: Vec<Chore>,
    pub cancel: Vec<u64>,
}

/// Sailor record enriched with its derived status, as served by crew
/// listings. The derived fields are never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SailorView {
    #[serde(flatten)]
    pub sailor: Sailor,

    pub derived_status: SailorStatus,

    /// Seconds since the last heartbeat, when ever seen
    pub seen_ago: Option<i64>,
}

impl SailorView {
    pub fn derive(sailor: Sailor, now: i64, deadline_secs: i64) -> Self {
        let derived_status = sailor.status(now, deadline_secs);
        let seen_ago = (sailor.last_seen > 0).then(|| now - sailor.last_seen);
        Self {
            sailor,
            derived_status,
            seen_ago,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_list_accepts_both_shapes() {
        let list: ServiceList = serde_json::from_str(r#"["GPU", "CPU"]"#).unwrap();
        assert_eq!(list.into_vec(), vec!["GPU", "CPU"]);

        let csv: ServiceList = serde_json::from_str(r#""GPU, CPU,""#).unwrap();
        assert_eq!(csv.into_vec(), vec!["GPU", "CPU"]);
    }

    #[test]
    fn gpu_spec_counts_lists() {
        let count: GpuSpec = serde_json::from_str("2").unwrap();
        assert_eq!(count.count(), 2);

        let list: GpuSpec =
            serde_json::from_str(r#"[{"type": "a100", "vram": 40960}, {"type": "a100"}]"#).unwrap();
        assert_eq!(list.count(), 2);
    }

    #[test]
    fn sailor_view_derives_status() {
        let sailor = Sailor::preregistered(
            "bob".to_string(),
            "10.0.0.2".to_string(),
            8001,
            vec![],
            None,
        );
        let view = SailorView::derive(sailor, 100, 60);
        assert_eq!(view.derived_status, SailorStatus::Down);
        assert_eq!(view.seen_ago, None);
    }
}
