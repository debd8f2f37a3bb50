//! Crew Service
//!
//! Preregistration, removal, and heartbeat processing. The heartbeat is
//! the canonical channel: its body refreshes capacity and reports
//! running chores, and its reply carries the work queued for the
//! reporting sailor (start requests it missed, cancels it has not yet
//! honored).

use flotilla_core::domain::chore::{Chore, ChoreStatus, REASON_SAILOR_LOST};
use flotilla_core::domain::sailor::Sailor;
use flotilla_core::dto::crew::{Heartbeat, HeartbeatReply, PreregisterSailor, RunningChore, SailorView};
use flotilla_core::{duration, now_ts};

use crate::repository::crew as crew_repository;
use crate::store::{Store, StoreError};

/// Service error type
#[derive(Debug)]
pub enum CrewError {
    NotFound(String),
    ValidationError(String),
    StoreError(StoreError),
}

impl From<StoreError> for CrewError {
    fn from(err: StoreError) -> Self {
        CrewError::StoreError(err)
    }
}

/// Preregister a sailor (admin action).
///
/// Creates or replaces the static fields; capacity and usage reported by
/// the sailor itself survive a re-preregistration.
pub async fn preregister(store: &Store, req: PreregisterSailor) -> Result<(), CrewError> {
    if req.name.trim().is_empty() || req.ip.trim().is_empty() {
        return Err(CrewError::ValidationError(
            "name and ip are required".to_string(),
        ));
    }

    if let Some(max_time) = &req.max_time {
        duration::parse(max_time)
            .map_err(|err| CrewError::ValidationError(err.to_string()))?;
    }

    let name = req.name.clone();
    store
        .crew
        .with_lock(|doc| {
            let mut sailor = Sailor::preregistered(
                req.name.clone(),
                req.ip.clone(),
                req.port.unwrap_or(8001),
                req.services.clone().into_vec(),
                req.max_time.clone(),
            );
            if let Some(existing) = doc.get(&req.name) {
                sailor.cpus = existing.cpus;
                sailor.gpus = existing.gpus;
                sailor.ram = existing.ram;
                sailor.used_cpus = existing.used_cpus;
                sailor.used_gpus = existing.used_gpus;
                sailor.last_seen = existing.last_seen;
            }
            doc.insert(req.name.clone(), sailor);
        })
        .await?;

    tracing::info!("Sailor {} preregistered", name);

    Ok(())
}

/// Remove a sailor from the crew (admin action).
///
/// Its active chores fail immediately with the same reason a lost
/// heartbeat would produce.
pub async fn remove(store: &Store, name: &str) -> Result<(), CrewError> {
    let removed = store
        .crew
        .with_lock(|doc| doc.remove(name).is_some())
        .await?;

    if !removed {
        return Err(CrewError::NotFound(name.to_string()));
    }

    let now = now_ts();
    let failed = store
        .chores
        .with_lock(|doc| {
            let mut failed = 0;
            for chore in doc.values_mut() {
                if chore.status.is_active() && chore.sailor.as_deref() == Some(name) {
                    chore.status = ChoreStatus::Failed;
                    chore.reason = Some(REASON_SAILOR_LOST.to_string());
                    chore.end_time = Some(now);
                    failed += 1;
                }
            }
            failed
        })
        .await?;

    tracing::info!("Sailor {} removed, {} chore(s) failed", name, failed);

    Ok(())
}

/// List the crew with derived statuses, in ascending name order.
pub async fn list(store: &Store, deadline_secs: i64) -> Vec<SailorView> {
    let now = now_ts();
    crew_repository::list(store)
        .await
        .into_iter()
        .map(|sailor| SailorView::derive(sailor, now, deadline_secs))
        .collect()
}

/// Process a sailor heartbeat and build its reply.
///
/// Refreshes liveness and capacity, folds the running-chore report into
/// the chore table, and returns the work still queued for this sailor.
pub async fn heartbeat(store: &Store, hb: Heartbeat) -> Result<HeartbeatReply, CrewError> {
    let now = now_ts();

    let known = store
        .crew
        .with_lock(|doc| match doc.get_mut(&hb.name) {
            Some(sailor) => {
                sailor.last_seen = now;
                if let Some(port) = hb.port {
                    sailor.port = port;
                }
                if let Some(cpus) = hb.cpus {
                    sailor.cpus = cpus;
                }
                if let Some(gpus) = &hb.gpus {
                    sailor.gpus = gpus.count();
                }
                if let Some(ram) = hb.ram {
                    sailor.ram = ram;
                }
                sailor.used_cpus = hb.used_cpus;
                sailor.used_gpus = hb.used_gpus;
                true
            }
            None => false,
        })
        .await?;

    if !known {
        return Err(CrewError::NotFound(hb.name.clone()));
    }

    let (reply, released) = store
        .chores
        .with_lock(|doc| {
            let mut reply = HeartbeatReply::default();
            let mut released: Vec<(u32, u32)> = Vec::new();

            for report in &hb.running {
                let Some(chore) = doc.get_mut(&report.chore_id.to_string()) else {
                    // Reported id we no longer know about (reaped long
                    // ago); tell the sailor to stop it.
                    reply.cancel.push(report.chore_id);
                    continue;
                };

                if chore.status.is_terminal() {
                    // Still running on the sailor after we finished it
                    // locally: redeliver the cancel.
                    reply.cancel.push(report.chore_id);
                    continue;
                }

                if let Some(freed) = fold_report(chore, report, now) {
                    released.push(freed);
                }
            }

            let reported: Vec<u64> = hb.running.iter().map(|r| r.chore_id).collect();
            reply.assign = doc
                .values()
                .filter(|chore| {
                    chore.status == ChoreStatus::Assigned
                        && chore.sailor.as_deref() == Some(hb.name.as_str())
                        && !reported.contains(&chore.chore_id)
                })
                .cloned()
                .collect();

            (reply, released)
        })
        .await?;

    if !released.is_empty() {
        store
            .crew
            .with_lock(|doc| {
                for (cpus, gpus) in &released {
                    crew_repository::release_usage(doc, &hb.name, *cpus, *gpus);
                }
            })
            .await?;
    }

    Ok(reply)
}

/// Applies one running-chore report to its chore. Returns the resources
/// to release when the report is terminal.
fn fold_report(chore: &mut Chore, report: &RunningChore, now: i64) -> Option<(u32, u32)> {
    let freed = (chore.configuration.cpus, chore.configuration.gpus);

    if let Some(infos) = &report.infos {
        chore.infos = Some(infos.clone());
    }

    match report.exit {
        Some(0) => {
            chore.status = ChoreStatus::Completed;
            chore.end_time = Some(now);
            tracing::info!("Chore {} completed", chore.chore_id);
            Some(freed)
        }
        Some(code) => {
            chore.status = ChoreStatus::Failed;
            chore.reason = Some(
                report
                    .infos
                    .clone()
                    .unwrap_or_else(|| format!("exit status {}", code)),
            );
            chore.end_time = Some(now);
            tracing::info!("Chore {} failed with exit {}", chore.chore_id, code);
            Some(freed)
        }
        None if report.status == Some(ChoreStatus::Canceled) => {
            chore.status = ChoreStatus::Canceled;
            if chore.reason.is_none() {
                chore.reason = Some("canceled".to_string());
            }
            chore.end_time = Some(now);
            Some(freed)
        }
        None if report.status == Some(ChoreStatus::Failed) => {
            chore.status = ChoreStatus::Failed;
            chore.reason = report.infos.clone().or(chore.reason.take());
            chore.end_time = Some(now);
            Some(freed)
        }
        None => {
            // The chore is (still) running over there.
            if let Some(pid) = report.pid {
                chore.pid = Some(pid);
            }
            if chore.status == ChoreStatus::Assigned {
                chore.status = ChoreStatus::Running;
                chore.start_time = Some(now);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::domain::chore::ChoreRequest;
    use flotilla_core::dto::crew::ServiceList;

    async fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    fn prereg(name: &str) -> PreregisterSailor {
        PreregisterSailor {
            name: name.to_string(),
            ip: "10.0.0.2".to_string(),
            port: None,
            services: ServiceList::List(vec!["GPU".to_string()]),
            max_time: None,
        }
    }

    fn assigned_chore(id: u64, sailor: &str, now: i64) -> Chore {
        let mut chore = Chore::new(
            id,
            "1000".to_string(),
            "/x.sh".to_string(),
            ChoreRequest {
                cpus: 2,
                gpus: 1,
                ..ChoreRequest::default()
            },
            now,
        );
        chore.status = ChoreStatus::Assigned;
        chore.sailor = Some(sailor.to_string());
        chore.assign_time = Some(now);
        chore.reason = None;
        chore
    }

    fn heartbeat_body(name: &str, running: Vec<RunningChore>) -> Heartbeat {
        Heartbeat {
            name: name.to_string(),
            port: None,
            cpus: Some(8),
            gpus: Some(flotilla_core::dto::crew::GpuSpec::Count(2)),
            ram: Some(16 << 30),
            used_cpus: 2,
            used_gpus: 1,
            running,
        }
    }

    #[tokio::test]
    async fn preregister_then_heartbeat_fills_capacity() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();

        let before = crew_repository::find(&store, "bob").await.unwrap();
        assert_eq!(before.cpus, 0);
        assert_eq!(before.last_seen, 0);

        heartbeat(&store, heartbeat_body("bob", vec![])).await.unwrap();

        let after = crew_repository::find(&store, "bob").await.unwrap();
        assert_eq!(after.cpus, 8);
        assert_eq!(after.gpus, 2);
        assert!(after.last_seen > 0);
    }

    #[tokio::test]
    async fn preregister_rejects_bad_max_time() {
        let (_dir, store) = store().await;
        let mut req = prereg("bob");
        req.max_time = Some("30s".to_string());

        let out = preregister(&store, req).await;
        assert!(matches!(out, Err(CrewError::ValidationError(_))));
    }

    #[tokio::test]
    async fn heartbeat_from_unknown_sailor_is_rejected() {
        let (_dir, store) = store().await;
        let out = heartbeat(&store, heartbeat_body("ghost", vec![])).await;
        assert!(matches!(out, Err(CrewError::NotFound(_))));
    }

    #[tokio::test]
    async fn running_report_sets_pid_and_start_time() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                doc.insert("100000000".to_string(), assigned_chore(100_000_000, "bob", now));
            })
            .await
            .unwrap();

        let report = RunningChore {
            chore_id: 100_000_000,
            pid: Some(4242),
            status: Some(ChoreStatus::Running),
            infos: None,
            exit: None,
        };
        heartbeat(&store, heartbeat_body("bob", vec![report])).await.unwrap();

        let chore = store.chores.snapshot().await["100000000"].clone();
        assert_eq!(chore.status, ChoreStatus::Running);
        assert_eq!(chore.pid, Some(4242));
        assert!(chore.start_time.is_some());
    }

    #[tokio::test]
    async fn exit_zero_completes_and_releases_usage() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                doc.insert("100000000".to_string(), assigned_chore(100_000_000, "bob", now));
            })
            .await
            .unwrap();

        let report = RunningChore {
            chore_id: 100_000_000,
            pid: Some(4242),
            status: None,
            infos: Some("done".to_string()),
            exit: Some(0),
        };
        heartbeat(&store, heartbeat_body("bob", vec![report])).await.unwrap();

        let chore = store.chores.snapshot().await["100000000"].clone();
        assert_eq!(chore.status, ChoreStatus::Completed);
        assert!(chore.end_time.is_some());
        assert_eq!(chore.infos.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_reported_reason() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                doc.insert("100000000".to_string(), assigned_chore(100_000_000, "bob", now));
            })
            .await
            .unwrap();

        let report = RunningChore {
            chore_id: 100_000_000,
            pid: Some(4242),
            status: None,
            infos: None,
            exit: Some(137),
        };
        heartbeat(&store, heartbeat_body("bob", vec![report])).await.unwrap();

        let chore = store.chores.snapshot().await["100000000"].clone();
        assert_eq!(chore.status, ChoreStatus::Failed);
        assert_eq!(chore.reason.as_deref(), Some("exit status 137"));
    }

    #[tokio::test]
    async fn reply_redelivers_assigned_and_cancels_stale() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                // Assigned but never picked up: should come back in `assign`.
                doc.insert("100000000".to_string(), assigned_chore(100_000_000, "bob", now));
                // Canceled locally but still reported running: `cancel`.
                let mut stale = assigned_chore(100_000_001, "bob", now);
                stale.status = ChoreStatus::Canceled;
                stale.end_time = Some(now);
                doc.insert("100000001".to_string(), stale);
            })
            .await
            .unwrap();

        let report = RunningChore {
            chore_id: 100_000_001,
            pid: Some(4243),
            status: Some(ChoreStatus::Running),
            infos: None,
            exit: None,
        };
        let reply = heartbeat(&store, heartbeat_body("bob", vec![report])).await.unwrap();

        assert_eq!(reply.assign.len(), 1);
        assert_eq!(reply.assign[0].chore_id, 100_000_000);
        assert_eq!(reply.cancel, vec![100_000_001]);
    }

    #[tokio::test]
    async fn remove_fails_active_chores() {
        let (_dir, store) = store().await;
        preregister(&store, prereg("bob")).await.unwrap();
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                doc.insert("100000000".to_string(), assigned_chore(100_000_000, "bob", now));
            })
            .await
            .unwrap();

        remove(&store, "bob").await.unwrap();

        assert!(crew_repository::find(&store, "bob").await.is_none());
        let chore = store.chores.snapshot().await["100000000"].clone();
        assert_eq!(chore.status, ChoreStatus::Failed);
        assert_eq!(chore.reason.as_deref(), Some(REASON_SAILOR_LOST));

        assert!(matches!(
            remove(&store, "bob").await,
            Err(CrewError::NotFound(_))
        ));
    }
}
