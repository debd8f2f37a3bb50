//! Control loop
//!
//! The scheduling heart of the captain. Every tick: sweep liveness,
//! enforce sailor and user time limits, match pending chores onto the
//! crew, and reap long-terminal chores. Each phase commits through the
//! store on its own, and a failure in any phase never escapes the tick.
//!
//! Sailor RPCs are issued with no document lock held: every phase
//! computes its intents from a snapshot, performs the RPCs, then
//! reacquires the lock to commit what actually happened.

pub mod matcher;

pub use matcher::{FirstFit, MatchStrategy};

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, info, warn};

use flotilla_client::SailorApi;
use flotilla_core::domain::chore::{
    Chore, ChoreStatus, REASON_SAILOR_LOST, REASON_TIME_LIMIT, REASON_USER_TIME_LIMIT,
};
use flotilla_core::domain::sailor::{Sailor, SailorStatus};
use flotilla_core::{duration, now_ts};

use crate::config::Config;
use crate::repository::{chores as chore_repository, crew as crew_repository};
use crate::service::chore::{self as chore_service, ChoreError};
use crate::service::user as user_service;
use crate::store::{Store, StoreError};

/// What one assign RPC did to its chore.
enum AssignOutcome {
    /// Sailor accepted; the chore becomes ASSIGNED
    Accepted,
    /// Sailor answered with an error status; the chore fails with the
    /// body as its reason
    Rejected(String),
    /// No HTTP answer; the chore stays PENDING for the next tick
    Unreachable(String),
}

/// Periodic driver that owns scheduling.
pub struct ControlLoop {
    config: Config,
    store: Arc<Store>,
    client: Arc<dyn SailorApi>,
    strategy: Arc<dyn MatchStrategy>,
}

impl ControlLoop {
    /// Creates a control loop with the default first-fit matcher.
    pub fn new(config: Config, store: Arc<Store>, client: Arc<dyn SailorApi>) -> Self {
        Self {
            config,
            store,
            client,
            strategy: Arc::new(FirstFit),
        }
    }

    /// Runs scheduling ticks forever.
    pub async fn run(&self) {
        info!(
            "Starting control loop (tick interval: {:?})",
            self.config.tick_interval
        );

        let mut interval = time::interval(self.config.tick_interval);

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One scheduling tick. Phases are isolated: a store failure in one
    /// is logged and the rest still run.
    pub async fn tick(&self) {
        if let Err(err) = self.sweep_liveness().await {
            error!("Liveness sweep failed: {}", err);
        }
        if let Err(err) = self.sweep_sailor_limits().await {
            error!("Sailor time-limit sweep failed: {}", err);
        }
        if let Err(err) = self.sweep_user_limits().await {
            error!("User time-limit sweep failed: {}", err);
        }
        if let Err(err) = self.match_pass().await {
            error!("Match pass failed: {}", err);
        }
        if let Err(err) = self.reap().await {
            error!("Reap failed: {}", err);
        }
    }

    /// Fails every active chore held by a sailor that stopped
    /// heartbeating.
    async fn sweep_liveness(&self) -> Result<(), StoreError> {
        let now = now_ts();
        let deadline = self.config.heartbeat_deadline_secs();

        let crew = self.store.crew.snapshot().await;
        let down: Vec<&str> = crew
            .values()
            .filter(|sailor| sailor.status(now, deadline) == SailorStatus::Down)
            .map(|sailor| sailor.name.as_str())
            .collect();
        if down.is_empty() {
            return Ok(());
        }

        let affected = self
            .store
            .chores
            .with_read(|doc| {
                doc.values().any(|chore| {
                    chore.status.is_active()
                        && chore
                            .sailor
                            .as_deref()
                            .is_some_and(|s| down.contains(&s))
                })
            })
            .await;
        if !affected {
            return Ok(());
        }

        let released = self
            .store
            .chores
            .with_lock(|doc| {
                let mut released: Vec<(String, u32, u32)> = Vec::new();
                for chore in doc.values_mut() {
                    let lost = chore.status.is_active()
                        && chore
                            .sailor
                            .as_deref()
                            .is_some_and(|s| down.contains(&s));
                    if lost {
                        warn!(
                            "Chore {} failed: sailor {} lost",
                            chore.chore_id,
                            chore.sailor.as_deref().unwrap_or("?")
                        );
                        chore.status = ChoreStatus::Failed;
                        chore.reason = Some(REASON_SAILOR_LOST.to_string());
                        chore.end_time = Some(now);
                        released.push((
                            chore.sailor.clone().unwrap_or_default(),
                            chore.configuration.cpus,
                            chore.configuration.gpus,
                        ));
                    }
                }
                released
            })
            .await?;

        self.store
            .crew
            .with_lock(|doc| {
                for (name, cpus, gpus) in &released {
                    crew_repository::release_usage(doc, name, *cpus, *gpus);
                }
            })
            .await?;

        Ok(())
    }

    /// Cancels chores that outlived their sailor's per-chore `max_time`.
    async fn sweep_sailor_limits(&self) -> Result<(), StoreError> {
        let now = now_ts();
        let crew = self.store.crew.snapshot().await;
        let chores = self.store.chores.snapshot().await;

        let mut expired = Vec::new();
        for chore in chores.values() {
            if !chore.status.is_active() {
                continue;
            }
            let Some(name) = chore.sailor.as_deref() else {
                continue;
            };
            let Some(sailor) = crew.get(name) else {
                continue;
            };
            let Some(max_time) = sailor.max_time.as_deref() else {
                continue;
            };
            let Ok(limit) = duration::parse(max_time) else {
                continue;
            };
            if limit == duration::UNLIMITED {
                continue;
            }
            let ran = (now - chore.active_since()).max(0) as u64;
            if ran > limit {
                expired.push(chore.chore_id);
            }
        }

        self.cancel_all(expired, REASON_TIME_LIMIT).await;
        Ok(())
    }

    /// Cancels the newest chores of users whose cumulative active time
    /// exceeds their budget.
    async fn sweep_user_limits(&self) -> Result<(), StoreError> {
        let now = now_ts();
        let users = self.store.users.snapshot().await;
        let chores: Vec<Chore> = self
            .store
            .chores
            .with_read(|doc| doc.values().cloned().collect())
            .await;

        for user in users.values() {
            let limit = user.time_limit_secs();
            if limit == duration::UNLIMITED {
                continue;
            }
            let excess = user_service::excess_by_time(&chores, &user.uid, limit, now);
            if !excess.is_empty() {
                info!(
                    "User {} over time budget, canceling {} chore(s)",
                    user.uid,
                    excess.len()
                );
                self.cancel_all(excess, REASON_USER_TIME_LIMIT).await;
            }
        }

        Ok(())
    }

    /// Matches PENDING chores (FIFO) onto the crew and dispatches them.
    async fn match_pass(&self) -> Result<(), StoreError> {
        let now = now_ts();
        let deadline = self.config.heartbeat_deadline_secs();

        let crew_doc = self.store.crew.snapshot().await;
        let mut pending: Vec<Chore> = self
            .store
            .chores
            .with_read(|doc| {
                doc.values()
                    .filter(|chore| chore.status == ChoreStatus::Pending)
                    .cloned()
                    .collect()
            })
            .await;
        if pending.is_empty() {
            return Ok(());
        }
        pending.sort_by_key(|chore| chore.chore_id);

        // BTreeMap values come out in ascending name order already.
        let mut crew: Vec<Sailor> = crew_doc.values().cloned().collect();
        let plans =
            matcher::plan_assignments(&mut crew, &pending, self.strategy.as_ref(), now, deadline);
        if plans.is_empty() {
            return Ok(());
        }

        let mut by_sailor: BTreeMap<String, Vec<Chore>> = BTreeMap::new();
        for plan in &plans {
            let chore = pending
                .iter()
                .find(|c| c.chore_id == plan.chore_id)
                .cloned();
            if let Some(chore) = chore {
                by_sailor.entry(plan.sailor.clone()).or_default().push(chore);
            }
        }

        // One task per sailor: concurrent across the crew, sequential on
        // any one sailor.
        let mut tasks = JoinSet::new();
        for (name, chores) in by_sailor {
            let Some(sailor) = crew_doc.get(&name).cloned() else {
                continue;
            };
            let client = Arc::clone(&self.client);
            tasks.spawn(async move {
                let mut results = Vec::new();
                for chore in chores {
                    let outcome = match client.assign(&sailor, &chore).await {
                        Ok(()) => AssignOutcome::Accepted,
                        Err(err) => match err.status() {
                            Some(_) => AssignOutcome::Rejected(err.message()),
                            None => AssignOutcome::Unreachable(err.to_string()),
                        },
                    };
                    results.push((chore.chore_id, sailor.name.clone(), outcome));
                }
                results
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(batch) => outcomes.extend(batch),
                Err(err) => error!("Assign task panicked: {}", err),
            }
        }

        let booked = self
            .store
            .chores
            .with_lock(|doc| {
                let mut booked: Vec<(String, u32, u32)> = Vec::new();
                for (chore_id, sailor_name, outcome) in &outcomes {
                    let Some(chore) = doc.get_mut(&chore_repository::key(*chore_id)) else {
                        continue;
                    };
                    // Anything that left PENDING while the RPC was in
                    // flight (user cancel, mostly) wins.
                    if chore.status != ChoreStatus::Pending {
                        continue;
                    }
                    match outcome {
                        AssignOutcome::Accepted => {
                            info!("Chore {} assigned to {}", chore_id, sailor_name);
                            chore.status = ChoreStatus::Assigned;
                            chore.sailor = Some(sailor_name.clone());
                            chore.assign_time = Some(now);
                            chore.reason = None;
                            booked.push((
                                sailor_name.clone(),
                                chore.configuration.cpus,
                                chore.configuration.gpus,
                            ));
                        }
                        AssignOutcome::Rejected(message) => {
                            warn!(
                                "Sailor {} rejected chore {}: {}",
                                sailor_name, chore_id, message
                            );
                            chore.status = ChoreStatus::Failed;
                            chore.reason = Some(message.clone());
                            chore.end_time = Some(now);
                        }
                        AssignOutcome::Unreachable(message) => {
                            debug!(
                                "Sailor {} unreachable for chore {}: {}",
                                sailor_name, chore_id, message
                            );
                        }
                    }
                }
                booked
            })
            .await?;

        if !booked.is_empty() {
            self.store
                .crew
                .with_lock(|doc| {
                    for (name, cpus, gpus) in &booked {
                        crew_repository::book_usage(doc, name, *cpus, *gpus);
                    }
                })
                .await?;
        }

        Ok(())
    }

    /// Prunes terminal chores older than the retention window.
    async fn reap(&self) -> Result<(), StoreError> {
        let retention = self.config.chore_retention.as_secs();
        if retention == 0 {
            return Ok(());
        }
        let cutoff = now_ts() - retention as i64;

        let stale = |chore: &Chore| {
            chore.status.is_terminal() && chore.end_time.is_some_and(|end| end < cutoff)
        };

        let any_stale = self
            .store
            .chores
            .with_read(|doc| doc.values().any(stale))
            .await;
        if !any_stale {
            return Ok(());
        }

        let pruned = self
            .store
            .chores
            .with_lock(|doc| {
                let before = doc.len();
                doc.retain(|_, chore| !stale(chore));
                before - doc.len()
            })
            .await?;

        info!("Reaped {} terminal chore(s)", pruned);
        Ok(())
    }

    /// Cancels a batch of chores concurrently, best-effort.
    async fn cancel_all(&self, chore_ids: Vec<u64>, reason: &str) {
        let mut tasks = JoinSet::new();
        for chore_id in chore_ids {
            let store = Arc::clone(&self.store);
            let client = Arc::clone(&self.client);
            let reason = reason.to_string();
            tasks.spawn(async move {
                match chore_service::cancel(&store, client.as_ref(), chore_id, Some(reason)).await {
                    Ok(_) => {}
                    // Raced with a terminal report; nothing left to do.
                    Err(ChoreError::NotFound(_) | ChoreError::InvalidState(_)) => {}
                    Err(err) => error!("Failed canceling chore {}: {:?}", chore_id, err),
                }
            });
        }
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use flotilla_client::{ClientError, Result as ClientResult};
    use flotilla_core::domain::chore::{CHORE_ID_FLOOR, ChoreRequest, REASON_NO_SAILOR};
    use flotilla_core::dto::chore::SubmitChore;
    use flotilla_core::dto::crew::{GpuSpec, Heartbeat, PreregisterSailor, RunningChore, ServiceList};
    use flotilla_core::now_ts;

    use crate::service::crew as crew_service;

    /// Scripted sailor endpoint for driving ticks.
    #[derive(Default)]
    struct MockSailor {
        assigned: StdMutex<Vec<(String, u64)>>,
        canceled: StdMutex<Vec<(String, u64, String)>>,
        reject_with: Option<(u16, String)>,
        unreachable: bool,
    }

    #[async_trait]
    impl SailorApi for MockSailor {
        async fn assign(&self, sailor: &Sailor, chore: &Chore) -> ClientResult<()> {
            if self.unreachable {
                return Err(transport_error().await);
            }
            if let Some((status, message)) = &self.reject_with {
                return Err(ClientError::api_error(*status, message.clone()));
            }
            self.assigned
                .lock()
                .unwrap()
                .push((sailor.name.clone(), chore.chore_id));
            Ok(())
        }

        async fn cancel(&self, sailor: &Sailor, chore_id: u64, reason: &str) -> ClientResult<()> {
            self.canceled
                .lock()
                .unwrap()
                .push((sailor.name.clone(), chore_id, reason.to_string()));
            Ok(())
        }
    }

    /// A real transport-level reqwest error (invalid URL, no network).
    async fn transport_error() -> ClientError {
        reqwest::Client::new()
            .get("http:")
            .send()
            .await
            .unwrap_err()
            .into()
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.tick_interval = Duration::from_millis(10);
        config
    }

    async fn setup(mock: MockSailor) -> (tempfile::TempDir, Arc<Store>, Arc<MockSailor>, ControlLoop) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let mock = Arc::new(mock);
        let client: Arc<dyn SailorApi> = mock.clone();
        let control = ControlLoop::new(test_config(), store.clone(), client);
        (dir, store, mock, control)
    }

    async fn preregister_bob(store: &Store) {
        crew_service::preregister(
            store,
            PreregisterSailor {
                name: "bob".to_string(),
                ip: "10.0.0.2".to_string(),
                port: None,
                services: ServiceList::List(vec!["GPU".to_string()]),
                max_time: None,
            },
        )
        .await
        .unwrap();

        crew_service::heartbeat(
            store,
            Heartbeat {
                name: "bob".to_string(),
                port: None,
                cpus: Some(8),
                gpus: Some(GpuSpec::Count(2)),
                ram: Some(16 << 30),
                used_cpus: 0,
                used_gpus: 0,
                running: vec![],
            },
        )
        .await
        .unwrap();
    }

    fn gpu_submit() -> SubmitChore {
        SubmitChore {
            owner: "1000".to_string(),
            script: "/x.sh".to_string(),
            configuration: ChoreRequest {
                service: Some("GPU".to_string()),
                sailor: None,
                cpus: 2,
                gpus: 1,
                out: None,
                wd: None,
            },
        }
    }

    async fn get_chore(store: &Store, chore_id: u64) -> Chore {
        store
            .chores
            .with_read(|doc| doc.get(&chore_id.to_string()).cloned())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn happy_path_submit_assign_run_complete() {
        let (_dir, store, mock, control) = setup(MockSailor::default()).await;
        preregister_bob(&store).await;

        let chore = chore_service::submit(&store, gpu_submit()).await.unwrap();
        assert_eq!(chore.chore_id, CHORE_ID_FLOOR);
        assert_eq!(chore.status, ChoreStatus::Pending);
        assert_eq!(chore.reason.as_deref(), Some(REASON_NO_SAILOR));

        control.tick().await;

        let assigned = get_chore(&store, chore.chore_id).await;
        assert_eq!(assigned.status, ChoreStatus::Assigned);
        assert_eq!(assigned.sailor.as_deref(), Some("bob"));
        assert!(assigned.reason.is_none());
        assert_eq!(
            mock.assigned.lock().unwrap().as_slice(),
            &[("bob".to_string(), chore.chore_id)]
        );

        let bob = crew_repository::find(&store, "bob").await.unwrap();
        assert_eq!(bob.used_cpus, 2);
        assert_eq!(bob.used_gpus, 1);

        // Sailor reports a pid, then a clean exit.
        let report = |exit| Heartbeat {
            name: "bob".to_string(),
            port: None,
            cpus: Some(8),
            gpus: Some(GpuSpec::Count(2)),
            ram: None,
            used_cpus: if exit == Some(0) { 0 } else { 2 },
            used_gpus: if exit == Some(0) { 0 } else { 1 },
            running: vec![RunningChore {
                chore_id: chore.chore_id,
                pid: Some(4242),
                status: None,
                infos: None,
                exit,
            }],
        };

        crew_service::heartbeat(&store, report(None)).await.unwrap();
        let running = get_chore(&store, chore.chore_id).await;
        assert_eq!(running.status, ChoreStatus::Running);
        assert_eq!(running.pid, Some(4242));

        crew_service::heartbeat(&store, report(Some(0))).await.unwrap();
        let done = get_chore(&store, chore.chore_id).await;
        assert_eq!(done.status, ChoreStatus::Completed);
        assert!(done.end_time.is_some());
    }

    #[tokio::test]
    async fn unreachable_sailor_leaves_chore_pending() {
        let mock = MockSailor {
            unreachable: true,
            ..MockSailor::default()
        };
        let (_dir, store, _mock, control) = setup(mock).await;
        preregister_bob(&store).await;

        let chore = chore_service::submit(&store, gpu_submit()).await.unwrap();
        control.tick().await;

        let after = get_chore(&store, chore.chore_id).await;
        assert_eq!(after.status, ChoreStatus::Pending);
        assert_eq!(after.reason.as_deref(), Some(REASON_NO_SAILOR));

        let bob = crew_repository::find(&store, "bob").await.unwrap();
        assert_eq!(bob.used_cpus, 0);
    }

    #[tokio::test]
    async fn rejecting_sailor_fails_chore_with_body() {
        let mock = MockSailor {
            reject_with: Some((503, "no slots".to_string())),
            ..MockSailor::default()
        };
        let (_dir, store, _mock, control) = setup(mock).await;
        preregister_bob(&store).await;

        let chore = chore_service::submit(&store, gpu_submit()).await.unwrap();
        control.tick().await;

        let after = get_chore(&store, chore.chore_id).await;
        assert_eq!(after.status, ChoreStatus::Failed);
        assert_eq!(after.reason.as_deref(), Some("no slots"));
        assert!(after.end_time.is_some());
    }

    #[tokio::test]
    async fn lost_sailor_fails_its_active_chores() {
        let (_dir, store, _mock, control) = setup(MockSailor::default()).await;
        preregister_bob(&store).await;

        let chore = chore_service::submit(&store, gpu_submit()).await.unwrap();
        control.tick().await;
        assert_eq!(
            get_chore(&store, chore.chore_id).await.status,
            ChoreStatus::Assigned
        );

        // Heartbeats stop for longer than the deadline.
        store
            .crew
            .with_lock(|doc| doc.get_mut("bob").unwrap().last_seen = now_ts() - 120)
            .await
            .unwrap();

        control.tick().await;

        let after = get_chore(&store, chore.chore_id).await;
        assert_eq!(after.status, ChoreStatus::Failed);
        assert_eq!(after.reason.as_deref(), Some(REASON_SAILOR_LOST));
        assert!(after.end_time.is_some());

        let bob = crew_repository::find(&store, "bob").await.unwrap();
        assert_eq!(bob.used_cpus, 0);
        assert_eq!(bob.used_gpus, 0);
    }

    #[tokio::test]
    async fn sailor_time_limit_cancels_overdue_chore() {
        let (_dir, store, mock, control) = setup(MockSailor::default()).await;
        preregister_bob(&store).await;
        store
            .crew
            .with_lock(|doc| {
                doc.get_mut("bob").unwrap().max_time = Some("00-00:00:30".to_string())
            })
            .await
            .unwrap();

        let chore = chore_service::submit(&store, gpu_submit()).await.unwrap();
        control.tick().await;

        // Rewind the assignment 31 seconds into the past.
        store
            .chores
            .with_lock(|doc| {
                let chore = doc.get_mut(&chore.chore_id.to_string()).unwrap();
                chore.assign_time = Some(now_ts() - 31);
            })
            .await
            .unwrap();

        control.tick().await;

        let after = get_chore(&store, chore.chore_id).await;
        assert_eq!(after.status, ChoreStatus::Canceled);
        assert_eq!(after.reason.as_deref(), Some(REASON_TIME_LIMIT));
        assert!(
            mock.canceled
                .lock()
                .unwrap()
                .iter()
                .any(|(sailor, id, _)| sailor == "bob" && *id == chore.chore_id)
        );
    }

    #[tokio::test]
    async fn user_time_limit_cancels_newest_chore() {
        let (_dir, store, _mock, control) = setup(MockSailor::default()).await;
        preregister_bob(&store).await;

        user_service::upsert(
            &store,
            flotilla_core::dto::user::UpsertUser {
                uid: "1000".to_string(),
                name: None,
                chores_limit: None,
                time_limit: Some("00-00:10:00".to_string()),
                notes: None,
            },
        )
        .await
        .unwrap();

        // Two running chores of ~6 minutes each: 12 > 10, so exactly the
        // newer one must be canceled.
        let now = now_ts();
        store
            .chores
            .with_lock(|doc| {
                for (offset, id) in [(20i64, CHORE_ID_FLOOR), (10, CHORE_ID_FLOOR + 1)] {
                    let mut chore = Chore::new(
                        id,
                        "1000".to_string(),
                        "/x.sh".to_string(),
                        ChoreRequest {
                            cpus: 1,
                            ..ChoreRequest::default()
                        },
                        now - 360 - offset,
                    );
                    chore.status = ChoreStatus::Running;
                    chore.sailor = Some("bob".to_string());
                    chore.start_time = Some(now - 360);
                    chore.reason = None;
                    doc.insert(id.to_string(), chore);
                }
            })
            .await
            .unwrap();

        control.tick().await;

        let older = get_chore(&store, CHORE_ID_FLOOR).await;
        let newer = get_chore(&store, CHORE_ID_FLOOR + 1).await;
        assert_eq!(older.status, ChoreStatus::Running);
        assert_eq!(newer.status, ChoreStatus::Canceled);
        assert_eq!(newer.reason.as_deref(), Some(REASON_USER_TIME_LIMIT));
    }

    #[tokio::test]
    async fn fifo_across_two_sailors_is_deterministic() {
        let (_dir, store, mock, control) = setup(MockSailor::default()).await;
        preregister_bob(&store).await;
        crew_service::preregister(
            &store,
            PreregisterSailor {
                name: "alice".to_string(),
                ip: "10.0.0.3".to_string(),
                port: None,
                services: ServiceList::List(vec!["GPU".to_string()]),
                max_time: None,
            },
        )
        .await
        .unwrap();
        crew_service::heartbeat(
            &store,
            Heartbeat {
                name: "alice".to_string(),
                port: None,
                cpus: Some(2),
                gpus: Some(GpuSpec::Count(1)),
                ram: None,
                used_cpus: 0,
                used_gpus: 0,
                running: vec![],
            },
        )
        .await
        .unwrap();

        let first = chore_service::submit(&store, gpu_submit()).await.unwrap();
        let second = chore_service::submit(&store, gpu_submit()).await.unwrap();
        control.tick().await;

        // "alice" < "bob": the first chore exhausts alice, the second
        // lands on bob.
        assert_eq!(
            get_chore(&store, first.chore_id).await.sailor.as_deref(),
            Some("alice")
        );
        assert_eq!(
            get_chore(&store, second.chore_id).await.sailor.as_deref(),
            Some("bob")
        );
        assert_eq!(mock.assigned.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reap_prunes_only_old_terminal_chores() {
        let (_dir, store, _mock, control) = setup(MockSailor::default()).await;
        let now = now_ts();
        let retention = test_config().chore_retention.as_secs() as i64;

        store
            .chores
            .with_lock(|doc| {
                let mut old = Chore::new(
                    CHORE_ID_FLOOR,
                    "1000".to_string(),
                    "/x.sh".to_string(),
                    ChoreRequest::default(),
                    now - retention - 120,
                );
                old.status = ChoreStatus::Completed;
                old.end_time = Some(now - retention - 60);
                doc.insert(CHORE_ID_FLOOR.to_string(), old);

                let mut recent = Chore::new(
                    CHORE_ID_FLOOR + 1,
                    "1000".to_string(),
                    "/x.sh".to_string(),
                    ChoreRequest::default(),
                    now - 120,
                );
                recent.status = ChoreStatus::Failed;
                recent.end_time = Some(now - 60);
                doc.insert((CHORE_ID_FLOOR + 1).to_string(), recent);
            })
            .await
            .unwrap();

        control.tick().await;

        let doc = store.chores.snapshot().await;
        assert!(!doc.contains_key(&CHORE_ID_FLOOR.to_string()));
        assert!(doc.contains_key(&(CHORE_ID_FLOOR + 1).to_string()));
    }
}
