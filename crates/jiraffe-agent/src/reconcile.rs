// SPDX-FileCopyrightText: 2026 Jiraffe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reconciliation loop.
//!
//! Each pass polls the tracker once per campus, inserts every candidate that
//! has no record yet and posts it into the campus topic. The insert precedes
//! the post, so a key is announced at most once even if two passes overlap:
//! only the pass whose insert wins gets [`InsertOutcome::Inserted`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use jiraffe_config::model::SyncConfig;
use jiraffe_core::types::{Campus, InsertOutcome, Issue};
use jiraffe_core::{JiraffeError, StorageAdapter, TrackerAdapter};
use rand::Rng;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::notifier::Notifier;
use crate::recording;

/// Exponent cap for the failure backoff.
const MAX_BACKOFF_SHIFT: u32 = 10;

/// The campuses a pass iterates over, in creation order.
#[derive(Debug, Clone)]
pub struct CampusSnapshot {
    pub campuses: Vec<Campus>,
    loaded_at: Instant,
}

impl CampusSnapshot {
    pub fn new(campuses: Vec<Campus>) -> Self {
        Self {
            campuses,
            loaded_at: Instant::now(),
        }
    }

    /// Reads the current campus list from the store.
    pub async fn load(storage: &dyn StorageAdapter) -> Result<Self, JiraffeError> {
        Ok(Self::new(storage.list_campuses().await?))
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub campuses_polled: usize,
    pub campuses_failed: usize,
    pub candidates: usize,
    pub notified: usize,
    pub already_known: usize,
    pub failed: usize,
}

impl PassReport {
    /// True when there were campuses to poll and every one of them failed.
    pub fn all_campuses_failed(&self) -> bool {
        self.campuses_polled > 0 && self.campuses_failed == self.campuses_polled
    }

    /// True when the pass neither posted nor failed anything.
    pub fn is_quiet(&self) -> bool {
        self.notified == 0 && self.failed == 0 && self.campuses_failed == 0
    }
}

enum CandidateOutcome {
    Notified,
    AlreadyKnown,
}

/// Keeps chat notifications in line with the tracker's open issues.
pub struct Reconciler {
    tracker: Arc<dyn TrackerAdapter + Send + Sync>,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    notifier: Notifier,
    config: SyncConfig,
    refresh: Arc<Notify>,
}

impl Reconciler {
    pub fn new(
        tracker: Arc<dyn TrackerAdapter + Send + Sync>,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        notifier: Notifier,
        config: SyncConfig,
        refresh: Arc<Notify>,
    ) -> Self {
        Self {
            tracker,
            storage,
            notifier,
            config,
            refresh,
        }
    }

    /// Runs one pass over `snapshot`. Never fails; problems are counted in the report.
    pub async fn run_pass(&self, snapshot: &CampusSnapshot) -> PassReport {
        let mut report = PassReport::default();
        let mut candidates: Vec<Issue> = Vec::new();

        for campus in &snapshot.campuses {
            report.campuses_polled += 1;
            match self.tracker.search_open_issues(&campus.name).await {
                Ok(issues) => {
                    debug!(campus = %campus.name, count = issues.len(), "tracker search finished");
                    candidates.extend(issues);
                }
                Err(e) => {
                    report.campuses_failed += 1;
                    recording::record_tracker_failure(&campus.name);
                    warn!(campus = %campus.name, error = %e, "tracker search failed, skipping campus");
                }
            }
        }

        report.candidates = candidates.len();
        for issue in &candidates {
            match self.process_candidate(issue).await {
                Ok(CandidateOutcome::Notified) => report.notified += 1,
                Ok(CandidateOutcome::AlreadyKnown) => report.already_known += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(key = %issue.key, campus = %issue.campus, error = %e, "failed to relay issue");
                }
            }
        }

        report
    }

    async fn process_candidate(&self, issue: &Issue) -> Result<CandidateOutcome, JiraffeError> {
        if self.storage.insert_issue_if_absent(issue).await? == InsertOutcome::AlreadyExisted {
            return Ok(CandidateOutcome::AlreadyKnown);
        }

        let topic = self.storage.campus_topic_id(&issue.campus).await?;
        let posted = self.notifier.notify(issue, topic).await?;
        recording::record_notified(&issue.campus);
        info!(key = %issue.key, campus = %issue.campus, %topic, "new issue relayed");

        if let Err(e) = self
            .storage
            .set_issue_message_id(&issue.key, posted.message_id)
            .await
        {
            warn!(key = %issue.key, error = %e, "issue posted but message id not recorded");
        }
        Ok(CandidateOutcome::Notified)
    }

    /// Runs passes until `cancel` fires.
    ///
    /// The pass in flight when cancellation arrives is allowed to finish.
    pub async fn run(self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let max_backoff = Duration::from_secs(self.config.max_backoff_secs);
        let refresh_after = Duration::from_secs(self.config.campus_refresh_secs);

        let mut snapshot: Option<CampusSnapshot> = None;
        let mut force_reload = false;
        let mut failures: u32 = 0;

        info!(
            interval_secs = self.config.poll_interval_secs,
            "reconciliation loop running"
        );

        loop {
            let stale = force_reload || snapshot.as_ref().is_none_or(|s| s.age() >= refresh_after);
            let mut healthy = true;
            if stale {
                match CampusSnapshot::load(self.storage.as_ref()).await {
                    Ok(fresh) => {
                        debug!(campuses = fresh.campuses.len(), "campus snapshot loaded");
                        snapshot = Some(fresh);
                        force_reload = false;
                    }
                    Err(e) => {
                        healthy = false;
                        warn!(error = %e, "failed to load campuses, keeping previous snapshot");
                    }
                }
            }

            if let Some(current) = &snapshot {
                let report = self.run_pass(current).await;
                if report.is_quiet() {
                    debug!(?report, "reconciliation pass finished");
                } else {
                    info!(?report, "reconciliation pass finished");
                }
                healthy &= !report.all_campuses_failed();
            }

            failures = if healthy { 0 } else { failures.saturating_add(1) };
            let delay = backoff_delay(interval, failures, max_backoff) + jitter(self.config.jitter_ms);
            if failures > 0 {
                warn!(failures, delay_ms = delay.as_millis() as u64, "backing off after failed pass");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.refresh.notified() => {
                    debug!("campus list changed, polling now");
                    force_reload = true;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("reconciliation loop stopped");
    }
}

/// Delay before the next pass after `failures` consecutive failed passes.
///
/// Doubles per failure and never exceeds `max`, unless `interval` itself does.
pub fn backoff_delay(interval: Duration, failures: u32, max: Duration) -> Duration {
    if failures == 0 {
        return interval;
    }
    let factor = 1_u32 << failures.min(MAX_BACKOFF_SHIFT);
    interval.saturating_mul(factor).min(max.max(interval))
}

fn jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
