//! Timed whole-group mutes.
//!
//! The protocol only knows "mute all" as an on/off switch. A timed mute turns
//! it on and schedules a job that turns it off again.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::native::{NativeGroup, NativeResult};

/// Pending unmute jobs, one per group.
#[derive(Default)]
pub struct GroupMuteTimer {
    jobs: DashMap<i64, JoinHandle<()>>,
}

impl GroupMuteTimer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutes the whole group for `seconds`. Zero mutes until [`unmute`](Self::unmute).
    ///
    /// Returns false for a negative duration.
    pub async fn mute(&self, group: Arc<dyn NativeGroup>, seconds: i64) -> NativeResult<bool> {
        if seconds < 0 {
            return Ok(false);
        }

        let group_id = group.id();
        if let Some((_, previous)) = self.jobs.remove(&group_id) {
            previous.abort();
        }
        group.set_mute_all(true).await?;

        if seconds > 0 {
            let job = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(seconds.unsigned_abs())).await;
                match group.set_mute_all(false).await {
                    Ok(()) => debug!(group_id, "Timed group mute lifted"),
                    Err(e) => warn!(group_id, error = %e, "Failed to lift timed group mute"),
                }
            });
            self.jobs.insert(group_id, job);
        }
        Ok(true)
    }

    /// Lifts a whole-group mute. Returns false if the group was not muted.
    pub async fn unmute(&self, group: Arc<dyn NativeGroup>) -> NativeResult<bool> {
        if let Some((_, job)) = self.jobs.remove(&group.id()) {
            job.abort();
        }
        if !group.is_mute_all() {
            return Ok(false);
        }
        group.set_mute_all(false).await?;
        Ok(true)
    }

    /// Number of pending jobs.
    pub fn pending(&self) -> usize {
        self.jobs.iter().filter(|job| !job.is_finished()).count()
    }

    /// Aborts every pending job.
    pub fn cancel_all(&self) {
        self.jobs.retain(|_, job| {
            job.abort();
            false
        });
    }
}

impl Drop for GroupMuteTimer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::testing::TestGroup;

    #[tokio::test(start_paused = true)]
    async fn test_timed_mute_lifts_itself() {
        let timer = GroupMuteTimer::new();
        let group = TestGroup::new(100, "g");
        assert!(timer.mute(group.clone(), 60).await.unwrap());
        assert!(group.is_mute_all());
        assert_eq!(timer.pending(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(!group.is_mute_all());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remute_replaces_job() {
        let timer = GroupMuteTimer::new();
        let group = TestGroup::new(100, "g");
        timer.mute(group.clone(), 10).await.unwrap();
        timer.mute(group.clone(), 0).await.unwrap();
        assert_eq!(timer.pending(), 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(group.is_mute_all());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remute_is_not_lifted_by_previous_job() {
        let timer = GroupMuteTimer::new();
        let group = TestGroup::new(100, "g");
        group.delay_mute_ack(Duration::from_secs(2));

        timer.mute(group.clone(), 1).await.unwrap();
        // The previous job is due while the new mute waits for its ack.
        timer.mute(group.clone(), 60).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(group.is_mute_all());
        assert_eq!(timer.pending(), 1);
    }

    #[tokio::test]
    async fn test_negative_and_unmute() {
        let timer = GroupMuteTimer::new();
        let group = TestGroup::new(100, "g");
        assert!(!timer.mute(group.clone(), -1).await.unwrap());
        assert!(!group.is_mute_all());
        assert!(!timer.unmute(group.clone()).await.unwrap());

        timer.mute(group.clone(), 30).await.unwrap();
        assert!(timer.unmute(group.clone()).await.unwrap());
        assert!(!group.is_mute_all());
        assert_eq!(timer.pending(), 0);
    }
}
