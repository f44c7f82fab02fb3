//! Background notification polling.
//!
//! `NotificationPoller` polls the unread set on a fixed interval, feeds each
//! result through a [`NotificationSession`], and broadcasts what changed.
//! Failed polls are logged and skipped; the next tick tries again.

use console_core::clock::{Clock, SystemClock};
use console_core::config::ConsoleConfig;
use console_core::notification::{
    Notification, NotificationId, NotificationService, NotificationSession,
};
use console_core::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

/// Changes observed by the poller.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// A notification that appeared since the previous poll; one per toast.
    Arrived(Notification),
    /// The unread badge count changed.
    BadgeChanged(usize),
}

struct PollerShared {
    service: Arc<dyn NotificationService>,
    session: Mutex<NotificationSession>,
    events: broadcast::Sender<NotificationEvent>,
    /// Held from fetch through `observe`; polls apply in the order issued.
    polling: AsyncMutex<()>,
}

impl PollerShared {
    fn session(&self) -> MutexGuard<'_, NotificationSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: NotificationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn poll_once(&self) -> Result<Vec<Notification>> {
        let _polling = self.polling.lock().await;
        let unread = self.service.list_unread().await?;

        let (arrived, before, after) = {
            let mut session = self.session();
            let before = session.unread_count();
            let arrived = session.observe(unread);
            (arrived, before, session.unread_count())
        };

        if !arrived.is_empty() {
            tracing::info!(target: "notifications", "{} new notification(s)", arrived.len());
        }
        for notification in &arrived {
            self.emit(NotificationEvent::Arrived(notification.clone()));
        }
        if before != after {
            self.emit(NotificationEvent::BadgeChanged(after));
        }
        Ok(arrived)
    }
}

struct RunningPoll {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

pub struct NotificationPoller {
    shared: Arc<PollerShared>,
    interval: Duration,
    lifetime: CancellationToken,
    running: Mutex<Option<RunningPoll>>,
}

impl NotificationPoller {
    pub fn new(
        service: Arc<dyn NotificationService>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(PollerShared {
                service,
                session: Mutex::new(NotificationSession::new(clock)),
                events,
                polling: AsyncMutex::new(()),
            }),
            interval,
            lifetime: CancellationToken::new(),
            running: Mutex::new(None),
        }
    }

    /// Poller on the wall clock with the configured interval.
    pub fn from_config(service: Arc<dyn NotificationService>, config: &ConsoleConfig) -> Self {
        Self::new(service, Arc::new(SystemClock), config.poll_interval())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.shared.events.subscribe()
    }

    fn running(&self) -> MutexGuard<'_, Option<RunningPoll>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Starts polling: once immediately, then every interval. Does nothing
    /// when already running.
    pub fn start(&self) {
        let mut running = self.running();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return;
        }

        let shutdown = self.lifetime.child_token();
        let shared = self.shared.clone();
        let interval = self.interval;
        let loop_shutdown = shutdown.clone();

        let task = tokio::spawn(async move {
            tracing::info!(
                target: "notifications",
                "Notification polling started (every {}s)",
                interval.as_secs()
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = loop_shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let result = tokio::select! {
                            _ = loop_shutdown.cancelled() => break,
                            result = shared.poll_once() => result,
                        };
                        if let Err(err) = result {
                            tracing::debug!(target: "notifications", "Notification poll failed: {}", err);
                        }
                    }
                }
            }
            tracing::info!(target: "notifications", "Notification polling stopped");
        });

        *running = Some(RunningPoll { shutdown, task });
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn stop(&self) {
        let running = self.running().take();
        if let Some(running) = running {
            running.shutdown.cancel();
            if let Err(err) = running.task.await {
                tracing::warn!(target: "notifications", "Polling task ended abnormally: {}", err);
            }
        }
    }

    /// Runs a single poll outside the schedule. Waits for a poll already in
    /// flight to finish first.
    pub async fn poll_once(&self) -> Result<Vec<Notification>> {
        self.shared.poll_once().await
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.shared.session().notifications().to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.shared.session().unread_count()
    }

    /// Hides everything currently unread from future toasts. Local only.
    pub fn dismiss_all(&self) {
        self.shared.session().dismiss_all();
        tracing::debug!(target: "notifications", "Notifications dismissed");
    }

    /// Marks one notification read on the server, then locally.
    ///
    /// A failed request is logged and abandoned; local state is untouched.
    pub async fn mark_as_read(&self, id: &NotificationId) -> bool {
        if let Err(err) = self.shared.service.mark_read(id).await {
            tracing::debug!(target: "notifications", "Mark read {} failed: {}", id, err);
            return false;
        }
        let (removed, count) = {
            let mut session = self.shared.session();
            (session.mark_read(id), session.unread_count())
        };
        if removed {
            self.shared.emit(NotificationEvent::BadgeChanged(count));
        }
        true
    }

    /// Marks everything read on the server, then clears the local list.
    ///
    /// A failed request is logged and abandoned; local state is untouched.
    pub async fn mark_all_as_read(&self) -> bool {
        if let Err(err) = self.shared.service.mark_all_read().await {
            tracing::debug!(target: "notifications", "Mark all read failed: {}", err);
            return false;
        }
        self.shared.session().mark_all_read();
        self.shared.emit(NotificationEvent::BadgeChanged(0));
        true
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use console_core::ConsoleError;
    use console_core::clock::ManualClock;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const INTERVAL: Duration = Duration::from_secs(30);

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, minute, 0).unwrap()
    }

    fn notification(id: &str, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(id),
            created_at,
            body: format!("notification {id}"),
            title: None,
            kind: None,
            ticket_id: None,
        }
    }

    /// Replays scripted poll results; repeats the last one when exhausted.
    #[derive(Default)]
    struct ScriptedNotifications {
        polls: Mutex<VecDeque<Result<Vec<Notification>>>>,
        last: Mutex<Vec<Notification>>,
        poll_count: AtomicUsize,
        fail_marks: bool,
        marked: Mutex<Vec<String>>,
    }

    impl ScriptedNotifications {
        fn new(polls: Vec<Result<Vec<Notification>>>) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
                ..Self::default()
            }
        }

        fn polls(&self) -> usize {
            self.poll_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationService for ScriptedNotifications {
        async fn list_unread(&self) -> Result<Vec<Notification>> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            match self.polls.lock().unwrap().pop_front() {
                Some(Ok(unread)) => {
                    *self.last.lock().unwrap() = unread.clone();
                    Ok(unread)
                }
                Some(Err(err)) => Err(err),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }

        async fn mark_read(&self, id: &NotificationId) -> Result<()> {
            if self.fail_marks {
                return Err(ConsoleError::transport(Some(500), "boom"));
            }
            self.marked.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn mark_all_read(&self) -> Result<()> {
            if self.fail_marks {
                return Err(ConsoleError::transport(None, "offline"));
            }
            self.marked.lock().unwrap().push("*".to_string());
            Ok(())
        }
    }

    fn poller(service: Arc<dyn NotificationService>) -> NotificationPoller {
        NotificationPoller::new(service, Arc::new(ManualClock::new(at(10))), INTERVAL)
    }

    #[tokio::test]
    async fn test_first_poll_is_silent_baseline() {
        let service = Arc::new(ScriptedNotifications::new(vec![
            Ok(vec![
                notification("1", at(1)),
                notification("2", at(2)),
                notification("3", at(3)),
            ]),
            Ok(vec![
                notification("1", at(1)),
                notification("2", at(2)),
                notification("3", at(3)),
                notification("4", at(11)),
            ]),
        ]));
        let poller = poller(service);
        let mut events = poller.subscribe();

        assert!(poller.poll_once().await.unwrap().is_empty());
        assert_eq!(poller.unread_count(), 3);
        assert_eq!(events.recv().await.unwrap(), NotificationEvent::BadgeChanged(3));

        let arrived = poller.poll_once().await.unwrap();
        assert_eq!(arrived.len(), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Arrived(notification("4", at(11)))
        );
        assert_eq!(events.recv().await.unwrap(), NotificationEvent::BadgeChanged(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_loop_polls_on_interval_and_survives_failures() {
        let service = Arc::new(ScriptedNotifications::new(vec![
            Ok(vec![]),
            Err(ConsoleError::transport(Some(503), "unavailable")),
            Ok(vec![notification("a", at(12))]),
        ]));
        let poller = poller(service.clone());
        let mut events = poller.subscribe();

        poller.start();
        assert!(poller.is_running());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(service.polls(), 1);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(service.polls(), 2);
        assert_eq!(poller.unread_count(), 0);

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(service.polls(), 3);
        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Arrived(notification("a", at(12)))
        );

        poller.stop().await;
        assert!(!poller.is_running());
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(service.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let service = Arc::new(ScriptedNotifications::new(vec![Ok(vec![])]));
        let poller = poller(service.clone());

        poller.start();
        poller.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(service.polls(), 1);
        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let service = Arc::new(ScriptedNotifications::new(vec![Ok(vec![])]));
        let poller = poller(service.clone());
        poller.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        drop(poller);
        tokio::time::sleep(INTERVAL * 2).await;

        assert_eq!(service.polls(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_all_silences_existing() {
        let service = Arc::new(ScriptedNotifications::new(vec![
            Ok(vec![]),
            Ok(vec![notification("a", at(5))]),
        ]));
        let poller = poller(service);
        poller.poll_once().await.unwrap();

        poller.dismiss_all();

        assert!(poller.poll_once().await.unwrap().is_empty());
        assert_eq!(poller.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_updates_after_server_confirms() {
        let service = Arc::new(ScriptedNotifications::new(vec![Ok(vec![
            notification("1", at(1)),
            notification("2", at(2)),
        ])]));
        let poller = poller(service.clone());
        poller.poll_once().await.unwrap();

        assert!(poller.mark_as_read(&NotificationId::new("1")).await);
        assert_eq!(poller.unread_count(), 1);
        assert_eq!(*service.marked.lock().unwrap(), vec!["1".to_string()]);

        assert!(poller.mark_all_as_read().await);
        assert_eq!(poller.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_mark_is_abandoned() {
        let service = Arc::new(ScriptedNotifications {
            fail_marks: true,
            ..ScriptedNotifications::new(vec![Ok(vec![notification("1", at(1))])])
        });
        let poller = poller(service);
        poller.poll_once().await.unwrap();

        assert!(!poller.mark_as_read(&NotificationId::new("1")).await);
        assert!(!poller.mark_all_as_read().await);
        assert_eq!(poller.unread_count(), 1);
    }

    /// Serves responses in call order; a gated response waits for its gate.
    struct GatedNotifications {
        responses: Mutex<VecDeque<(Option<Arc<Notify>>, Vec<Notification>)>>,
        last: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationService for GatedNotifications {
        async fn list_unread(&self) -> Result<Vec<Notification>> {
            let next = self.responses.lock().unwrap().pop_front();
            let Some((gate, unread)) = next else {
                return Ok(self.last.lock().unwrap().clone());
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }
            *self.last.lock().unwrap() = unread.clone();
            Ok(unread)
        }

        async fn mark_read(&self, _id: &NotificationId) -> Result<()> {
            Ok(())
        }

        async fn mark_all_read(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_overlapping_polls_toast_each_notification_once() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(GatedNotifications {
            responses: Mutex::new(
                vec![
                    (None, vec![]),
                    (Some(gate.clone()), vec![]),
                    (None, vec![notification("a", at(12))]),
                ]
                .into(),
            ),
            last: Mutex::new(Vec::new()),
        });
        let poller = Arc::new(poller(service));
        poller.poll_once().await.unwrap();

        let slow = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_once().await }
        });
        tokio::task::yield_now().await;
        let fast = tokio::spawn({
            let poller = poller.clone();
            async move { poller.poll_once().await }
        });
        tokio::task::yield_now().await;
        gate.notify_one();

        let mut toasted: Vec<String> = Vec::new();
        for task in [slow, fast] {
            toasted.extend(task.await.unwrap().unwrap().iter().map(|n| n.id.to_string()));
        }
        assert_eq!(toasted, vec!["a".to_string()]);

        assert!(poller.poll_once().await.unwrap().is_empty());
        assert_eq!(poller.unread_count(), 1);
    }
}
