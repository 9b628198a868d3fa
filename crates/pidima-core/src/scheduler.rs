//! Reply Scheduler - simulated asynchronous assistant replies.
//!
//! A reply is classified immediately, then delivered on a timeline:
//! typing starts, the user message goes delivered, then read, and finally
//! typing stops and the reply is appended. At most one reply is pending at a
//! time; arming a new one cancels every remaining effect of the previous one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::lock_store;
use crate::{
    ConversationObserver, Intent, IntentClassifier, MessageStatus, NewMessage, ReplyTiming,
    SharedStore,
};

/// What a call to [`ReplyScheduler::simulate_reply`] armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPlan {
    /// Intent the user text was classified as.
    pub intent: Intent,
    /// Reply that will be appended.
    pub reply: String,
    /// Time from now until the reply is appended.
    pub delay: Duration,
}

/// Handle to the effects of one armed reply.
struct PendingReply {
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PendingReply {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

#[derive(Default)]
struct PendingSlot {
    next_generation: u64,
    current: Option<PendingReply>,
}

type SharedSlot = Arc<Mutex<PendingSlot>>;

fn lock_slot(slot: &SharedSlot) -> MutexGuard<'_, PendingSlot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Simulates assistant replies on a timer.
pub struct ReplyScheduler {
    store: SharedStore,
    observer: Arc<dyn ConversationObserver>,
    classifier: Arc<IntentClassifier>,
    timing: ReplyTiming,
    slot: SharedSlot,
    typing_tx: Arc<watch::Sender<bool>>,
}

impl ReplyScheduler {
    /// Create a scheduler writing replies into `store`.
    ///
    /// `timing` is expected to have passed [`ReplyTiming::validate`].
    pub fn new(
        store: SharedStore,
        observer: Arc<dyn ConversationObserver>,
        classifier: Arc<IntentClassifier>,
        timing: ReplyTiming,
    ) -> Self {
        let (typing_tx, _) = watch::channel(false);
        Self {
            store,
            observer,
            classifier,
            timing,
            slot: Arc::new(Mutex::new(PendingSlot::default())),
            typing_tx: Arc::new(typing_tx),
        }
    }

    /// Classify `user_text` and arm the delivery of its reply.
    ///
    /// Any reply still pending from an earlier call is cancelled first; none
    /// of its remaining effects will be observed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn simulate_reply(&self, user_text: &str) -> ReplyPlan {
        let (intent, reply) = self.classifier.classify_with_intent(user_text);
        let delay = self.timing.reply_delay(reply.chars().count());
        let start = Instant::now();

        let mut slot = lock_slot(&self.slot);
        if let Some(previous) = slot.current.take() {
            debug!(generation = previous.generation, "Replacing pending reply");
            previous.cancel();
        }

        set_typing(&*self.observer, &self.typing_tx, true);

        let generation = slot.next_generation;
        slot.next_generation += 1;
        let token = CancellationToken::new();

        let task = ReplyTask {
            store: self.store.clone(),
            observer: self.observer.clone(),
            typing_tx: self.typing_tx.clone(),
            slot: self.slot.clone(),
            generation,
            token: token.clone(),
            reply: reply.clone(),
            delivered_at: start + self.timing.delivered_after,
            read_at: start + self.timing.read_after,
            reply_at: start + delay,
        };
        let handle = tokio::spawn(task.run());

        slot.current = Some(PendingReply {
            generation,
            token,
            handle,
        });

        info!(
            intent = ?intent,
            generation,
            delay_ms = delay.as_millis() as u64,
            "Scheduled simulated reply"
        );

        ReplyPlan {
            intent,
            reply,
            delay,
        }
    }

    /// Cancel the pending reply, if any, and clear the typing state.
    ///
    /// Returns true if a reply was pending.
    pub fn cancel(&self) -> bool {
        if !self.invalidate_pending() {
            return false;
        }
        set_typing(&*self.observer, &self.typing_tx, false);
        true
    }

    /// Cancel the pending reply without touching the typing state.
    pub(crate) fn invalidate_pending(&self) -> bool {
        let previous = lock_slot(&self.slot).current.take();
        match previous {
            Some(previous) => {
                debug!(generation = previous.generation, "Cancelled pending reply");
                previous.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns true if a reply is armed and not yet delivered.
    pub fn is_pending(&self) -> bool {
        lock_slot(&self.slot).current.is_some()
    }

    /// Subscribe to the typing indicator.
    pub fn typing(&self) -> watch::Receiver<bool> {
        self.typing_tx.subscribe()
    }

    /// Wait until no reply is pending.
    pub async fn wait_idle(&self) {
        let mut rx = self.typing_tx.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|typing| !*typing).await;
    }
}

/// Publish the typing state; observers hear only actual changes.
fn set_typing(observer: &dyn ConversationObserver, tx: &watch::Sender<bool>, typing: bool) {
    let changed = tx.send_if_modified(|current| {
        if *current == typing {
            return false;
        }
        *current = typing;
        true
    });
    if changed {
        observer.on_typing_changed(typing);
    }
}

/// The delayed effects of one reply.
struct ReplyTask {
    store: SharedStore,
    observer: Arc<dyn ConversationObserver>,
    typing_tx: Arc<watch::Sender<bool>>,
    slot: SharedSlot,
    generation: u64,
    token: CancellationToken,
    reply: String,
    delivered_at: Instant,
    read_at: Instant,
    reply_at: Instant,
}

impl ReplyTask {
    async fn run(self) {
        if !self.wait_until(self.delivered_at).await
            || !self.advance(MessageStatus::Delivered)
        {
            return;
        }
        if !self.wait_until(self.read_at).await || !self.advance(MessageStatus::Read) {
            return;
        }
        if !self.wait_until(self.reply_at).await || !self.deliver() {
            return;
        }

        // Release the slot unless a newer reply already replaced it
        let mut slot = lock_slot(&self.slot);
        if slot
            .current
            .as_ref()
            .is_some_and(|p| p.generation == self.generation)
        {
            slot.current = None;
        }
    }

    /// Sleep until `deadline`. Returns false if cancelled first.
    async fn wait_until(&self, deadline: Instant) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = sleep_until(deadline) => true,
        }
    }

    /// Advance the last user message. The cancellation check and the write
    /// happen under the store lock.
    fn advance(&self, status: MessageStatus) -> bool {
        let mut store = lock_store(&self.store);
        if self.token.is_cancelled() {
            return false;
        }
        store.update_last_user_status(status);
        true
    }

    /// Stop typing and append the reply.
    fn deliver(&self) -> bool {
        let mut store = lock_store(&self.store);
        if self.token.is_cancelled() {
            return false;
        }
        set_typing(&*self.observer, &self.typing_tx, false);
        let message = store.append(NewMessage::assistant(self.reply.clone()));
        debug!(generation = self.generation, message_id = %message.id, "Delivered simulated reply");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageStore;
    use crate::{Author, MemoryStorage, Message, MessageId};

    /// Records observer calls in order.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ConversationObserver for Recorder {
        fn on_message_appended(&self, message: &Message) {
            self.events
                .lock()
                .unwrap()
                .push(format!("append:{:?}", message.author));
        }

        fn on_status_updated(&self, _id: &MessageId, status: MessageStatus) {
            self.events
                .lock()
                .unwrap()
                .push(format!("status:{}", status.as_str()));
        }

        fn on_typing_changed(&self, typing: bool) {
            self.events.lock().unwrap().push(format!("typing:{}", typing));
        }
    }

    fn setup() -> (SharedStore, Arc<Recorder>, ReplyScheduler) {
        let recorder = Arc::new(Recorder::default());
        let store = MessageStore::new(
            Arc::new(MemoryStorage::new()),
            recorder.clone(),
            "history",
        )
        .into_shared();
        let scheduler = ReplyScheduler::new(
            store.clone(),
            recorder.clone(),
            Arc::new(IntentClassifier::new()),
            ReplyTiming::default(),
        );
        (store, recorder, scheduler)
    }

    fn last_status(store: &SharedStore) -> MessageStatus {
        lock_store(store)
            .messages()
            .iter()
            .rev()
            .find(|m| m.author == Author::User)
            .map(|m| m.status)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_fire_in_order() {
        let (store, recorder, scheduler) = setup();
        lock_store(&store).append(NewMessage::user("thanks"));

        let plan = scheduler.simulate_reply("thanks");
        assert_eq!(plan.intent, Intent::Thanks);
        // Short reply: 600ms base + 400ms floor
        assert_eq!(plan.delay, Duration::from_millis(1000));
        assert!(*scheduler.typing().borrow());

        tokio::time::sleep(Duration::from_millis(650)).await;
        assert_eq!(last_status(&store), MessageStatus::Delivered);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(last_status(&store), MessageStatus::Read);
        assert_eq!(lock_store(&store).len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(lock_store(&store).len(), 2);
        assert!(!*scheduler.typing().borrow());
        assert!(!scheduler.is_pending());

        assert_eq!(
            recorder.events(),
            vec![
                "append:User",
                "typing:true",
                "status:delivered",
                "status:read",
                "typing:false",
                "append:Assistant",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_reply_cancels_previous() {
        let (store, recorder, scheduler) = setup();

        lock_store(&store).append(NewMessage::user("a"));
        scheduler.simulate_reply("a");

        tokio::time::sleep(Duration::from_millis(100)).await;
        lock_store(&store).append(NewMessage::user("b"));
        let plan = scheduler.simulate_reply("b");

        scheduler.wait_idle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let store = lock_store(&store);
        let replies: Vec<_> = store
            .messages()
            .iter()
            .filter(|m| m.author == Author::Assistant)
            .collect();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, plan.reply);

        // First message never advanced; only the second one did
        assert_eq!(store.messages()[0].status, MessageStatus::Sent);
        assert_eq!(store.messages()[1].status, MessageStatus::Read);

        let statuses = recorder
            .events()
            .into_iter()
            .filter(|e| e.starts_with("status:"))
            .count();
        assert_eq!(statuses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_does_not_repeat_typing() {
        let (store, recorder, scheduler) = setup();

        lock_store(&store).append(NewMessage::user("a"));
        scheduler.simulate_reply("a");
        lock_store(&store).append(NewMessage::user("b"));
        scheduler.simulate_reply("b");
        scheduler.wait_idle().await;

        let typing: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| e.starts_with("typing:"))
            .collect();
        assert_eq!(typing, vec!["typing:true", "typing:false"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_after_delivered_keeps_monotonic_status() {
        let (store, _recorder, scheduler) = setup();

        lock_store(&store).append(NewMessage::user("hello"));
        scheduler.simulate_reply("hello");
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(last_status(&store), MessageStatus::Delivered);

        // Re-arm for the same message; the new run's delivered step is a no-op
        scheduler.simulate_reply("hello");
        scheduler.wait_idle().await;

        assert_eq!(last_status(&store), MessageStatus::Read);
        assert_eq!(lock_store(&store).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_leaves_no_residual_effects() {
        let (store, recorder, scheduler) = setup();
        lock_store(&store).append(NewMessage::user("bye"));
        scheduler.simulate_reply("bye");

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert!(!*scheduler.typing().borrow());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(lock_store(&store).len(), 1);
        assert_eq!(last_status(&store), MessageStatus::Sent);
        assert_eq!(
            recorder.events(),
            vec!["append:User", "typing:true", "typing:false"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_reply_waits_longer() {
        let (_store, _recorder, scheduler) = setup();
        let short = scheduler.simulate_reply("thanks");
        let long = scheduler.simulate_reply("how do I authenticate requests with oauth");
        assert_eq!(long.intent, Intent::Authentication);
        assert!(long.delay > short.delay);
        assert!(long.delay <= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let (_store, _recorder, scheduler) = setup();
        scheduler.wait_idle().await;
        assert!(!scheduler.is_pending());
    }
}
