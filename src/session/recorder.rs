//! Best-effort persistence of study outcomes
//!
//! Statistic writes run on a background task fed by an unbounded channel, so
//! a session never waits on storage. Each job is attempted exactly once; a
//! failure is logged and counted, never retried and never reported to the
//! session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::models::{SessionCard, SwipeDirection};
use crate::flashcards::{lock_store, CardStats, Flashcard, SharedStore};

/// Why a statistics write was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReason {
    Swipe(SwipeDirection),
    Undo,
}

/// A single storage write
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceJob {
    WriteStats {
        card_id: Uuid,
        stats: CardStats,
        reason: WriteReason,
    },
}

#[derive(Debug)]
enum QueueMessage {
    Job(PersistenceJob),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Counters of jobs processed by the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub attempted: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicUsize,
    failed: AtomicUsize,
}

/// Handle to the background persistence task
#[derive(Clone)]
pub struct PersistenceQueue {
    sender: mpsc::UnboundedSender<QueueMessage>,
    counters: Arc<Counters>,
}

impl PersistenceQueue {
    /// Start the queue on the current tokio runtime
    pub fn start(store: SharedStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        tokio::spawn(queue_loop(store, rx, Arc::clone(&counters)));

        Self {
            sender: tx,
            counters,
        }
    }

    /// Queue a job without waiting for it
    pub fn enqueue(&self, job: PersistenceJob) {
        if self.sender.send(QueueMessage::Job(job)).is_err() {
            log::error!("Persistence queue is closed; dropping statistics write");
        }
    }

    /// Wait until every job queued before this call has been attempted
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.sender.send(QueueMessage::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(QueueMessage::Shutdown);
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            attempted: self.counters.attempted.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
        }
    }
}

async fn queue_loop(
    store: SharedStore,
    mut receiver: mpsc::UnboundedReceiver<QueueMessage>,
    counters: Arc<Counters>,
) {
    while let Some(message) = receiver.recv().await {
        match message {
            QueueMessage::Job(job) => {
                counters.attempted.fetch_add(1, Ordering::SeqCst);
                if !run_job(&store, &job) {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
            QueueMessage::Flush(done) => {
                let _ = done.send(());
            }
            QueueMessage::Shutdown => break,
        }
    }
    log::debug!("Persistence queue stopped");
}

fn run_job(store: &SharedStore, job: &PersistenceJob) -> bool {
    let PersistenceJob::WriteStats {
        card_id,
        stats,
        reason,
    } = job;

    let mut store = match lock_store(store) {
        Ok(guard) => guard,
        Err(e) => {
            log::error!("Dropping write for card {}: {}", card_id, e);
            return false;
        }
    };

    match store.update_stats(*card_id, *stats) {
        Ok(_) => {
            log::debug!("Persisted {:?} stats for card {}: {:?}", reason, card_id, stats);
            true
        }
        Err(e) => {
            log::error!("Failed to persist {:?} stats for card {}: {}", reason, card_id, e);
            false
        }
    }
}

/// Turns swipes and undos into statistics writes.
///
/// Baselines are the counters each card had when the session started; undo
/// writes them back verbatim.
pub struct OutcomeRecorder {
    queue: PersistenceQueue,
    baselines: HashMap<Uuid, CardStats>,
}

impl OutcomeRecorder {
    pub fn new(queue: PersistenceQueue) -> Self {
        Self {
            queue,
            baselines: HashMap::new(),
        }
    }

    /// Capture the pre-session counters of every card. Later captures of the same card are ignored.
    pub fn capture_baselines(&mut self, pool: &[SessionCard]) {
        for card in pool {
            self.baselines.entry(card.id()).or_insert_with(|| card.card.stats());
        }
    }

    pub fn baseline(&self, card_id: Uuid) -> Option<CardStats> {
        self.baselines.get(&card_id).copied()
    }

    /// Queue the write for a swipe and return the counters that will be stored
    pub fn record_swipe(&self, card: &Flashcard, direction: SwipeDirection) -> CardStats {
        let stats = direction.apply(card.stats());
        self.queue.enqueue(PersistenceJob::WriteStats {
            card_id: card.id,
            stats,
            reason: WriteReason::Swipe(direction),
        });
        stats
    }

    /// Queue the write restoring a card's baseline
    pub fn revert(&self, card_id: Uuid) -> Option<CardStats> {
        let Some(stats) = self.baseline(card_id) else {
            log::warn!("No baseline recorded for card {}; undo not persisted", card_id);
            return None;
        };
        self.queue.enqueue(PersistenceJob::WriteStats {
            card_id,
            stats,
            reason: WriteReason::Undo,
        });
        Some(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::{shared, FlashcardStore, LanguagePair, MemoryStore, NewFlashcard};

    fn store_with(stats: CardStats) -> (SharedStore, Flashcard) {
        let mut store = MemoryStore::new();
        let mut new = NewFlashcard::new("dog", "Hund", &LanguagePair::new("English", "German"));
        new.stats = stats;
        let card = store.add(new).unwrap();
        (shared(store), card)
    }

    fn stored_stats(store: &SharedStore, id: Uuid) -> CardStats {
        store.lock().unwrap().get(id).unwrap().stats()
    }

    #[tokio::test]
    async fn test_swipe_outcomes_are_persisted() {
        let base = CardStats::new(5, 2, 1);
        for (direction, expected) in [
            (SwipeDirection::Right, CardStats::new(6, 2, 1)),
            (SwipeDirection::Left, CardStats::new(5, 3, 1)),
            (SwipeDirection::Down, CardStats::new(5, 2, 2)),
        ] {
            let (store, card) = store_with(base);
            let queue = PersistenceQueue::start(store.clone());
            let recorder = OutcomeRecorder::new(queue.clone());

            assert_eq!(recorder.record_swipe(&card, direction), expected);
            queue.flush().await;

            assert_eq!(stored_stats(&store, card.id), expected);
            assert_eq!(queue.stats(), QueueStats { attempted: 1, failed: 0 });
        }
    }

    #[tokio::test]
    async fn test_revert_writes_baseline() {
        let (store, card) = store_with(CardStats::new(1, 1, 0));
        let queue = PersistenceQueue::start(store.clone());
        let mut recorder = OutcomeRecorder::new(queue.clone());
        recorder.capture_baselines(&[SessionCard::new(card.clone())]);

        recorder.record_swipe(&card, SwipeDirection::Left);
        assert_eq!(recorder.revert(card.id), Some(CardStats::new(1, 1, 0)));
        queue.flush().await;

        assert_eq!(stored_stats(&store, card.id), CardStats::new(1, 1, 0));
        assert_eq!(queue.stats().attempted, 2);
    }

    #[tokio::test]
    async fn test_revert_without_baseline_issues_nothing() {
        let (store, _card) = store_with(CardStats::default());
        let queue = PersistenceQueue::start(store);
        let recorder = OutcomeRecorder::new(queue.clone());

        assert_eq!(recorder.revert(Uuid::new_v4()), None);
        queue.flush().await;
        assert_eq!(queue.stats().attempted, 0);
    }

    #[tokio::test]
    async fn test_failed_write_is_counted_not_retried() {
        let store = shared(MemoryStore::new());
        let queue = PersistenceQueue::start(store);
        let ghost = Flashcard::new("a".into(), "b".into(), "x".into(), "y".into());

        OutcomeRecorder::new(queue.clone()).record_swipe(&ghost, SwipeDirection::Right);
        queue.flush().await;

        assert_eq!(queue.stats(), QueueStats { attempted: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_is_dropped() {
        let (store, card) = store_with(CardStats::default());
        let queue = PersistenceQueue::start(store.clone());
        queue.shutdown();
        queue.flush().await;

        OutcomeRecorder::new(queue.clone()).record_swipe(&card, SwipeDirection::Right);
        queue.flush().await;
        assert_eq!(stored_stats(&store, card.id), CardStats::default());
    }
}
