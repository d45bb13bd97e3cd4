//! Study session engine
//!
//! Each session runs on its own task. Commands are handled one at a time in
//! arrival order, so transitions never race; the resulting status is
//! published on a watch channel after every command.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::models::{Result, SessionConfig, SessionError, SessionStatus, SwipeDirection};
use super::recorder::{OutcomeRecorder, PersistenceQueue};
use super::state::{initialize, reduce, SessionAction, SessionState};
use crate::flashcards::{lock_store, CardFilter, Flashcard, FlashcardStore, SharedStore};

#[derive(Debug)]
enum SessionCommand {
    Load(std::result::Result<Vec<Flashcard>, String>),
    Swipe {
        card_id: Uuid,
        direction: SwipeDirection,
    },
    Flip(Uuid),
    Undo,
    /// Sent by the restore timer of one particular undo
    ClearRestoring { card_id: Uuid, generation: u64 },
    Snapshot(oneshot::Sender<SessionState>),
    Stop,
}

/// Handle to a running study session. Dropping it stops the session.
pub struct StudySession {
    sender: mpsc::UnboundedSender<SessionCommand>,
    status: watch::Receiver<SessionStatus>,
    config: SessionConfig,
}

impl StudySession {
    /// Start a session over `cards`, which the caller has already filtered.
    ///
    /// A missing or empty card list fails with [`SessionError::NoCardsAvailable`].
    pub fn start(
        cards: Option<Vec<Flashcard>>,
        config: SessionConfig,
        queue: PersistenceQueue,
    ) -> Result<Self> {
        let state = initialize(cards.unwrap_or_default())?;
        log::info!("Starting study session with {} cards", state.pool.len());
        Ok(Self::spawn(state, config, queue))
    }

    /// Start a session that fetches its cards from `store`.
    ///
    /// The status reads `Loading` until the fetch finishes, then `Error` if the
    /// store failed or `Complete { has_any_cards: false }` if nothing matched.
    pub fn load(
        store: SharedStore,
        filter: CardFilter,
        config: SessionConfig,
        queue: PersistenceQueue,
    ) -> Self {
        let session = Self::spawn(SessionState::loading(), config, queue);

        let sender = session.sender.clone();
        tokio::task::spawn_blocking(move || {
            let result = lock_store(&store)
                .map_err(|e| e.to_string())
                .and_then(|store| fetch_cards(&*store, &filter));
            let _ = sender.send(SessionCommand::Load(result));
        });

        session
    }

    fn spawn(state: SessionState, config: SessionConfig, queue: PersistenceQueue) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(state.status());

        let mut recorder = OutcomeRecorder::new(queue);
        recorder.capture_baselines(&state.pool);

        let worker = SessionWorker {
            state,
            recorder,
            config: config.clone(),
            sender: tx.clone(),
            status: status_tx,
            restore_generation: 0,
            pending_restores: HashMap::new(),
        };
        tokio::spawn(worker.run(rx));

        Self {
            sender: tx,
            status: status_rx,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to status updates
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn current_status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn swipe(&self, card_id: Uuid, direction: SwipeDirection) -> Result<()> {
        self.send(SessionCommand::Swipe { card_id, direction })
    }

    pub fn flip(&self, card_id: Uuid) -> Result<()> {
        self.send(SessionCommand::Flip(card_id))
    }

    /// Bring back the most recently exited card. Does nothing when there is none.
    pub fn undo(&self) -> Result<()> {
        self.send(SessionCommand::Undo)
    }

    /// State after every command sent before this call has been handled
    pub async fn snapshot(&self) -> Result<SessionState> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub fn stop(&self) {
        let _ = self.sender.send(SessionCommand::Stop);
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.sender.send(command).map_err(|_| SessionError::Closed)
    }
}

impl Drop for StudySession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn fetch_cards(
    store: &dyn FlashcardStore,
    filter: &CardFilter,
) -> std::result::Result<Vec<Flashcard>, String> {
    let cards = match &filter.language_pair {
        Some(pair) => store.get_by_language_pair(pair),
        None => store.get_all(),
    };
    cards.map(|cards| filter.apply(cards)).map_err(|e| e.to_string())
}

struct SessionWorker {
    state: SessionState,
    recorder: OutcomeRecorder,
    config: SessionConfig,
    /// Used by restore timers to post back into the queue
    sender: mpsc::UnboundedSender<SessionCommand>,
    status: watch::Sender<SessionStatus>,
    restore_generation: u64,
    /// Card id to the generation of its latest undo whose flag is still set
    pending_restores: HashMap<Uuid, u64>,
}

impl SessionWorker {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<SessionCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                SessionCommand::Load(result) => self.handle_load(result),
                SessionCommand::Swipe { card_id, direction } => self.handle_swipe(card_id, direction),
                SessionCommand::Flip(card_id) => self.dispatch(SessionAction::Flip(card_id)),
                SessionCommand::Undo => self.handle_undo(),
                SessionCommand::ClearRestoring { card_id, generation } => {
                    self.handle_clear_restoring(card_id, generation)
                }
                SessionCommand::Snapshot(reply) => {
                    let _ = reply.send(self.state.clone());
                }
                SessionCommand::Stop => break,
            }
            self.status.send_replace(self.state.status());
        }
        log::debug!("Study session stopped after {} cards", self.state.progress);
    }

    fn dispatch(&mut self, action: SessionAction) {
        let state = std::mem::replace(&mut self.state, SessionState::loading());
        self.state = reduce(state, action);
    }

    fn handle_load(&mut self, result: std::result::Result<Vec<Flashcard>, String>) {
        match result {
            Ok(cards) => match initialize(cards) {
                Ok(state) => {
                    log::info!("Loaded study session with {} cards", state.pool.len());
                    self.recorder.capture_baselines(&state.pool);
                    self.state = state;
                }
                Err(SessionError::NoCardsAvailable) => {
                    log::info!("No cards match the study filter");
                    self.dispatch(SessionAction::SetLoading(false));
                }
                Err(e) => self.dispatch(SessionAction::SetError(e.to_string())),
            },
            Err(message) => {
                log::error!("Failed to load study cards: {}", message);
                self.dispatch(SessionAction::SetError(message));
            }
        }
    }

    fn handle_swipe(&mut self, card_id: Uuid, direction: SwipeDirection) {
        let Some(card) = self.state.window_card(card_id) else {
            log::debug!("Ignoring swipe on card {} outside the window", card_id);
            return;
        };
        if card.swipe_direction.is_some() {
            log::debug!("Ignoring repeated swipe on card {}", card_id);
            return;
        }

        let mut swiped = card.clone();
        swiped.swipe_direction = Some(direction);
        self.recorder.record_swipe(&swiped.card, direction);

        self.dispatch(SessionAction::UpdateCard(swiped));
        self.dispatch(SessionAction::CardExited(card_id));
    }

    fn handle_undo(&mut self) {
        let Some(last) = self.state.discard_stack.last() else {
            return;
        };
        let card_id = last.id();

        self.recorder.revert(card_id);
        self.dispatch(SessionAction::Undo);

        self.restore_generation += 1;
        let generation = self.restore_generation;
        self.pending_restores.insert(card_id, generation);

        let sender = self.sender.clone();
        let delay = self.config.restore_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(SessionCommand::ClearRestoring {
                card_id,
                generation,
            });
        });
    }

    fn handle_clear_restoring(&mut self, card_id: Uuid, generation: u64) {
        if self.pending_restores.get(&card_id) != Some(&generation) {
            log::debug!("Ignoring stale restore timer for card {}", card_id);
            return;
        }
        self.pending_restores.remove(&card_id);

        if let Some(card) = self.state.window_card(card_id) {
            if card.is_restoring {
                let mut cleared = card.clone();
                cleared.is_restoring = false;
                self.dispatch(SessionAction::UpdateCard(cleared));
            }
        }
    }
}
