use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::message::ChatMessage;
use super::summary::summarize_for_history;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// The last successful quote seen in a session, and the turn it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuote {
    pub chain_index: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub turn: u64,
}

impl PendingQuote {
    pub fn matches(&self, chain_index: &str, from: &str, to: &str, amount: &str) -> bool {
        self.chain_index == chain_index
            && self.from_token_address.eq_ignore_ascii_case(from)
            && self.to_token_address.eq_ignore_ascii_case(to)
            && self.amount == amount
    }
}

#[derive(Debug)]
struct Session {
    messages: Vec<ChatMessage>,
    last_access: DateTime<Utc>,
    turns: u64,
    pending_quote: Option<PendingQuote>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages: Vec::new(),
            last_access: now,
            turns: 0,
            pending_quote: None,
        }
    }
}

/// History snapshot handed to a turn, plus the turn's number in the session.
#[derive(Debug, Clone)]
pub struct TurnStart {
    pub history: Vec<ChatMessage>,
    pub turn: u64,
}

/// In-memory chat sessions keyed by client-generated id.
///
/// Sessions are created on first touch and dropped after `ttl` of
/// inactivity, or least-recently-used first once more than `max_sessions`
/// exist. Each session has its own lock; the map itself is sharded.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Vec<ChatMessage> {
        let session = self.session_at(session_id, Utc::now());
        let guard = session.lock();
        guard.messages.clone()
    }

    /// Snapshot history and allocate the next turn number.
    pub fn begin_turn(&self, session_id: &str) -> TurnStart {
        let session = self.session_at(session_id, Utc::now());
        let mut guard = session.lock();
        guard.turns += 1;
        TurnStart {
            history: guard.messages.clone(),
            turn: guard.turns,
        }
    }

    /// Persist every message of a finished turn in one step, together with
    /// the quote the turn produced, if any.
    pub fn commit_turn(&self, session_id: &str, staged: &[ChatMessage], quote: Option<PendingQuote>) {
        let session = self.session_at(session_id, Utc::now());
        let mut guard = session.lock();
        guard.messages.extend(staged.iter().map(summarize_for_history));
        if quote.is_some() {
            guard.pending_quote = quote;
        }
        debug!(session_id, committed = staged.len(), total = guard.messages.len(), "turn committed");
    }

    pub fn pending_quote(&self, session_id: &str) -> Option<PendingQuote> {
        let session = self.session_at(session_id, Utc::now());
        let guard = session.lock();
        guard.pending_quote.clone()
    }

    pub fn clear_quote(&self, session_id: &str) {
        let session = self.session_at(session_id, Utc::now());
        session.lock().pending_quote = None;
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now())
    }

    fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !is_idle(session.lock().last_access, now, self.ttl));
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically sweep expired sessions. Runs until the task is dropped.
    pub async fn run_sweeper(self: Arc<Self>, every: Duration) {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if self.is_empty() {
                continue;
            }
            let evicted = self.evict_expired();
            if evicted > 0 {
                info!(evicted, remaining = self.len(), "expired sessions evicted");
            }
        }
    }

    fn session_at(&self, session_id: &str, now: DateTime<Utc>) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.get(session_id) {
            let session = Arc::clone(existing.value());
            drop(existing);
            session.lock().last_access = now;
            return session;
        }

        let session = Arc::clone(
            self.sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(now))))
                .value(),
        );
        session.lock().last_access = now;

        if self.sessions.len() > self.max_sessions {
            self.evict_least_recent(session_id);
        }
        session
    }

    fn evict_least_recent(&self, keep: &str) {
        while self.sessions.len() > self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .filter(|entry| entry.key() != keep)
                .map(|entry| (entry.key().clone(), entry.value().lock().last_access))
                .min_by_key(|(_, last_access)| *last_access)
                .map(|(id, _)| id);

            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    debug!(session_id = %id, "session evicted at capacity");
                }
                None => break,
            }
        }
    }
}

fn is_idle(last_access: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(last_access)
        .to_std()
        .map(|idle| idle > ttl)
        .unwrap_or(false)
}
