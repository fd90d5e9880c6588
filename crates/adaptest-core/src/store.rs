//! Injectable session storage and the store-backed service.
//!
//! The engine never holds sessions itself. Hosts implement [`SessionStore`]
//! over whatever backend they persist to and drive the test through
//! [`SessionService`], which loads a session, runs one engine step, and writes
//! it back. Concurrent calls against the same session must be serialized by
//! the host.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::analysis::PatternReport;
use crate::engine::{AnswerOutcome, CatEngine, NextStep, SessionOverrides};
use crate::error::{EngineError, StoreError};
use crate::model::{Item, KnowledgePoint, Session, SessionId, Submission};

/// Storage for sessions between calls.
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id.
    fn get(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Insert or replace a session.
    fn put(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove a session. Returns whether it existed.
    fn delete(&self, id: SessionId) -> Result<bool, StoreError>;
}

/// A process-local store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.lock().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions.get(&id).cloned())
    }

    fn put(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    fn delete(&self, id: SessionId) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions.remove(&id).is_some())
    }
}

/// Runs engine calls against sessions held in a [`SessionStore`].
pub struct SessionService<S: SessionStore> {
    engine: CatEngine,
    store: S,
}

impl<S: SessionStore> SessionService<S> {
    pub fn new(engine: CatEngine, store: S) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &CatEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start and store a new session.
    pub fn start(&self, overrides: &SessionOverrides) -> Result<Session, EngineError> {
        let session = self.engine.start(overrides)?;
        self.store.put(&session)?;
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> Result<Session, EngineError> {
        self.store.get(id)?.ok_or(EngineError::SessionNotFound(id))
    }

    /// Choose the next item for a stored session.
    pub fn next_item<'a>(
        &self,
        id: SessionId,
        items: &'a [Item],
        knowledge_points: &[KnowledgePoint],
    ) -> Result<NextStep<'a>, EngineError> {
        let mut session = self.get(id)?;
        let step = self.engine.next_item(&mut session, items, knowledge_points);
        self.store.put(&session)?;
        Ok(step)
    }

    /// Record an answer. A rejected answer is never written back.
    pub fn record_answer(
        &self,
        id: SessionId,
        item: &Item,
        submission: &Submission,
    ) -> Result<AnswerOutcome, EngineError> {
        let mut session = self.get(id)?;
        let outcome = self.engine.record_answer(&mut session, item, submission)?;
        self.store.put(&session)?;
        Ok(outcome)
    }

    /// Finalize a stored session. Repeated calls return the same report.
    pub fn finalize(&self, id: SessionId) -> Result<PatternReport, EngineError> {
        let mut session = self.get(id)?;
        let report = self.engine.finalize(&mut session);
        self.store.put(&session)?;
        Ok(report)
    }

    pub fn fail(&self, id: SessionId, reason: &str) -> Result<(), EngineError> {
        let mut session = self.get(id)?;
        self.engine.fail(&mut session, reason);
        self.store.put(&session)?;
        Ok(())
    }

    /// Forget a session. Returns whether it existed.
    pub fn delete(&self, id: SessionId) -> Result<bool, EngineError> {
        Ok(self.store.delete(id)?)
    }
}
