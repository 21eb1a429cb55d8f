//! Decides whether a replicated snapshot may replace a client's optimistic view of
//! its own seat.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::document::{ClientId, RoundDocument};
use crate::settings::ReconcileMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Older than (or the same as) a revision already seen; dropped
    Stale,
    /// The snapshot is authoritative, including for the client's own seat
    Accepted,
    /// The snapshot updates other seats, the client's own seat keeps its local edit
    KeptLocal,
}

pub struct LocalReconciler {
    client: ClientId,
    mode: ReconcileMode,
    window: Duration,
    clock: Arc<dyn Clock>,
    last_token: u64,
    last_edit_at: Option<Duration>,
    last_revision: Option<u64>,
}

impl LocalReconciler {
    pub fn new(
        client: impl Into<ClientId>,
        mode: ReconcileMode,
        window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client: client.into(),
            mode,
            window,
            clock,
            last_token: 0,
            last_edit_at: None,
            last_revision: None,
        }
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    /// Forgets the revision seen so far; revisions restart with every round.
    /// Edit tokens keep counting.
    pub fn start_round(&mut self) {
        self.last_revision = None;
        self.last_edit_at = None;
    }

    /// Registers a local edit and returns the token to attach to it.
    pub fn next_token(&mut self) -> u64 {
        self.last_token += 1;
        self.last_edit_at = Some(self.clock.now());
        self.last_token
    }

    fn window_open(&self) -> bool {
        self.last_edit_at
            .is_some_and(|at| self.clock.now().saturating_sub(at) < self.window)
    }

    /// True while the client's own seat must not be overwritten by `doc`.
    ///
    /// In token mode the window still bounds the wait, so a write the host never saw
    /// cannot freeze the seat forever.
    pub fn protects(&self, doc: &RoundDocument) -> bool {
        match self.mode {
            ReconcileMode::Window => self.window_open(),
            ReconcileMode::EditToken => {
                doc.ack_for(&self.client) < self.last_token && self.window_open()
            }
        }
    }

    pub fn decide(&mut self, doc: &RoundDocument) -> Reconciliation {
        if self.last_revision.is_some_and(|seen| doc.revision <= seen) {
            tracing::trace!(
                client = %self.client,
                revision = doc.revision,
                "dropping stale snapshot"
            );
            return Reconciliation::Stale;
        }
        self.last_revision = Some(doc.revision);
        if self.protects(doc) {
            tracing::debug!(
                client = %self.client,
                revision = doc.revision,
                ack = doc.ack_for(&self.client),
                token = self.last_token,
                "keeping local edit over snapshot"
            );
            Reconciliation::KeptLocal
        } else {
            Reconciliation::Accepted
        }
    }
}
