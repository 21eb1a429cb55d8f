//! # dicehall-table: Replicated Round Hosting
//!
//! One [`RoundHost`] per table owns the round document and publishes every change to a
//! [`ReplicationChannel`]. Writers hold a [`WriterLease`]; a newer lease fences older
//! writers off. Each [`TableClient`] applies its own actions locally, sends them to the
//! host as [`SeatIntent`]s, and uses a [`LocalReconciler`] to keep lagging snapshots from
//! undoing those actions.

pub mod channel;
pub mod client;
pub mod clock;
pub mod document;
pub mod errors;
pub mod host;
pub mod intent;
pub mod logging;
pub mod reconciler;
pub mod settings;

pub use channel::{InMemoryChannel, ReplicationChannel, Subscription};
pub use client::TableClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{new_round_id, ClientId, Epoch, RoundDocument, RoundId, WriterLease};
pub use errors::TableError;
pub use host::{RecordingListener, RoundContext, RoundHost, RoundListener};
pub use intent::{intent_queue, IntentReceiver, IntentSender, SeatAction, SeatIntent};
pub use logging::{init_logging, init_test_logging, LogEntry, LogFormat, TestLogSubscriber};
pub use reconciler::{LocalReconciler, Reconciliation};
pub use settings::{ReconcileMode, SettingsError, TableSettings, TiePolicy};

#[cfg(test)]
mod tests {
    use super::*;
    use dicehall_engine::seat::{Seat, Table};
    use std::sync::Arc;

    #[test]
    fn host_and_client_share_one_channel() {
        let channel = Arc::new(InMemoryChannel::new());
        let clock = Arc::new(ManualClock::new());
        let table = Table::new(vec![Seat::human("ann"), Seat::bot("bot-1")]);
        let host = RoundHost::new(
            "host",
            table,
            TableSettings::default(),
            channel.clone(),
            clock,
        )
        .unwrap();

        assert!(host.round_id().is_none());
        assert_eq!(channel.subscriber_count("none"), 0);
    }
}
