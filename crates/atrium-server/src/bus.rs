use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use atrium_core::events::CallbackEvent;
use atrium_core::ids::{ChannelId, SessionId};

/// Handle returned by [`CallbackBus::register`]. Identifies one channel so
/// the owning stream can deregister it on disconnect.
#[derive(Clone, Debug)]
pub struct ChannelHandle {
    session_id: SessionId,
    channel_id: ChannelId,
}

impl ChannelHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// Session-scoped registry of open push channels.
///
/// Maps a session id to the set of channels currently streaming to that
/// session. A session key is present iff at least one channel is open under
/// it; the last deregistration removes the entry. Channels carry
/// pre-serialized event strings, so each publish serializes once and the
/// SSE layer owns the wire framing.
pub struct CallbackBus {
    sessions: DashMap<SessionId, HashMap<ChannelId, mpsc::Sender<String>>>,
    channel_capacity: usize,
}

impl CallbackBus {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Open a channel under `session_id` and return its handle plus the
    /// receiving end. A `connected` acknowledgment is pushed through the
    /// channel before this returns, so the caller can distinguish
    /// "registered" from "registered and confirmed".
    pub fn register(&self, session_id: SessionId) -> (ChannelHandle, mpsc::Receiver<String>) {
        let channel_id = ChannelId::new();
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        self.sessions
            .entry(session_id.clone())
            .or_default()
            .insert(channel_id.clone(), tx.clone());

        if let Some(json) = serialize(CallbackEvent::connected()) {
            // The channel is fresh and capacity is >= 1, so this holds.
            let _ = tx.try_send(json);
        }

        tracing::debug!(session_id = %session_id, channel_id = %channel_id, "channel registered");

        (
            ChannelHandle {
                session_id,
                channel_id,
            },
            rx,
        )
    }

    /// Remove a channel. The session entry is dropped together with its
    /// last channel. Idempotent: deregistering an already-removed handle
    /// is a no-op.
    pub fn unregister(&self, handle: &ChannelHandle) {
        if let Entry::Occupied(mut entry) = self.sessions.entry(handle.session_id.clone()) {
            entry.get_mut().remove(&handle.channel_id);
            if entry.get().is_empty() {
                let _ = entry.remove();
            }
        }
        tracing::debug!(
            session_id = %handle.session_id,
            channel_id = %handle.channel_id,
            "channel deregistered"
        );
    }

    /// Best-effort fan-out of `event` to every channel currently open
    /// under `session_id`. Publishing to a session with no listeners is a
    /// silent no-op. A push failure is logged and skipped; the failed
    /// channel stays registered until its own disconnect path fires.
    pub fn publish(&self, session_id: &SessionId, event: CallbackEvent) {
        let Some(channels) = self.sessions.get(session_id) else {
            return;
        };
        let Some(json) = serialize(event) else {
            return;
        };

        for (channel_id, tx) in channels.iter() {
            if let Err(err) = tx.try_send(json.clone()) {
                tracing::warn!(
                    session_id = %session_id,
                    channel_id = %channel_id,
                    error = %err,
                    "failed to push callback event"
                );
            }
        }
    }

    /// Whether any channel is open under `session_id`.
    pub fn has_session(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of sessions with at least one open channel.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn serialize(event: CallbackEvent) -> Option<String> {
    match serde_json::to_string(&event.stamp()) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize callback event");
            None
        }
    }
}
