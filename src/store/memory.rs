//! Concurrent record store with JSON snapshot persistence.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::security::like::like_match;
use crate::store::models::{
    ContactMessage, MessageStatus, NewContactMessage, Reply, ReplyDirection, Subscriber,
};
use crate::store::StoreError;

/// On-disk form of the whole store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    messages: Vec<ContactMessage>,
    replies: Vec<Reply>,
    subscribers: Vec<Subscriber>,
}

/// Counts for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total_messages: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub total_replies: usize,
    pub subscribers: usize,
}

/// Thread-safe store for messages, replies and subscribers.
///
/// Clones share the same maps.
#[derive(Clone, Default)]
pub struct MessageStore {
    messages: Arc<DashMap<Uuid, ContactMessage>>,
    replies: Arc<DashMap<Uuid, Vec<Reply>>>,
    subscribers: Arc<DashMap<String, Subscriber>>,
    persistence_path: Option<PathBuf>,
    flush_lock: Arc<tokio::sync::Mutex<()>>,
}

impl MessageStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from `path` if it exists; later writes go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            for message in snapshot.messages {
                store.messages.insert(message.id, message);
            }
            for reply in snapshot.replies {
                store.replies.entry(reply.message_id).or_default().push(reply);
            }
            for subscriber in snapshot.subscribers {
                store.subscribers.insert(subscriber.email.clone(), subscriber);
            }
            tracing::info!(
                messages = store.messages.len(),
                subscribers = store.subscribers.len(),
                "Loaded records from snapshot"
            );
        }
        Ok(store)
    }

    fn snapshot(&self) -> Snapshot {
        let mut messages: Vec<_> = self.messages.iter().map(|r| r.value().clone()).collect();
        messages.sort_by_key(|m| m.created_at);
        let mut replies: Vec<_> = self
            .replies
            .iter()
            .flat_map(|r| r.value().clone())
            .collect();
        replies.sort_by_key(|r| r.created_at);
        let mut subscribers: Vec<_> = self.subscribers.iter().map(|r| r.value().clone()).collect();
        subscribers.sort_by_key(|s| s.created_at);

        Snapshot {
            messages,
            replies,
            subscribers,
        }
    }

    /// Write the snapshot to disk. Writes a temp file and renames it so a
    /// crash never leaves a truncated snapshot.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let snapshot = self.snapshot();

        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;

        tracing::debug!(
            path = %path.display(),
            messages = snapshot.messages.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Persist after a mutation. Concurrent flushes are serialized.
    pub async fn flush(&self) -> Result<(), StoreError> {
        if self.persistence_path.is_none() {
            return Ok(());
        }
        let _guard = self.flush_lock.lock().await;
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save_to_file()).await?
    }

    /// Store a validated submission with `status = new`.
    pub fn insert_message(&self, new: NewContactMessage) -> ContactMessage {
        let message = new.into_message();
        self.messages.insert(message.id, message.clone());
        message
    }

    pub fn get_message(&self, id: &Uuid) -> Option<ContactMessage> {
        self.messages.get(id).map(|r| r.value().clone())
    }

    /// Newest first, optionally filtered by status.
    pub fn list_messages(&self, status: Option<MessageStatus>, limit: usize) -> Vec<ContactMessage> {
        let mut messages: Vec<_> = self
            .messages
            .iter()
            .filter(|r| status.map_or(true, |s| r.value().status == s))
            .map(|r| r.value().clone())
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages.truncate(limit);
        messages
    }

    pub fn update_status(&self, id: &Uuid, status: MessageStatus) -> Option<ContactMessage> {
        let mut entry = self.messages.get_mut(id)?;
        entry.status = status;
        entry.updated_at = Utc::now();
        Some(entry.clone())
    }

    /// Latest message from `sender` whose subject matches `subject_pattern`
    /// under `ILIKE` semantics. The pattern must already be escaped.
    pub fn find_thread(&self, sender: &str, subject_pattern: &str) -> Option<ContactMessage> {
        self.messages
            .iter()
            .filter(|r| r.value().email.eq_ignore_ascii_case(sender))
            .filter(|r| like_match(subject_pattern, &r.value().subject, true))
            .max_by_key(|r| r.value().created_at)
            .map(|r| r.value().clone())
    }

    /// Latest message from `sender`, any subject.
    pub fn latest_from(&self, sender: &str) -> Option<ContactMessage> {
        self.messages
            .iter()
            .filter(|r| r.value().email.eq_ignore_ascii_case(sender))
            .max_by_key(|r| r.value().created_at)
            .map(|r| r.value().clone())
    }

    /// Append a reply to a thread. An inbound reply re-opens a thread that
    /// was already answered or archived.
    pub fn add_reply(
        &self,
        message_id: Uuid,
        direction: ReplyDirection,
        from_email: String,
        subject: String,
        body: String,
    ) -> Result<Reply, StoreError> {
        {
            let mut message = self
                .messages
                .get_mut(&message_id)
                .ok_or(StoreError::NotFound(message_id))?;
            if direction == ReplyDirection::Inbound
                && matches!(message.status, MessageStatus::Replied | MessageStatus::Archived)
            {
                message.status = MessageStatus::New;
            }
            message.updated_at = Utc::now();
        }

        let reply = Reply {
            id: Uuid::new_v4(),
            message_id,
            direction,
            from_email,
            subject,
            body,
            created_at: Utc::now(),
        };
        self.replies.entry(message_id).or_default().push(reply.clone());
        Ok(reply)
    }

    pub fn replies_for(&self, message_id: &Uuid) -> Vec<Reply> {
        self.replies
            .get(message_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Add a subscriber keyed by lower-cased email. Returns the record and
    /// whether it was newly created.
    pub fn subscribe(&self, email: &str, name: Option<String>) -> (Subscriber, bool) {
        match self.subscribers.entry(email.to_lowercase()) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                let subscriber = Subscriber {
                    id: Uuid::new_v4(),
                    email: slot.key().clone(),
                    name,
                    created_at: Utc::now(),
                };
                slot.insert(subscriber.clone());
                (subscriber, true)
            }
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn summary(&self) -> StoreSummary {
        let mut by_status: BTreeMap<&'static str, usize> =
            MessageStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for r in self.messages.iter() {
            *by_status.entry(r.value().status.as_str()).or_default() += 1;
        }

        StoreSummary {
            total_messages: self.messages.len(),
            by_status,
            total_replies: self.replies.iter().map(|r| r.value().len()).sum(),
            subscribers: self.subscribers.len(),
        }
    }
}
