use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub sender: Sender,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_messages: usize,
    pub unique_sessions: usize,
    pub fallback_rate: f64,
    pub recent_logs: Vec<Interaction>,
}

/// Bounded in-memory record of the conversation, newest last.
pub struct InteractionLog {
    capacity: usize,
    entries: Mutex<VecDeque<Interaction>>,
}

impl InteractionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, session_id: &str, sender: Sender, message: &str, intent: Option<&str>) {
        let interaction = Interaction {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            sender,
            message: message.to_string(),
            intent: intent.map(str::to_string),
        };
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(interaction);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Counts over everything retained; `recent_logs` is newest first.
    pub fn stats(&self) -> Stats {
        let entries = self.entries.lock();
        let total_messages = entries.len();
        let unique_sessions = entries
            .iter()
            .map(|e| e.session_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let fallback_count = entries
            .iter()
            .filter(|e| matches!(e.intent.as_deref(), Some("fallback") | Some("unknown")))
            .count();
        let fallback_rate = if total_messages == 0 {
            0.0
        } else {
            (fallback_count as f64 / total_messages as f64 * 10_000.0).round() / 100.0
        };

        Stats {
            total_messages,
            unique_sessions,
            fallback_rate,
            recent_logs: entries.iter().rev().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let log = InteractionLog::new(10);
        let stats = log.stats();
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.unique_sessions, 0);
        assert_eq!(stats.fallback_rate, 0.0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_stats_count_sessions_and_fallbacks() {
        let log = InteractionLog::new(10);
        log.record("a", Sender::User, "hi", None);
        log.record("a", Sender::Bot, "Hello!", Some("hello"));
        log.record("b", Sender::User, "qwerty", None);
        log.record("b", Sender::Bot, "Sorry?", Some("fallback"));
        log.record("c", Sender::User, "asdf", None);
        log.record("c", Sender::Bot, "Sorry?", Some("unknown"));

        let stats = log.stats();
        assert_eq!(stats.total_messages, 6);
        assert_eq!(stats.unique_sessions, 3);
        assert_eq!(stats.fallback_rate, 33.33);
        assert_eq!(stats.recent_logs[0].message, "Sorry?");
        assert_eq!(stats.recent_logs[0].session_id, "c");
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let log = InteractionLog::new(2);
        log.record("a", Sender::User, "one", None);
        log.record("a", Sender::User, "two", None);
        log.record("a", Sender::User, "three", None);

        assert_eq!(log.len(), 2);
        let messages: Vec<_> = log.stats().recent_logs.into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["three", "two"]);
    }

    #[test]
    fn test_serializes_sender_lowercase() {
        let log = InteractionLog::new(1);
        log.record("a", Sender::Bot, "hi", Some("hello"));
        let value = serde_json::to_value(log.stats()).unwrap();
        assert_eq!(value["recent_logs"][0]["sender"], "bot");
        assert_eq!(value["recent_logs"][0]["intent"], "hello");
    }
}
