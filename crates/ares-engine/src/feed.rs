//! Change broadcasts for "choose an existing entity" options.
//!
//! Each engine owns a [`ChangeFeed`]. Subscribers get the current sorted
//! name list right away and a fresh list after every structural change;
//! the dispatcher drains its receivers after each command.

use std::sync::mpsc::{self, Receiver, Sender};

/// Receiving end of a change subscription.
pub type ChoiceReceiver = Receiver<Vec<String>>;

/// An observer list of name-list subscribers.
#[derive(Debug)]
pub struct ChangeFeed {
    topic: &'static str,
    subscribers: Vec<Sender<Vec<String>>>,
}

impl ChangeFeed {
    /// Create a feed; `topic` only labels log events.
    pub fn new(topic: &'static str) -> Self {
        Self {
            topic,
            subscribers: Vec::new(),
        }
    }

    /// Subscribe, immediately receiving `current`.
    pub fn subscribe(&mut self, current: Vec<String>) -> ChoiceReceiver {
        let (tx, rx) = mpsc::channel();
        // The receiver is still in scope, so this send cannot fail.
        let _ = tx.send(current);
        self.subscribers.push(tx);
        rx
    }

    /// Send `names` to every live subscriber, dropping disconnected ones.
    pub fn broadcast(&mut self, names: Vec<String>) {
        self.subscribers.retain(|tx| tx.send(names.clone()).is_ok());
        tracing::debug!(
            topic = self.topic,
            subscribers = self.subscribers.len(),
            names = names.len(),
            "choices changed"
        );
    }
}

/// Drain a receiver, keeping only the newest list.
pub fn latest(rx: &ChoiceReceiver) -> Option<Vec<String>> {
    rx.try_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_gets_current_names() {
        let mut feed = ChangeFeed::new("test");
        let rx = feed.subscribe(vec!["a".to_string()]);
        assert_eq!(latest(&rx), Some(vec!["a".to_string()]));
        assert_eq!(latest(&rx), None);
    }

    #[test]
    fn broadcast_reaches_all_subscribers() {
        let mut feed = ChangeFeed::new("test");
        let rx1 = feed.subscribe(Vec::new());
        let rx2 = feed.subscribe(Vec::new());
        feed.broadcast(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(latest(&rx1), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(latest(&rx2), Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut feed = ChangeFeed::new("test");
        let rx = feed.subscribe(Vec::new());
        drop(rx);
        let keep = feed.subscribe(Vec::new());
        feed.broadcast(vec!["z".to_string()]);
        assert_eq!(feed.subscribers.len(), 1);
        assert_eq!(latest(&keep), Some(vec!["z".to_string()]));
    }
}
