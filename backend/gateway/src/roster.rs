//! Connected clients of one session.
//!
//! Tracks each connection's display name and outbound channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crossgrid_core::truncate_name;

/// Opaque per-connection identity, unique for the process lifetime.
pub type ClientId = u64;

/// Serialized frames queued for one connection.
pub type ClientSender = mpsc::UnboundedSender<Arc<str>>;

struct Participant {
    name: String,
    sender: ClientSender,
}

/// What happened when a client left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The roster is now empty and the session can be unloaded.
    pub now_empty: bool,
    /// The client had a display name, so the others should hear about it.
    pub was_named: bool,
}

/// Ordered by connection id, so names are listed in join order.
#[derive(Default)]
pub struct Roster {
    clients: BTreeMap<ClientId, Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client with an empty (anonymous) display name.
    pub fn register(&mut self, client: ClientId, sender: ClientSender) {
        self.clients.insert(
            client,
            Participant {
                name: String::new(),
                sender,
            },
        );
    }

    /// Returns `true` if the name actually changed.
    pub fn set_name(&mut self, client: ClientId, name: &str) -> bool {
        let Some(participant) = self.clients.get_mut(&client) else {
            return false;
        };
        let name = truncate_name(name);
        if participant.name == name {
            return false;
        }
        participant.name = name;
        true
    }

    /// Remove a client; `None` if it was not registered.
    pub fn drop_client(&mut self, client: ClientId) -> Option<Departure> {
        let participant = self.clients.remove(&client)?;
        Some(Departure {
            now_empty: self.clients.is_empty(),
            was_named: !participant.name.is_empty(),
        })
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.contains_key(&client)
    }

    /// Display name of a registered client; empty while anonymous.
    pub fn name(&self, client: ClientId) -> Option<&str> {
        self.clients.get(&client).map(|p| p.name.as_str())
    }

    /// Display names in connection order, anonymous ones included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.values().map(|p| p.name.as_str())
    }

    /// Queue a frame for one client. A closed channel means the connection
    /// is already tearing down and its leave event is on the way.
    pub fn send_to(&self, client: ClientId, frame: Arc<str>) -> bool {
        match self.clients.get(&client) {
            Some(p) => p.sender.send(frame).is_ok(),
            None => false,
        }
    }

    /// Queue a frame for every client.
    pub fn send_all(&self, frame: Arc<str>) {
        for participant in self.clients.values() {
            let _ = participant.sender.send(frame.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (ClientSender, mpsc::UnboundedReceiver<Arc<str>>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn names_follow_connection_order() {
        let mut roster = Roster::new();
        let (tx, _rx) = channel();
        roster.register(7, tx.clone());
        roster.register(3, tx.clone());
        roster.register(9, tx);
        roster.set_name(9, "zed");
        roster.set_name(3, "ann");

        let names: Vec<_> = roster.names().collect();
        assert_eq!(names, vec!["ann", "", "zed"]);
    }

    #[test]
    fn set_name_reports_changes_only() {
        let mut roster = Roster::new();
        let (tx, _rx) = channel();
        roster.register(1, tx);
        assert!(!roster.set_name(1, ""));
        assert!(roster.set_name(1, "bob"));
        assert!(!roster.set_name(1, "bob"));
        assert!(!roster.set_name(2, "ghost"));
    }

    #[test]
    fn name_lookup_distinguishes_anonymous_and_unknown() {
        let mut roster = Roster::new();
        let (tx, _rx) = channel();
        roster.register(1, tx);
        assert_eq!(roster.name(1), Some(""));
        roster.set_name(1, "bob");
        assert_eq!(roster.name(1), Some("bob"));
        assert_eq!(roster.name(2), None);
    }

    #[test]
    fn long_names_are_truncated() {
        let mut roster = Roster::new();
        let (tx, _rx) = channel();
        roster.register(1, tx);
        roster.set_name(1, &"x".repeat(300));
        assert_eq!(roster.names().next().unwrap().len(), 255);
    }

    #[test]
    fn departures_report_emptiness_and_names() {
        let mut roster = Roster::new();
        let (tx, _rx) = channel();
        roster.register(1, tx.clone());
        roster.register(2, tx);
        roster.set_name(1, "bob");

        assert_eq!(
            roster.drop_client(2),
            Some(Departure { now_empty: false, was_named: false })
        );
        assert_eq!(
            roster.drop_client(1),
            Some(Departure { now_empty: true, was_named: true })
        );
        assert_eq!(roster.drop_client(1), None);
    }

    #[test]
    fn send_all_reaches_every_client() {
        let mut roster = Roster::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        roster.register(1, tx_a);
        roster.register(2, tx_b);

        roster.send_all(Arc::from("hello"));
        assert_eq!(&*rx_a.try_recv().unwrap(), "hello");
        assert_eq!(&*rx_b.try_recv().unwrap(), "hello");

        assert!(roster.send_to(2, Arc::from("only-b")));
        assert!(rx_a.try_recv().is_err());
        assert_eq!(&*rx_b.try_recv().unwrap(), "only-b");
    }
}
