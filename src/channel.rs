//! Channel struct definition
//!
//! A named multi-member group with membership, operator and invitation
//! sets plus the mode state (invite-only, topic lock, key, limit).
//! Members are tracked by `ConnId` handles; the registry owns the
//! clients themselves.

use std::collections::{HashMap, HashSet};

use crate::client::Client;
use crate::types::ConnId;

/// Chat channel
///
/// Authorization is the dispatcher's job: the mode setters apply
/// whatever the caller decided, clamping nothing except the limit.
#[derive(Debug)]
pub struct Channel {
    /// Channel name, including the `#` sigil
    pub name: String,
    /// Current topic (empty = unset)
    topic: String,
    /// Join key (empty = no key)
    key: String,
    /// Member limit (0 = unlimited)
    limit: usize,
    /// Only invited clients may join
    invite_only: bool,
    /// Only operators may change the topic
    topic_restricted: bool,
    /// Current members
    members: HashSet<ConnId>,
    /// Operator subset of the members
    operators: HashSet<ConnId>,
    /// Invitations pending consumption by a join
    invited: HashSet<ConnId>,
}

impl Channel {
    pub fn new(name: String) -> Self {
        Self {
            name,
            topic: String::new(),
            key: String::new(),
            limit: 0,
            invite_only: false,
            topic_restricted: false,
            members: HashSet::new(),
            operators: HashSet::new(),
            invited: HashSet::new(),
        }
    }

    /// Add a member (idempotent)
    ///
    /// Consumes any pending invitation. The first member to enter while
    /// the operator set is empty becomes an operator.
    pub fn add_member(&mut self, id: ConnId) {
        if self.members.contains(&id) {
            return;
        }
        self.members.insert(id);
        self.invited.remove(&id);
        if self.operators.is_empty() {
            self.operators.insert(id);
        }
    }

    /// Remove a member, dropping operator status as well
    pub fn remove_member(&mut self, id: ConnId) {
        self.members.remove(&id);
        self.operators.remove(&id);
    }

    pub fn has_member(&self, id: ConnId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members in unspecified order
    pub fn members(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.members.iter().copied()
    }

    pub fn add_operator(&mut self, id: ConnId) {
        self.operators.insert(id);
    }

    pub fn remove_operator(&mut self, id: ConnId) {
        self.operators.remove(&id);
    }

    pub fn is_operator(&self, id: ConnId) -> bool {
        self.operators.contains(&id)
    }

    pub fn invite(&mut self, id: ConnId) {
        self.invited.insert(id);
    }

    pub fn is_invited(&self, id: ConnId) -> bool {
        self.invited.contains(&id)
    }

    pub fn clear_invitation(&mut self, id: ConnId) {
        self.invited.remove(&id);
    }

    /// Purge a connection from every set (disconnect path)
    pub fn purge(&mut self, id: ConnId) {
        self.members.remove(&id);
        self.operators.remove(&id);
        self.invited.remove(&id);
    }

    /// Member limit reached?
    pub fn is_full(&self) -> bool {
        self.limit != 0 && self.members.len() >= self.limit
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: String) {
        self.topic = topic;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: String) {
        self.key = key;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    pub fn is_invite_only(&self) -> bool {
        self.invite_only
    }

    pub fn set_invite_only(&mut self, v: bool) {
        self.invite_only = v;
    }

    pub fn is_topic_restricted(&self) -> bool {
        self.topic_restricted
    }

    pub fn set_topic_restricted(&mut self, v: bool) {
        self.topic_restricted = v;
    }

    /// Enqueue a line to every member except the sender
    ///
    /// `sender` is `None` for lines every member should see.
    pub fn broadcast(
        &self,
        clients: &HashMap<ConnId, Client>,
        sender: Option<ConnId>,
        line: &str,
    ) {
        for id in &self.members {
            if Some(*id) == sender {
                continue;
            }
            if let Some(client) = clients.get(id) {
                let _ = client.send(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_client(clients: &mut HashMap<ConnId, Client>) -> (ConnId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnId::next();
        clients.insert(id, Client::new(id, tx));
        (id, rx)
    }

    #[test]
    fn test_first_member_becomes_operator() {
        let mut chan = Channel::new("#test".to_string());
        let first = ConnId::next();
        let second = ConnId::next();

        chan.add_member(first);
        chan.add_member(second);

        assert!(chan.is_operator(first));
        assert!(!chan.is_operator(second));
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut chan = Channel::new("#test".to_string());
        let id = ConnId::next();

        chan.add_member(id);
        chan.add_member(id);

        assert_eq!(chan.member_count(), 1);
    }

    #[test]
    fn test_join_consumes_invitation() {
        let mut chan = Channel::new("#test".to_string());
        let id = ConnId::next();

        chan.invite(id);
        assert!(chan.is_invited(id));

        chan.add_member(id);
        assert!(!chan.is_invited(id));
    }

    #[test]
    fn test_operators_are_subset_of_members() {
        let mut chan = Channel::new("#test".to_string());
        let a = ConnId::next();
        let b = ConnId::next();

        chan.add_member(a);
        chan.add_member(b);
        chan.add_operator(b);
        chan.remove_member(a);
        chan.remove_member(b);

        // removal clears operator status with membership
        assert!(!chan.is_operator(a));
        assert!(!chan.is_operator(b));
        assert!(chan.is_empty());
    }

    #[test]
    fn test_limit() {
        let mut chan = Channel::new("#test".to_string());
        assert!(!chan.is_full()); // 0 = unlimited

        chan.set_limit(1);
        chan.add_member(ConnId::next());
        assert!(chan.is_full());
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let mut clients = HashMap::new();
        let (alice, mut alice_rx) = make_client(&mut clients);
        let (bob, mut bob_rx) = make_client(&mut clients);

        let mut chan = Channel::new("#test".to_string());
        chan.add_member(alice);
        chan.add_member(bob);

        chan.broadcast(&clients, Some(alice), ":alice PRIVMSG #test :hi");
        assert!(alice_rx.try_recv().is_err());
        assert_eq!(bob_rx.try_recv().unwrap(), ":alice PRIVMSG #test :hi");

        chan.broadcast(&clients, None, ":alice TOPIC #test :t");
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_ok());
    }

    #[test]
    fn test_purge_clears_all_sets() {
        let mut chan = Channel::new("#test".to_string());
        let a = ConnId::next();
        let b = ConnId::next();

        chan.add_member(a);
        chan.add_operator(a);
        chan.invite(b);
        chan.purge(a);
        chan.purge(b);

        assert!(!chan.has_member(a));
        assert!(!chan.is_operator(a));
        assert!(!chan.is_invited(b));
    }
}
