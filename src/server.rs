//! Server actor implementation
//!
//! The central actor owning all state: clients, channels, and the shared
//! password. Command handlers run to completion one at a time on the
//! actor task, so no locking is needed anywhere in the state model.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::client::Client;
use crate::message::{self, Command, Reply};
use crate::types::{is_channel_name, ConnId};

/// Commands sent from connection handlers to the server actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted
    Connect {
        id: ConnId,
        sender: mpsc::UnboundedSender<String>,
    },
    /// Connection closed (peer disconnect or transport error)
    Disconnect { id: ConnId },
    /// One parsed protocol line from a connection
    Incoming { id: ConnId, command: Command },
}

/// The server actor: registry plus command dispatcher
///
/// Owns every client and channel. Handlers mutate state synchronously
/// and enqueue outbound lines on the target clients' queues.
pub struct Server {
    /// All connected clients: ConnId -> Client
    clients: HashMap<ConnId, Client>,
    /// All channels with at least one member: name -> Channel
    channels: HashMap<String, Channel>,
    /// Shared connection password
    password: String,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl Server {
    /// Create a new server actor with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, password: String) -> Self {
        Self {
            clients: HashMap::new(),
            channels: HashMap::new(),
            password,
            receiver,
        }
    }

    /// Run the server event loop
    ///
    /// Processes commands until all senders are dropped (shutdown).
    pub async fn run(mut self) {
        info!("server actor started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("server actor shutting down");
    }

    /// Process a single command, run to completion
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { id, sender } => self.handle_connect(id, sender),
            ServerCommand::Disconnect { id } => self.handle_disconnect(id),
            ServerCommand::Incoming { id, command } => self.dispatch(id, command),
        }
    }

    fn dispatch(&mut self, id: ConnId, command: Command) {
        debug!("client {} -> {:?}", id, command);
        match command {
            Command::Pass { password } => self.handle_pass(id, password),
            Command::Nick { nickname } => self.handle_nick(id, nickname),
            Command::User { username } => self.handle_user(id, username),
            Command::Join { channel, key } => self.handle_join(id, channel, key),
            Command::Privmsg { target, text } => self.handle_privmsg(id, target, text),
            Command::Notice { target, text } => self.handle_notice(id, target, text),
            Command::Kick { channel, nick } => self.handle_kick(id, channel, nick),
            Command::Invite { channel, nick } => self.handle_invite(id, channel, nick),
            Command::Topic { channel, topic } => self.handle_topic(id, channel, topic),
            Command::Mode { channel, modes, param } => self.handle_mode(id, channel, modes, param),
            Command::Ping { token } => self.handle_ping(id, token),
            Command::Cap { sub, rest } => self.handle_cap(id, sub, rest),
            Command::Who { mask } => self.handle_who(id, mask),
            Command::Names { channels } => self.handle_names(id, channels),
            Command::Quit { message } => self.handle_quit(id, message),
            Command::Unknown { verb } => {
                warn!("client {}: unknown command {}", id, verb);
            }
        }
    }

    // ── connection lifecycle ─────────────────────────────────────

    fn handle_connect(&mut self, id: ConnId, sender: mpsc::UnboundedSender<String>) {
        info!("client {} connected", id);
        self.clients.insert(id, Client::new(id, sender));
        debug!(
            "total clients: {}, total channels: {}",
            self.clients.len(),
            self.channels.len()
        );
    }

    /// Transport-level teardown: no QUIT broadcast
    fn handle_disconnect(&mut self, id: ConnId) {
        if !self.clients.contains_key(&id) {
            // already torn down by QUIT
            return;
        }
        info!("client {} disconnected", id);
        self.remove_connection(id);
    }

    /// Drop the client and purge it from every channel set; channels
    /// left without members are destroyed immediately.
    fn remove_connection(&mut self, id: ConnId) {
        self.clients.remove(&id);
        self.channels.retain(|_, chan| {
            chan.purge(id);
            !chan.is_empty()
        });
        debug!(
            "total clients: {}, total channels: {}",
            self.clients.len(),
            self.channels.len()
        );
    }

    // ── registration ─────────────────────────────────────────────

    /// Shared registration gate, invoked after PASS, NICK and USER
    ///
    /// Fires at most once per connection; later NICK/USER commands
    /// update the stored identity without re-emitting the welcome.
    fn try_register(&mut self, id: ConnId) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        if !client.pass_ok || !client.has_identity() || client.registered {
            return;
        }
        client.registered = true;
        client.authenticated = true;
        let nick = client.nickname.clone();
        info!("client {} registered as {}", id, nick);
        self.send_to(id, Reply::Welcome { nick });
    }

    fn handle_pass(&mut self, id: ConnId, password: String) {
        if password == self.password {
            if let Some(client) = self.clients.get_mut(&id) {
                client.pass_ok = true;
            }
            self.try_register(id);
        } else {
            self.send_to(id, Reply::PasswdMismatch);
        }
    }

    fn handle_nick(&mut self, id: ConnId, nickname: String) {
        if nickname.is_empty() {
            self.send_to(id, Reply::NoNicknameGiven);
            return;
        }
        if let Some(client) = self.clients.get_mut(&id) {
            client.set_nickname(nickname);
        }
        self.try_register(id);
    }

    fn handle_user(&mut self, id: ConnId, username: String) {
        if username.is_empty() {
            self.send_to(id, Reply::NeedMoreParams { command: "USER".into() });
            return;
        }
        if let Some(client) = self.clients.get_mut(&id) {
            client.set_username(username);
        }
        self.try_register(id);
    }

    // ── channel commands ─────────────────────────────────────────

    fn handle_join(&mut self, id: ConnId, channel: String, key: String) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        if !client.authenticated {
            self.send_to(id, Reply::NotRegistered);
            return;
        }
        if !is_channel_name(&channel) {
            self.send_to(id, Reply::NoSuchChannel { channel });
            return;
        }
        let nick = client.display_nick().to_string();

        // access checks only apply to channels that already exist; a
        // freshly named channel has no modes to reject anyone with
        if let Some(chan) = self.channels.get(&channel) {
            if chan.is_invite_only() && !chan.is_invited(id) && !chan.is_operator(id) {
                self.send_to(id, Reply::InviteOnlyChan { channel });
                return;
            }
            if chan.is_full() {
                self.send_to(id, Reply::ChannelIsFull { channel });
                return;
            }
            if !chan.key().is_empty() && key != chan.key() {
                self.send_to(id, Reply::BadChannelKey { channel });
                return;
            }
        }

        let chan = self
            .channels
            .entry(channel.clone())
            .or_insert_with(|| Channel::new(channel.clone()));
        chan.add_member(id);
        debug!("client {} joined {}", id, channel);

        // announce to every member, the joiner included
        chan.broadcast(&self.clients, None, &message::join_line(&nick, &channel));
        let topic = chan.topic().to_string();

        if !topic.is_empty() {
            self.send_to(id, Reply::TopicIs { channel: channel.clone(), topic });
        }
        self.send_names(id, &channel);
    }

    fn handle_privmsg(&mut self, id: ConnId, target: String, text: String) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        if !client.authenticated {
            self.send_to(id, Reply::NotRegistered);
            return;
        }
        let nick = client.display_nick().to_string();

        if is_channel_name(&target) {
            match self.channels.get(&target) {
                Some(chan) if chan.has_member(id) => {
                    chan.broadcast(
                        &self.clients,
                        Some(id),
                        &message::privmsg_line(&nick, &target, &text),
                    );
                }
                _ => self.send_to(id, Reply::NoSuchNick { target }),
            }
        } else {
            match self.client_by_nick(&target) {
                Some(peer) => {
                    self.send_line(peer, message::privmsg_line(&nick, &target, &text));
                }
                None => self.send_to(id, Reply::NoSuchNick { target }),
            }
        }
    }

    /// NOTICE is fire-and-forget: no registration requirement and no
    /// error replies on any failure.
    fn handle_notice(&mut self, id: ConnId, target: String, text: String) {
        if target.is_empty() || text.is_empty() {
            return;
        }
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        let nick = client.display_nick().to_string();

        if is_channel_name(&target) {
            if let Some(chan) = self.channels.get(&target) {
                if chan.has_member(id) {
                    chan.broadcast(
                        &self.clients,
                        Some(id),
                        &message::notice_line(&nick, &target, &text),
                    );
                }
            }
        } else if let Some(peer) = self.client_by_nick(&target) {
            self.send_line(peer, message::notice_line(&nick, &target, &text));
        }
    }

    fn handle_kick(&mut self, id: ConnId, channel: String, nick: String) {
        if channel.is_empty() || nick.is_empty() {
            self.send_to(id, Reply::NeedMoreParams { command: "KICK".into() });
            return;
        }
        if !self.channels.contains_key(&channel) {
            self.send_to(id, Reply::NoSuchChannel { channel });
            return;
        }
        let chan = &self.channels[&channel];
        if !chan.has_member(id) || !chan.is_operator(id) {
            self.send_to(id, Reply::ChanOpPrivsNeeded { channel });
            return;
        }
        let target = self.client_by_nick(&nick);
        let target = match target {
            Some(t) if self.channels[&channel].has_member(t) => t,
            _ => {
                self.send_to(id, Reply::UserNotInChannel { nick, channel });
                return;
            }
        };

        let actor_nick = self.display_nick_of(id);
        let line = message::kick_line(&actor_nick, &channel, &nick);
        debug!("client {} kicked {} from {}", id, nick, channel);

        let Some(chan) = self.channels.get_mut(&channel) else {
            return;
        };
        chan.remove_member(target);
        // remaining members and the kicked client all see the KICK
        chan.broadcast(&self.clients, None, &line);
        self.send_line(target, line);
    }

    fn handle_invite(&mut self, id: ConnId, channel: String, nick: String) {
        let is_op = self
            .channels
            .get(&channel)
            .is_some_and(|chan| chan.is_operator(id));
        if !is_op {
            self.send_to(id, Reply::ChanOpPrivsNeeded { channel });
            return;
        }
        let Some(target) = self.client_by_nick(&nick) else {
            self.send_to(id, Reply::NoSuchNick { target: nick });
            return;
        };

        let actor_nick = self.display_nick_of(id);
        if let Some(chan) = self.channels.get_mut(&channel) {
            chan.invite(target);
        }
        debug!("client {} invited {} to {}", id, nick, channel);
        self.send_line(target, message::invite_line(&actor_nick, &nick, &channel));
    }

    fn handle_topic(&mut self, id: ConnId, channel: String, topic: String) {
        let Some(chan) = self.channels.get(&channel) else {
            self.send_to(id, Reply::NoSuchChannel { channel });
            return;
        };

        if topic.is_empty() {
            // query: never rejected, even on topic-restricted channels
            let reply = if chan.topic().is_empty() {
                Reply::NoTopic { channel }
            } else {
                Reply::TopicIs { channel, topic: chan.topic().to_string() }
            };
            self.send_to(id, reply);
            return;
        }

        if chan.is_topic_restricted() && !chan.is_operator(id) {
            self.send_to(id, Reply::ChanOpPrivsNeeded { channel });
            return;
        }

        let nick = self.display_nick_of(id);
        let Some(chan) = self.channels.get_mut(&channel) else {
            return;
        };
        chan.set_topic(topic.clone());
        chan.broadcast(&self.clients, None, &message::topic_line(&nick, &channel, &topic));
    }

    fn handle_mode(&mut self, id: ConnId, channel: String, modes: String, param: String) {
        let Some(chan) = self.channels.get(&channel) else {
            self.send_to(id, Reply::NoSuchChannel { channel });
            return;
        };
        if !chan.is_operator(id) {
            self.send_to(id, Reply::ChanOpPrivsNeeded { channel });
            return;
        }

        let nick = self.display_nick_of(id);
        // the one parameter token serves whichever letter consumes it;
        // an operator grant only resolves to a current channel member
        let param_target = self
            .client_by_nick(&param)
            .filter(|t| self.channels[&channel].has_member(*t));

        let Some(chan) = self.channels.get_mut(&channel) else {
            return;
        };
        let mut grant = true;
        for c in modes.chars() {
            match c {
                '+' => grant = true,
                '-' => grant = false,
                'i' => chan.set_invite_only(grant),
                't' => chan.set_topic_restricted(grant),
                'l' => {
                    let limit = if grant {
                        param.parse::<i64>().unwrap_or(0).max(0) as usize
                    } else {
                        0
                    };
                    chan.set_limit(limit);
                }
                'k' => {
                    let key = if grant { param.clone() } else { String::new() };
                    chan.set_key(key);
                }
                'o' => {
                    if let Some(target) = param_target {
                        if grant {
                            chan.add_operator(target);
                        } else {
                            chan.remove_operator(target);
                        }
                    }
                }
                _ => {}
            }
        }

        chan.broadcast(
            &self.clients,
            None,
            &message::mode_line(&nick, &channel, &modes, &param),
        );
    }

    // ── connection-level commands ────────────────────────────────

    fn handle_ping(&mut self, id: ConnId, token: String) {
        let token = if token.is_empty() { "ping".to_string() } else { token };
        self.send_to(id, Reply::Pong { token });
    }

    fn handle_cap(&mut self, id: ConnId, sub: String, rest: String) {
        match sub.as_str() {
            "LS" => self.send_to(id, Reply::Cap { sub: "LS", caps: String::new() }),
            "LIST" => self.send_to(id, Reply::Cap { sub: "LIST", caps: String::new() }),
            "REQ" => self.send_to(id, Reply::Cap { sub: "NAK", caps: rest }),
            "END" => {}
            _ => self.send_to(id, Reply::Cap { sub: "NAK", caps: String::new() }),
        }
    }

    fn handle_who(&mut self, id: ConnId, mask: String) {
        let me = self.reply_nick(id);
        let end_mask = if mask.is_empty() { "*".to_string() } else { mask.clone() };

        if is_channel_name(&mask) {
            if let Some(chan) = self.channels.get(&mask) {
                for member in chan.members() {
                    let Some(client) = self.clients.get(&member) else {
                        continue;
                    };
                    let username = if client.username.is_empty() {
                        "user".to_string()
                    } else {
                        client.username.clone()
                    };
                    self.send_to(
                        id,
                        Reply::WhoEntry {
                            nick: me.clone(),
                            mask: mask.clone(),
                            username,
                            entry_nick: client.display_nick().to_string(),
                            op: chan.is_operator(member),
                        },
                    );
                }
            }
        } else if !mask.is_empty() {
            if let Some(client) = self.client_by_nick(&mask).and_then(|peer| self.clients.get(&peer)) {
                let username = if client.username.is_empty() {
                    "user".to_string()
                } else {
                    client.username.clone()
                };
                self.send_to(
                    id,
                    Reply::WhoEntry {
                        nick: me.clone(),
                        mask: "*".to_string(),
                        username,
                        entry_nick: client.display_nick().to_string(),
                        op: false,
                    },
                );
            }
        }
        self.send_to(id, Reply::EndOfWho { nick: me, mask: end_mask });
    }

    fn handle_names(&mut self, id: ConnId, channels: String) {
        if channels.is_empty() {
            let nick = self.reply_nick(id);
            self.send_to(id, Reply::EndOfNames { nick, channel: "*".to_string() });
            return;
        }
        for chan_name in channels.split(',') {
            if is_channel_name(chan_name) {
                self.send_names(id, chan_name);
            }
        }
    }

    fn handle_quit(&mut self, id: ConnId, message: String) {
        let Some(client) = self.clients.get(&id) else {
            return;
        };
        let nick = client.display_nick().to_string();
        let text = if message.is_empty() { "Client Quit".to_string() } else { message };
        let line = message::quit_line(&nick, &text);

        for chan in self.channels.values_mut() {
            if chan.has_member(id) {
                chan.remove_member(id);
                chan.broadcast(&self.clients, Some(id), &line);
            }
        }
        info!("client {} quit ({})", id, text);
        self.remove_connection(id);
    }

    // ── helpers ──────────────────────────────────────────────────

    /// Look up a registered nickname. Empty nicknames never match, so
    /// unregistered clients cannot be addressed.
    fn client_by_nick(&self, nick: &str) -> Option<ConnId> {
        if nick.is_empty() {
            return None;
        }
        self.clients
            .values()
            .find(|c| c.nickname == nick)
            .map(|c| c.id)
    }

    fn display_nick_of(&self, id: ConnId) -> String {
        self.clients
            .get(&id)
            .map(|c| c.display_nick().to_string())
            .unwrap_or_else(|| message::ANON_NICK.to_string())
    }

    /// Nick used as the target field of informational numerics
    fn reply_nick(&self, id: ConnId) -> String {
        match self.clients.get(&id) {
            Some(c) if !c.nickname.is_empty() => c.nickname.clone(),
            _ => "*".to_string(),
        }
    }

    fn send_to(&self, id: ConnId, reply: Reply) {
        self.send_line(id, reply.to_string());
    }

    fn send_line(&self, id: ConnId, line: String) {
        if let Some(client) = self.clients.get(&id) {
            let _ = client.send(line);
        }
    }

    /// 353/366 pair for one channel (353 only when it exists)
    fn send_names(&self, id: ConnId, channel: &str) {
        let me = self.reply_nick(id);
        if let Some(chan) = self.channels.get(channel) {
            let mut nicks = String::new();
            for member in chan.members() {
                let Some(client) = self.clients.get(&member) else {
                    continue;
                };
                if !nicks.is_empty() {
                    nicks.push(' ');
                }
                if chan.is_operator(member) {
                    nicks.push('@');
                }
                nicks.push_str(client.display_nick());
            }
            self.send_to(
                id,
                Reply::NameReply { nick: me.clone(), channel: channel.to_string(), nicks },
            );
        }
        self.send_to(id, Reply::EndOfNames { nick: me, channel: channel.to_string() });
    }
}
