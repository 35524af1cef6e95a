//! Protocol message definitions
//!
//! Typed representations for both directions of the wire protocol:
//! `Command` for client → server lines, `Reply` for server-sourced
//! numerics plus builders for user-prefixed event lines.
//!
//! A line is split into a verb (first whitespace-delimited token,
//! upper-cased) and an argument string (one leading space stripped),
//! which each command tokenizes its own way.

use std::fmt;

/// Server name used as the prefix of server-sourced replies.
pub const SERVER_NAME: &str = "ircserv";

/// Nick shown in message prefixes while a client has not set one.
pub const ANON_NICK: &str = "anon";

/// Client → Server command
///
/// One variant per implemented verb; anything else lands in `Unknown`
/// and is logged by the dispatcher without a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// PASS <password> - the raw argument string is compared to the secret
    Pass { password: String },
    /// NICK <nickname>
    Nick { nickname: String },
    /// USER <username> ... (only the first token is used)
    User { username: String },
    /// JOIN <channel> [key]
    Join { channel: String, key: String },
    /// PRIVMSG <target> :<text>
    Privmsg { target: String, text: String },
    /// NOTICE <target> :<text>
    Notice { target: String, text: String },
    /// KICK <channel> <nick>
    Kick { channel: String, nick: String },
    /// INVITE <channel> <nick>
    Invite { channel: String, nick: String },
    /// TOPIC <channel> [:<topic>]
    Topic { channel: String, topic: String },
    /// MODE <channel> <modes> [param]
    Mode { channel: String, modes: String, param: String },
    /// PING [token]
    Ping { token: String },
    /// CAP <subcommand> [args]
    Cap { sub: String, rest: String },
    /// WHO [mask]
    Who { mask: String },
    /// NAMES [channel{,channel}]
    Names { channels: String },
    /// QUIT [:<message>]
    Quit { message: String },
    /// Anything else - logged and ignored
    Unknown { verb: String },
}

/// Split off the first whitespace-delimited token; the rest keeps its
/// internal spacing, with the single separating space removed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start_matches(|c| c == ' ' || c == '\t');
    match s.find(|c| c == ' ' || c == '\t') {
        Some(pos) => (&s[..pos], s[pos + 1..].trim_start_matches(' ')),
        None => (s, ""),
    }
}

fn strip_leading_colon(s: &str) -> &str {
    s.strip_prefix(':').unwrap_or(s)
}

impl Command {
    /// Parse one extracted line. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Command> {
        let (verb, args) = split_token(line);
        if verb.is_empty() {
            return None;
        }
        let verb = verb.to_uppercase();

        let cmd = match verb.as_str() {
            "PASS" => Command::Pass { password: args.to_string() },
            "NICK" => Command::Nick {
                nickname: args.trim_matches(|c| c == ' ' || c == '\t').to_string(),
            },
            "USER" => {
                let (username, _) = split_token(args);
                Command::User { username: username.to_string() }
            }
            "JOIN" => {
                let (channel, rest) = split_token(args);
                let (key, _) = split_token(rest);
                Command::Join { channel: channel.to_string(), key: key.to_string() }
            }
            "PRIVMSG" | "NOTICE" => {
                let (target, rest) = split_token(args);
                let text = strip_leading_colon(rest).to_string();
                if verb == "PRIVMSG" {
                    Command::Privmsg { target: target.to_string(), text }
                } else {
                    Command::Notice { target: target.to_string(), text }
                }
            }
            "KICK" => {
                let (channel, rest) = split_token(args);
                let (nick, _) = split_token(rest);
                Command::Kick { channel: channel.to_string(), nick: nick.to_string() }
            }
            "INVITE" => {
                let (channel, rest) = split_token(args);
                let (nick, _) = split_token(rest);
                Command::Invite { channel: channel.to_string(), nick: nick.to_string() }
            }
            "TOPIC" => {
                let (channel, rest) = split_token(args);
                Command::Topic {
                    channel: channel.to_string(),
                    topic: strip_leading_colon(rest).to_string(),
                }
            }
            "MODE" => {
                let (channel, rest) = split_token(args);
                let (modes, rest) = split_token(rest);
                let (param, _) = split_token(rest);
                Command::Mode {
                    channel: channel.to_string(),
                    modes: modes.to_string(),
                    param: param.to_string(),
                }
            }
            "PING" => {
                let token = strip_leading_colon(args.trim_matches(|c| c == ' ' || c == '\t'));
                Command::Ping { token: token.to_string() }
            }
            "CAP" => {
                let (sub, rest) = split_token(args);
                Command::Cap { sub: sub.to_uppercase(), rest: rest.to_string() }
            }
            "WHO" => {
                let (mask, _) = split_token(args);
                Command::Who { mask: mask.to_string() }
            }
            "NAMES" => {
                let (channels, _) = split_token(args);
                Command::Names { channels: channels.to_string() }
            }
            "QUIT" => Command::Quit { message: strip_leading_colon(args).to_string() },
            _ => Command::Unknown { verb },
        };
        Some(cmd)
    }
}

/// Server → Client numeric reply
///
/// Rendered as `:ircserv <code> <params> :<trailing>` by `Display`;
/// the line terminator is added by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 001 - registration completed
    Welcome { nick: String },
    /// 331 - topic queried but not set
    NoTopic { channel: String },
    /// 332 - current topic
    TopicIs { channel: String, topic: String },
    /// 352 - WHO list entry
    WhoEntry { nick: String, mask: String, username: String, entry_nick: String, op: bool },
    /// 315 - end of WHO list
    EndOfWho { nick: String, mask: String },
    /// 353 - NAMES list for one channel
    NameReply { nick: String, channel: String, nicks: String },
    /// 366 - end of NAMES list
    EndOfNames { nick: String, channel: String },
    /// 401
    NoSuchNick { target: String },
    /// 403
    NoSuchChannel { channel: String },
    /// 431
    NoNicknameGiven,
    /// 441 - KICK target is not on the channel
    UserNotInChannel { nick: String, channel: String },
    /// 451
    NotRegistered,
    /// 461
    NeedMoreParams { command: String },
    /// 464
    PasswdMismatch,
    /// 471
    ChannelIsFull { channel: String },
    /// 473
    InviteOnlyChan { channel: String },
    /// 475
    BadChannelKey { channel: String },
    /// 482
    ChanOpPrivsNeeded { channel: String },
    /// PONG echo
    Pong { token: String },
    /// CAP acknowledgement (LS/LIST/NAK with a capability list)
    Cap { sub: &'static str, caps: String },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome { nick } => {
                write!(f, ":{SERVER_NAME} 001 {nick} :Welcome")
            }
            Reply::NoTopic { channel } => {
                write!(f, ":{SERVER_NAME} 331 {channel} :No topic is set")
            }
            Reply::TopicIs { channel, topic } => {
                write!(f, ":{SERVER_NAME} 332 {channel} :{topic}")
            }
            Reply::WhoEntry { nick, mask, username, entry_nick, op } => {
                let flags = if *op { "H@" } else { "H" };
                write!(
                    f,
                    ":{SERVER_NAME} 352 {nick} {mask} {username} localhost {SERVER_NAME} \
                     {entry_nick} {flags} :0 {entry_nick}"
                )
            }
            Reply::EndOfWho { nick, mask } => {
                write!(f, ":{SERVER_NAME} 315 {nick} {mask} :End of /WHO list")
            }
            Reply::NameReply { nick, channel, nicks } => {
                write!(f, ":{SERVER_NAME} 353 {nick} = {channel} :{nicks}")
            }
            Reply::EndOfNames { nick, channel } => {
                write!(f, ":{SERVER_NAME} 366 {nick} {channel} :End of /NAMES list")
            }
            Reply::NoSuchNick { target } => {
                write!(f, ":{SERVER_NAME} 401 {target} :No such nick/channel")
            }
            Reply::NoSuchChannel { channel } => {
                write!(f, ":{SERVER_NAME} 403 {channel} :No such channel")
            }
            Reply::NoNicknameGiven => {
                write!(f, ":{SERVER_NAME} 431 :No nickname given")
            }
            Reply::UserNotInChannel { nick, channel } => {
                write!(f, ":{SERVER_NAME} 441 {nick} {channel} :They aren't on that channel")
            }
            Reply::NotRegistered => {
                write!(f, ":{SERVER_NAME} 451 :You have not registered")
            }
            Reply::NeedMoreParams { command } => {
                write!(f, ":{SERVER_NAME} 461 {command} :Not enough parameters")
            }
            Reply::PasswdMismatch => {
                write!(f, ":{SERVER_NAME} 464 :Password incorrect")
            }
            Reply::ChannelIsFull { channel } => {
                write!(f, ":{SERVER_NAME} 471 {channel} :Channel is full")
            }
            Reply::InviteOnlyChan { channel } => {
                write!(f, ":{SERVER_NAME} 473 {channel} :Invite-only channel")
            }
            Reply::BadChannelKey { channel } => {
                write!(f, ":{SERVER_NAME} 475 {channel} :Cannot join channel (+k)")
            }
            Reply::ChanOpPrivsNeeded { channel } => {
                write!(f, ":{SERVER_NAME} 482 {channel} :You're not channel operator")
            }
            Reply::Pong { token } => {
                write!(f, ":{SERVER_NAME} PONG {SERVER_NAME} :{token}")
            }
            Reply::Cap { sub, caps } => {
                write!(f, ":{SERVER_NAME} CAP * {sub} :{caps}")
            }
        }
    }
}

// User-prefixed event lines, broadcast or delivered directly.

pub fn join_line(nick: &str, channel: &str) -> String {
    format!(":{nick} JOIN {channel}")
}

pub fn privmsg_line(nick: &str, target: &str, text: &str) -> String {
    format!(":{nick} PRIVMSG {target} :{text}")
}

pub fn notice_line(nick: &str, target: &str, text: &str) -> String {
    format!(":{nick} NOTICE {target} :{text}")
}

pub fn kick_line(nick: &str, channel: &str, target: &str) -> String {
    format!(":{nick} KICK {channel} {target}")
}

pub fn invite_line(nick: &str, target: &str, channel: &str) -> String {
    format!(":{nick} INVITE {target} {channel}")
}

pub fn topic_line(nick: &str, channel: &str, topic: &str) -> String {
    format!(":{nick} TOPIC {channel} :{topic}")
}

pub fn mode_line(nick: &str, channel: &str, modes: &str, param: &str) -> String {
    if param.is_empty() {
        format!(":{nick} MODE {channel} {modes}")
    } else {
        format!(":{nick} MODE {channel} {modes} {param}")
    }
}

pub fn quit_line(nick: &str, message: &str) -> String {
    format!(":{nick} QUIT :{message}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_is_case_insensitive() {
        assert_eq!(
            Command::parse("nick alice"),
            Some(Command::Nick { nickname: "alice".into() })
        );
        assert_eq!(
            Command::parse("NiCk alice"),
            Some(Command::Nick { nickname: "alice".into() })
        );
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(
            Command::parse("WALLOPS everyone"),
            Some(Command::Unknown { verb: "WALLOPS".into() })
        );
    }

    #[test]
    fn test_pass_keeps_raw_argument() {
        // the whole remainder is the password, spaces included
        assert_eq!(
            Command::parse("PASS sec ret"),
            Some(Command::Pass { password: "sec ret".into() })
        );
    }

    #[test]
    fn test_join_with_and_without_key() {
        assert_eq!(
            Command::parse("JOIN #test"),
            Some(Command::Join { channel: "#test".into(), key: "".into() })
        );
        assert_eq!(
            Command::parse("JOIN #test hunter2"),
            Some(Command::Join { channel: "#test".into(), key: "hunter2".into() })
        );
    }

    #[test]
    fn test_privmsg_trailing_text() {
        assert_eq!(
            Command::parse("PRIVMSG #test :hello there"),
            Some(Command::Privmsg { target: "#test".into(), text: "hello there".into() })
        );
        // colon is optional for a single-word message
        assert_eq!(
            Command::parse("PRIVMSG alice hi"),
            Some(Command::Privmsg { target: "alice".into(), text: "hi".into() })
        );
    }

    #[test]
    fn test_topic_query_vs_set() {
        assert_eq!(
            Command::parse("TOPIC #test"),
            Some(Command::Topic { channel: "#test".into(), topic: "".into() })
        );
        assert_eq!(
            Command::parse("TOPIC #test :the topic"),
            Some(Command::Topic { channel: "#test".into(), topic: "the topic".into() })
        );
    }

    #[test]
    fn test_mode_consumes_single_param() {
        assert_eq!(
            Command::parse("MODE #test +kl secret"),
            Some(Command::Mode {
                channel: "#test".into(),
                modes: "+kl".into(),
                param: "secret".into(),
            })
        );
    }

    #[test]
    fn test_ping_token_strips_colon() {
        assert_eq!(
            Command::parse("PING :abc123"),
            Some(Command::Ping { token: "abc123".into() })
        );
        assert_eq!(Command::parse("PING"), Some(Command::Ping { token: "".into() }));
    }

    #[test]
    fn test_cap_sub_uppercased() {
        assert_eq!(
            Command::parse("CAP ls 302"),
            Some(Command::Cap { sub: "LS".into(), rest: "302".into() })
        );
    }

    #[test]
    fn test_quit_message() {
        assert_eq!(
            Command::parse("QUIT :gone fishing"),
            Some(Command::Quit { message: "gone fishing".into() })
        );
        assert_eq!(Command::parse("QUIT"), Some(Command::Quit { message: "".into() }));
    }

    #[test]
    fn test_reply_wire_format() {
        let reply = Reply::Welcome { nick: "alice".into() };
        assert_eq!(reply.to_string(), ":ircserv 001 alice :Welcome");

        let reply = Reply::ChanOpPrivsNeeded { channel: "#test".into() };
        assert_eq!(reply.to_string(), ":ircserv 482 #test :You're not channel operator");

        let reply = Reply::Cap { sub: "NAK", caps: "multi-prefix".into() };
        assert_eq!(reply.to_string(), ":ircserv CAP * NAK :multi-prefix");
    }

    #[test]
    fn test_event_lines() {
        assert_eq!(join_line("alice", "#test"), ":alice JOIN #test");
        assert_eq!(
            mode_line("alice", "#test", "+il", "5"),
            ":alice MODE #test +il 5"
        );
        assert_eq!(mode_line("alice", "#test", "-i", ""), ":alice MODE #test -i");
        assert_eq!(quit_line("alice", "Client Quit"), ":alice QUIT :Client Quit");
    }
}
