//! User slash-command parser.
//!
//! Parses `/command arg1 arg2 ...` input lines into typed [`ParsedCommand`]
//! values. Validation here is structural only — whether a channel exists or
//! a nick is online is the server's business and comes back as events.
//!
//! Returns `None` for lines that are not commands, for unrecognized
//! commands, and for recognized commands missing a required argument; the
//! caller falls back to sending the line as a literal message, matching the
//! gateway's web client.

/// The closed command vocabulary, as typed (without the `/` prefix).
/// Also the candidate pool for command completion.
pub const COMMAND_NAMES: [&str; 19] = [
    "join", "part", "nick", "me", "msg", "whois", "who", "mode", "away", "ignore", "unignore",
    "kick", "ban", "invite", "topic", "list", "search", "ctcp", "help",
];

/// A parsed user command. Each variant corresponds to a `/command`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Join { channel: String },
    Part { channel: Option<String>, message: Option<String> },
    Nick { nick: String },
    Me { text: String },
    Msg { target: String, text: String },
    Whois { nick: String },
    Who { nick: String },
    Mode { target: String },
    Away { message: Option<String> },
    Ignore { nick: String },
    Unignore { nick: String },
    Kick { channel: Option<String>, nick: String, reason: Option<String> },
    Ban { channel: Option<String>, mask: String },
    Invite { nick: String, channel: Option<String> },
    Topic { text: String },
    List,
    Search { query: String },
    Ctcp { target: String, command: String },
    Help,
}

/// Prepend the channel sigil when missing.
pub fn normalize_channel(name: &str) -> String {
    if name.starts_with('#') {
        name.to_string()
    } else {
        format!("#{name}")
    }
}

/// Parse a slash-command string into a [`ParsedCommand`].
///
/// Commands are case-insensitive and split on whitespace.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }

    let mut words = input[1..].split_whitespace();
    let cmd = words.next()?.to_lowercase();
    let args: Vec<&str> = words.collect();

    match cmd.as_str() {
        "join" => {
            let channel = normalize_channel(args.first()?);
            Some(ParsedCommand::Join { channel })
        }
        "part" => {
            let (channel, rest) = match args.first() {
                Some(first) if first.starts_with('#') => {
                    (Some((*first).to_string()), &args[1..])
                }
                _ => (None, &args[..]),
            };
            let message = (!rest.is_empty()).then(|| rest.join(" "));
            Some(ParsedCommand::Part { channel, message })
        }
        "nick" => Some(ParsedCommand::Nick {
            nick: (*args.first()?).to_string(),
        }),
        "me" => {
            if args.is_empty() {
                return None;
            }
            Some(ParsedCommand::Me {
                text: args.join(" "),
            })
        }
        "msg" => {
            let target = (*args.first()?).to_string();
            if args.len() < 2 {
                return None;
            }
            Some(ParsedCommand::Msg {
                target,
                text: args[1..].join(" "),
            })
        }
        "whois" => Some(ParsedCommand::Whois {
            nick: (*args.first()?).to_string(),
        }),
        "who" => Some(ParsedCommand::Who {
            nick: (*args.first()?).to_string(),
        }),
        "mode" => Some(ParsedCommand::Mode {
            target: (*args.first()?).to_string(),
        }),
        "away" => Some(ParsedCommand::Away {
            message: (!args.is_empty()).then(|| args.join(" ")),
        }),
        "ignore" => Some(ParsedCommand::Ignore {
            nick: (*args.first()?).to_string(),
        }),
        "unignore" => Some(ParsedCommand::Unignore {
            nick: (*args.first()?).to_string(),
        }),
        "kick" => {
            let first = *args.first()?;
            if first.starts_with('#') {
                // /kick #channel nick [reason]
                let nick = (*args.get(1)?).to_string();
                let reason = (args.len() > 2).then(|| args[2..].join(" "));
                Some(ParsedCommand::Kick {
                    channel: Some(first.to_string()),
                    nick,
                    reason,
                })
            } else {
                // /kick nick [reason]
                let reason = (args.len() > 1).then(|| args[1..].join(" "));
                Some(ParsedCommand::Kick {
                    channel: None,
                    nick: first.to_string(),
                    reason,
                })
            }
        }
        "ban" => {
            let first = *args.first()?;
            if first.starts_with('#') {
                Some(ParsedCommand::Ban {
                    channel: Some(first.to_string()),
                    mask: (*args.get(1)?).to_string(),
                })
            } else {
                Some(ParsedCommand::Ban {
                    channel: None,
                    mask: first.to_string(),
                })
            }
        }
        "invite" => {
            let nick = (*args.first()?).to_string();
            let channel = args.get(1).map(|c| normalize_channel(c));
            Some(ParsedCommand::Invite { nick, channel })
        }
        "topic" => {
            if args.is_empty() {
                return None;
            }
            Some(ParsedCommand::Topic {
                text: args.join(" "),
            })
        }
        "list" => Some(ParsedCommand::List),
        "search" => {
            if args.is_empty() {
                return None;
            }
            Some(ParsedCommand::Search {
                query: args.join(" "),
            })
        }
        "ctcp" => Some(ParsedCommand::Ctcp {
            target: (*args.first()?).to_string(),
            command: (*args.get(1)?).to_string(),
        }),
        "help" => Some(ParsedCommand::Help),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_command_lines_are_not_parsed() {
        assert_eq!(parse_command("hello world"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn join_normalizes_the_channel_sigil() {
        assert_eq!(
            parse_command("/join rust"),
            Some(ParsedCommand::Join {
                channel: "#rust".into()
            })
        );
        assert_eq!(
            parse_command("/JOIN #rust"),
            Some(ParsedCommand::Join {
                channel: "#rust".into()
            })
        );
    }

    #[test]
    fn missing_required_argument_is_not_a_command() {
        assert_eq!(parse_command("/join"), None);
        assert_eq!(parse_command("/nick"), None);
        assert_eq!(parse_command("/msg bob"), None);
        assert_eq!(parse_command("/ctcp bob"), None);
    }

    #[test]
    fn part_distinguishes_channel_from_message() {
        assert_eq!(
            parse_command("/part"),
            Some(ParsedCommand::Part {
                channel: None,
                message: None
            })
        );
        assert_eq!(
            parse_command("/part #rust gotta go"),
            Some(ParsedCommand::Part {
                channel: Some("#rust".into()),
                message: Some("gotta go".into())
            })
        );
        assert_eq!(
            parse_command("/part gotta go"),
            Some(ParsedCommand::Part {
                channel: None,
                message: Some("gotta go".into())
            })
        );
    }

    #[test]
    fn msg_keeps_the_full_text() {
        assert_eq!(
            parse_command("/msg bob how are you"),
            Some(ParsedCommand::Msg {
                target: "bob".into(),
                text: "how are you".into()
            })
        );
    }

    #[test]
    fn away_with_and_without_message() {
        assert_eq!(
            parse_command("/away lunch break"),
            Some(ParsedCommand::Away {
                message: Some("lunch break".into())
            })
        );
        assert_eq!(parse_command("/away"), Some(ParsedCommand::Away { message: None }));
    }

    #[test]
    fn kick_with_explicit_and_implied_channel() {
        assert_eq!(
            parse_command("/kick #rust bob spamming"),
            Some(ParsedCommand::Kick {
                channel: Some("#rust".into()),
                nick: "bob".into(),
                reason: Some("spamming".into())
            })
        );
        assert_eq!(
            parse_command("/kick bob"),
            Some(ParsedCommand::Kick {
                channel: None,
                nick: "bob".into(),
                reason: None
            })
        );
    }

    #[test]
    fn unknown_command_is_not_parsed() {
        assert_eq!(parse_command("/frobnicate now"), None);
    }
}
