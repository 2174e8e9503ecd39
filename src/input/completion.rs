//! Tab completion for nicks, channels, and slash commands.
//!
//! Pure functions: given the current input line and a candidate pool,
//! return the completed line or `None` when nothing useful can be done.
//! Only the trailing whitespace-delimited word is ever completed.

use crate::gateway::commands::COMMAND_NAMES;

/// Complete the trailing word against a channel nicklist.
///
/// The caller's own nick is excluded from the pool. A unique match replaces
/// the word and appends a space; several matches extend the word to their
/// longest common prefix when that is strictly longer than what was typed.
pub fn complete_nick(input: &str, nicks: &[String], self_nick: Option<&str>) -> Option<String> {
    if input.trim().is_empty() || nicks.is_empty() {
        return None;
    }
    let last_word = trailing_word(input);
    if last_word.is_empty() || last_word.starts_with('/') {
        return None;
    }

    let pool: Vec<&str> = nicks
        .iter()
        .map(String::as_str)
        .filter(|n| Some(*n) != self_nick)
        .collect();
    complete_word(input, last_word, &pool, " ")
}

/// Complete the trailing word against the open-channel list. The word must
/// already carry the channel sigil; no separator is appended, so typing can
/// continue straight into subchannel-style names.
pub fn complete_channel(input: &str, channels: &[String]) -> Option<String> {
    if input.trim().is_empty() || channels.is_empty() {
        return None;
    }
    let last_word = trailing_word(input);
    if !last_word.starts_with('#') {
        return None;
    }
    let pool: Vec<&str> = channels.iter().map(String::as_str).collect();
    complete_word(input, last_word, &pool, "")
}

/// Complete a slash command. The whole input must be the command fragment.
pub fn complete_command(input: &str) -> Option<String> {
    if !input.starts_with('/') {
        return None;
    }
    let pool: Vec<String> = COMMAND_NAMES.iter().map(|c| format!("/{c}")).collect();
    let pool_refs: Vec<&str> = pool.iter().map(String::as_str).collect();
    complete_word(input, input, &pool_refs, " ")
}

fn trailing_word(input: &str) -> &str {
    input
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
}

fn complete_word(input: &str, fragment: &str, pool: &[&str], separator: &str) -> Option<String> {
    let fragment_lower = fragment.to_lowercase();
    let matches: Vec<&str> = pool
        .iter()
        .copied()
        .filter(|c| c.to_lowercase().starts_with(&fragment_lower))
        .collect();

    let head = &input[..input.len() - fragment.len()];
    match matches.len() {
        0 => None,
        1 => Some(format!("{head}{}{separator}", matches[0])),
        _ => {
            let lowered: Vec<String> = matches.iter().map(|m| m.to_lowercase()).collect();
            let common = common_prefix(&lowered);
            // Returning the fragment unchanged would be a no-op.
            (common.len() > fragment.len()).then(|| format!("{head}{common}"))
        }
    }
}

fn common_prefix(strings: &[String]) -> String {
    let Some(first) = strings.first() else {
        return String::new();
    };
    let mut prefix = first.clone();
    for s in &strings[1..] {
        while !s.starts_with(&prefix) {
            prefix.pop();
            if prefix.is_empty() {
                return prefix;
            }
        }
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nicks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn unique_nick_match_appends_space() {
        let pool = nicks(&["alice", "bob"]);
        assert_eq!(complete_nick("al", &pool, None), Some("alice ".into()));
    }

    #[test]
    fn ambiguous_nick_extends_to_common_prefix() {
        let pool = nicks(&["alice", "alicia", "bob"]);
        assert_eq!(complete_nick("ali", &pool, None), Some("alic".into()));
    }

    #[test]
    fn no_progress_returns_none() {
        // "alic" is already the common prefix of alice/alicia.
        let pool = nicks(&["alice", "alicia"]);
        assert_eq!(complete_nick("alic", &pool, None), None);
    }

    #[test]
    fn completes_only_the_trailing_word() {
        let pool = nicks(&["charlie"]);
        assert_eq!(
            complete_nick("hey there cha", &pool, None),
            Some("hey there charlie ".into())
        );
    }

    #[test]
    fn self_nick_is_excluded() {
        let pool = nicks(&["alice", "bob"]);
        assert_eq!(complete_nick("al", &pool, Some("alice")), None);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let pool = nicks(&["Alice"]);
        assert_eq!(complete_nick("al", &pool, None), Some("Alice ".into()));
    }

    #[test]
    fn trailing_space_completes_nothing() {
        let pool = nicks(&["alice"]);
        assert_eq!(complete_nick("alice ", &pool, None), None);
        assert_eq!(complete_nick("   ", &pool, None), None);
    }

    #[test]
    fn channel_completion_requires_sigil_and_appends_no_separator() {
        let pool = nicks(&["#rust", "#rest"]);
        assert_eq!(complete_channel("ru", &pool), None);
        assert_eq!(complete_channel("#ru", &pool), Some("#rust".into()));
        assert_eq!(complete_channel("#r", &pool), None); // "#r" is already the common prefix
    }

    #[test]
    fn command_completion_requires_slash() {
        assert_eq!(complete_command("jo"), None);
        assert_eq!(complete_command("/jo"), Some("/join ".into()));
    }

    #[test]
    fn command_common_prefix() {
        // /who and /whois share "/who"; typing "/wh" extends to it.
        assert_eq!(complete_command("/wh"), Some("/who".into()));
    }
}
