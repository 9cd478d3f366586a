// Chat command parsing

/// Prefix used when none is configured
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// A recognised chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!yt <query>` / `!youtube <query>`
    Play { query: String },
    /// `!queue` / `!q`
    Queue,
}

/// Parse a chat message into a command
///
/// The command word is case-insensitive; everything after it is the query.
/// Returns None for messages without the prefix or with an unknown command.
pub fn parse_command(content: &str, prefix: &str) -> Option<Command> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let (word, query) = match rest.split_once(char::is_whitespace) {
        Some((word, query)) => (word, query.trim()),
        None => (rest, ""),
    };

    match word.to_lowercase().as_str() {
        "yt" | "youtube" => Some(Command::Play {
            query: query.to_string(),
        }),
        "queue" | "q" => Some(Command::Queue),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_aliases() {
        for content in ["!yt lofi beats", "!YouTube lofi beats", "  !YT   lofi beats  "] {
            assert_eq!(
                parse_command(content, "!"),
                Some(Command::Play {
                    query: "lofi beats".to_string()
                }),
                "{content}"
            );
        }
    }

    #[test]
    fn test_parse_play_without_query() {
        assert_eq!(
            parse_command("!yt", "!"),
            Some(Command::Play {
                query: String::new()
            })
        );
    }

    #[test]
    fn test_parse_queue() {
        assert_eq!(parse_command("!queue", "!"), Some(Command::Queue));
        assert_eq!(parse_command("!q", "!"), Some(Command::Queue));
    }

    #[test]
    fn test_ignores_unknown_and_unprefixed() {
        assert_eq!(parse_command("yt lofi", "!"), None);
        assert_eq!(parse_command("!help", "!"), None);
        assert_eq!(parse_command("", "!"), None);
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(
            parse_command("$$yt song", "$$"),
            Some(Command::Play {
                query: "song".to_string()
            })
        );
        assert_eq!(parse_command("!yt song", "$$"), None);
    }
}
