/// One line of shell input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Connect,
    /// Replace the secret object. `None` means the object follows on the
    /// next lines, up to a blank line.
    Secret(Option<String>),
    Prompt(String),
    Run,
    Show,
    Disconnect,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "connect" => Self::Connect,
            "secret" if rest.is_empty() => Self::Secret(None),
            "secret" => Self::Secret(Some(rest.to_string())),
            "prompt" => Self::Prompt(rest.to_string()),
            "run" => Self::Run,
            "show" => Self::Show,
            "disconnect" => Self::Disconnect,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(word.to_string()),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  connect          connect the wallet and the network
  secret <json>    set the encrypted secret object (omit <json> to paste
                   several lines, ending with a blank line)
  prompt <text>    set the prompt sent with the secret
  run              run the Lit Action
  show             redraw the screen
  disconnect       forget the connected wallet
  help             show this text
  quit             leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_words_and_arguments() {
        assert_eq!(Command::parse("connect"), Some(Command::Connect));
        assert_eq!(Command::parse("  RUN  "), Some(Command::Run));
        assert_eq!(
            Command::parse("prompt What is 2+2?"),
            Some(Command::Prompt("What is 2+2?".into()))
        );
        assert_eq!(Command::parse("prompt"), Some(Command::Prompt(String::new())));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn secret_inline_or_block() {
        assert_eq!(
            Command::parse(r#"secret {"encryptedData":"E"}"#),
            Some(Command::Secret(Some(r#"{"encryptedData":"E"}"#.into())))
        );
        assert_eq!(Command::parse("secret"), Some(Command::Secret(None)));
    }

    #[test]
    fn unknown_keeps_the_word() {
        assert_eq!(
            Command::parse("launch now"),
            Some(Command::Unknown("launch".into()))
        );
    }
}
