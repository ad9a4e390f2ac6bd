//! Input handling - parse user input and commands

/// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// Nothing but whitespace
    Empty,

    /// Message text to send to the session
    Text(String),

    /// Control command: :command args
    ///
    /// `raw_args` is everything after the command name, with inner spacing kept.
    ControlCommand {
        command: String,
        args: Vec<String>,
        raw_args: String,
    },
}

/// Parse a line of user input
///
/// A leading `::` escapes a message that should start with a colon.
pub fn parse_input(line: &str) -> ParsedInput {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return ParsedInput::Empty;
    }

    if let Some(rest) = trimmed.strip_prefix("::") {
        return ParsedInput::Text(format!(":{}", rest));
    }

    // Control command: :command
    if let Some(rest) = trimmed.strip_prefix(':') {
        let (name, raw_args) = match rest.find(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim_start()),
            None => (rest, ""),
        };

        return ParsedInput::ControlCommand {
            command: name.to_lowercase(),
            args: raw_args.split_whitespace().map(String::from).collect(),
            raw_args: raw_args.to_string(),
        };
    }

    // Keep the user's spacing inside the message
    ParsedInput::Text(line.trim_end_matches(['\r', '\n']).to_string())
}
