use std::fmt;

/// Commands accepted at the client prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the song list
    List,
    /// Append a song
    Add(String),
    /// Replace the song at an index
    Set { index: i64, title: String },
    /// Remove the song at an index
    Remove(i64),
    /// Show the signed-in account
    WhoAmI,
    /// Sign out and forget the stored session
    Logout,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Index is not a whole number.
    InvalidIndex(String),
    /// Command needs a song title.
    MissingTitle(&'static str),
    /// Command needs an index.
    MissingIndex(&'static str),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex(value) => write!(
                f,
                "Invalid index '{}'. Must be a whole number (e.g., 'rm 0')",
                value
            ),
            Self::MissingTitle(usage) => write!(f, "Missing song title (e.g., '{}')", usage),
            Self::MissingIndex(usage) => write!(f, "Missing index (e.g., '{}')", usage),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Prompt help text
pub const COMMAND_HELP: &str = "\
  list                 Show your songs
  add TITLE            Add a song
  set INDEX TITLE      Replace the song at INDEX
  rm INDEX             Remove the song at INDEX
  whoami               Show the signed-in account
  logout               Sign out
  help                 Show this help
  quit                 Exit";

/// Parse a line typed at the prompt.
///
/// Titles keep their inner spacing; indices are zero-based as shown by `list`.
///
/// # Examples
///
/// ```
/// use tw_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("list"), Ok(Command::List));
/// assert_eq!(parse_command("add So What"), Ok(Command::Add("So What".to_string())));
/// assert_eq!(
///     parse_command("set 0 Blue in Green"),
///     Ok(Command::Set { index: 0, title: "Blue in Green".to_string() })
/// );
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed {
        "list" | "ls" => return Ok(Command::List),
        "whoami" => return Ok(Command::WhoAmI),
        "logout" => return Ok(Command::Logout),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word {
        "add" => parse_add_command(rest),
        "set" => parse_set_command(rest),
        "rm" => parse_rm_command(rest),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

fn parse_index(value: &str) -> Result<i64, ParseError> {
    value
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidIndex(value.to_string()))
}

/// Parse "add TITLE"
fn parse_add_command(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingTitle("add So What"));
    }
    Ok(Command::Add(rest.to_string()))
}

/// Parse "set INDEX TITLE"
fn parse_set_command(rest: &str) -> Result<Command, ParseError> {
    let (index, title) = match rest.split_once(char::is_whitespace) {
        Some((index, title)) => (index, title.trim()),
        None if rest.is_empty() => return Err(ParseError::MissingIndex("set 0 So What")),
        None => (rest, ""),
    };

    let index = parse_index(index)?;
    if title.is_empty() {
        return Err(ParseError::MissingTitle("set 0 So What"));
    }

    Ok(Command::Set {
        index,
        title: title.to_string(),
    })
}

/// Parse "rm INDEX"
fn parse_rm_command(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingIndex("rm 0"));
    }
    Ok(Command::Remove(parse_index(rest)?))
}
