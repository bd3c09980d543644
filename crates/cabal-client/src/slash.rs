//! Parsing of composer input into slash commands.

/// What a line typed into the composer asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the current channel.
    Say(String),
    Nick(String),
    Join(String),
    Topic(String),
    Emote(String),
    Help,
    /// A known command given without its required argument.
    Usage(&'static CommandInfo),
    Unknown(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub help: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "nick",
        aliases: &["n"],
        usage: "/nick NAME",
        help: "change your display name",
    },
    CommandInfo {
        name: "join",
        aliases: &["j"],
        usage: "/join CHANNEL",
        help: "join a channel and switch to it",
    },
    CommandInfo {
        name: "topic",
        aliases: &[],
        usage: "/topic TEXT",
        help: "set the topic of the current channel",
    },
    CommandInfo {
        name: "me",
        aliases: &[],
        usage: "/me TEXT",
        help: "describe what you are doing",
    },
    CommandInfo {
        name: "help",
        aliases: &[],
        usage: "/help",
        help: "list the available commands",
    },
];

fn lookup(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Parse one line of input. Blank input yields `None`.
pub fn parse(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Some(Command::Say(trimmed.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let name = name.to_lowercase();

    let Some(cmd) = lookup(&name) else {
        return Some(Command::Unknown(name));
    };

    let command = match cmd.name {
        "help" => Command::Help,
        _ if arg.is_empty() => Command::Usage(cmd),
        "nick" => Command::Nick(arg.to_string()),
        "join" => Command::Join(arg.to_string()),
        "topic" => Command::Topic(arg.to_string()),
        "me" => Command::Emote(arg.to_string()),
        _ => Command::Unknown(name),
    };
    Some(command)
}

/// One line per command, as shown by `/help`.
pub fn help_lines() -> Vec<String> {
    COMMANDS
        .iter()
        .map(|cmd| format!("{} - {}", cmd.usage, cmd.help))
        .collect()
}
