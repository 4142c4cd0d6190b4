#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandDef {
    command: BotCommand,
    name: &'static str,
}

const COMMAND_DEFS: &[CommandDef] = &[
    CommandDef {
        command: BotCommand::Start,
        name: "/start",
    },
    CommandDef {
        command: BotCommand::Status,
        name: "/status",
    },
];

/// Recognise a bot command at the start of `text`.
///
/// Group chats address commands as `/status@SomeBot`; the suffix is ignored.
/// Anything after the command word is ignored too.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let word = text.split_whitespace().next()?;
    let name = word.split_once('@').map_or(word, |(name, _)| name);

    COMMAND_DEFS
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case(name))
        .map(|def| def.command)
}
