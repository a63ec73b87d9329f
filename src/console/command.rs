//! Static command table and line parsing.

use super::error::CommandError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    New,
    Free,
    InsertHead,
    InsertTail,
    RemoveHead,
    RemoveTail,
    RemoveHeadQuiet,
    Size,
    Sort,
    Reverse,
    Swap,
    DeleteMid,
    DeleteDup,
    Shuffle,
    Show,
    Help,
    Quit,
    Option,
    Source,
    Log,
    Time,
}

/// Accepted argument counts, not counting the command name.
#[derive(Clone, Copy, Debug)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
    /// Completes "<name> ..." in the usage error.
    pub expected: &'static str,
}

impl Arity {
    const NONE: Arity = Arity {
        min: 0,
        max: 0,
        expected: "takes no arguments",
    };

    pub fn check(&self, name: &str, args: usize) -> Result<(), CommandError> {
        if args < self.min || args > self.max {
            return Err(CommandError::arity(name, self.expected));
        }
        Ok(())
    }
}

pub struct CommandSpec {
    pub kind: CommandKind,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub doc: &'static str,
    pub arity: Arity,
    /// Takes no arguments and asks the timing oracle in simulation mode.
    pub simulated: bool,
}

impl CommandSpec {
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        kind: CommandKind::New,
        name: "new",
        aliases: &[],
        usage: "",
        doc: "Create new queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Free,
        name: "free",
        aliases: &[],
        usage: "",
        doc: "Delete queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::InsertHead,
        name: "ih",
        aliases: &["insert-head"],
        usage: "str [n]",
        doc: "Insert string str at head of queue n times. Generate random string(s) if str equals RAND. (default: n == 1)",
        arity: Arity {
            min: 1,
            max: 2,
            expected: "needs 1-2 arguments",
        },
        simulated: true,
    },
    CommandSpec {
        kind: CommandKind::InsertTail,
        name: "it",
        aliases: &["insert-tail"],
        usage: "str [n]",
        doc: "Insert string str at tail of queue n times. Generate random string(s) if str equals RAND. (default: n == 1)",
        arity: Arity {
            min: 1,
            max: 2,
            expected: "needs 1-2 arguments",
        },
        simulated: true,
    },
    CommandSpec {
        kind: CommandKind::RemoveHead,
        name: "rh",
        aliases: &["remove-head"],
        usage: "[str]",
        doc: "Remove from head of queue.  Optionally compare to expected value str",
        arity: Arity {
            min: 0,
            max: 1,
            expected: "needs 0-1 arguments",
        },
        simulated: true,
    },
    CommandSpec {
        kind: CommandKind::RemoveTail,
        name: "rt",
        aliases: &["remove-tail"],
        usage: "[str]",
        doc: "Remove from tail of queue.  Optionally compare to expected value str",
        arity: Arity {
            min: 0,
            max: 1,
            expected: "needs 0-1 arguments",
        },
        simulated: true,
    },
    CommandSpec {
        kind: CommandKind::RemoveHeadQuiet,
        name: "rhq",
        aliases: &["remove-head-quiet"],
        usage: "",
        doc: "Remove from head of queue without reporting value.",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Size,
        name: "size",
        aliases: &[],
        usage: "[n]",
        doc: "Compute queue size n times (default: n == 1)",
        arity: Arity {
            min: 0,
            max: 1,
            expected: "takes 0-1 arguments",
        },
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Sort,
        name: "sort",
        aliases: &[],
        usage: "[option]",
        doc: "Sort queue in ascending order. Use the generic list sort if option = 'l'. Use the queue's own sort if no option specified",
        arity: Arity {
            min: 0,
            max: 1,
            expected: "takes at most 1 argument",
        },
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Reverse,
        name: "reverse",
        aliases: &[],
        usage: "",
        doc: "Reverse queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Swap,
        name: "swap",
        aliases: &["pairwise-swap"],
        usage: "",
        doc: "Swap every two adjacent nodes in queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::DeleteMid,
        name: "dm",
        aliases: &["delete-middle"],
        usage: "",
        doc: "Delete middle node in queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::DeleteDup,
        name: "dedup",
        aliases: &["delete-duplicates"],
        usage: "",
        doc: "Delete all nodes that have duplicate string",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Shuffle,
        name: "shuffle",
        aliases: &[],
        usage: "",
        doc: "Shuffle the queue",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Show,
        name: "show",
        aliases: &[],
        usage: "",
        doc: "Show queue contents",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Help,
        name: "help",
        aliases: &[],
        usage: "",
        doc: "Show summary",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Quit,
        name: "quit",
        aliases: &[],
        usage: "",
        doc: "Exit program",
        arity: Arity::NONE,
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Option,
        name: "option",
        aliases: &[],
        usage: "[name val]",
        doc: "Display or set options",
        arity: Arity {
            min: 0,
            max: 2,
            expected: "takes 0 or 2 arguments",
        },
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Source,
        name: "source",
        aliases: &[],
        usage: "file",
        doc: "Read commands from source file",
        arity: Arity {
            min: 1,
            max: 1,
            expected: "needs 1 argument",
        },
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Log,
        name: "log",
        aliases: &[],
        usage: "file",
        doc: "Copy output to file",
        arity: Arity {
            min: 1,
            max: 1,
            expected: "needs 1 argument",
        },
        simulated: false,
    },
    CommandSpec {
        kind: CommandKind::Time,
        name: "time",
        aliases: &[],
        usage: "cmd arg ...",
        doc: "Time command execution",
        arity: Arity {
            min: 1,
            max: usize::MAX,
            expected: "needs a command to time",
        },
        simulated: false,
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.matches(name))
}

/// What one input line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment,
    Command { name: &'a str, args: Vec<&'a str> },
}

pub fn parse_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if trimmed.starts_with('#') {
        return Line::Comment;
    }
    let mut words = trimmed.split_whitespace();
    match words.next() {
        Some(name) => Line::Command {
            name,
            args: words.collect(),
        },
        None => Line::Blank,
    }
}

/// Parse a decimal integer argument, as the usage errors name it.
pub fn parse_int(what: &'static str, value: &str) -> Result<i64, CommandError> {
    value
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidInteger {
            what,
            value: value.to_string(),
        })
}
