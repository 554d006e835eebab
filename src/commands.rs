use tracing::{debug, error};

use crate::platform::{ChatSink, IncomingMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ping" => Some(Self::Ping),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    fn response(self, prefix: &str) -> String {
        match self {
            Self::Ping => "Pong! 🐌".to_string(),
            Self::Help => format!(
                "🐌 Things you can ask me:\n\
                 {p}ping - check that I'm still wandering\n\
                 {p}help - this list\n\
                 Or just say my name and I'll slowly come over ✨",
                p = prefix
            ),
        }
    }
}

/// Parse `!name args...` into a known command. Unknown names are `None`.
pub fn parse(prefix: &str, text: &str) -> Option<Command> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.trim_start().strip_prefix(prefix)?;
    let name = rest.split_whitespace().next()?;
    Command::from_name(name)
}

/// Run a prefix command if the message is one. Returns whether a command ran.
pub async fn process<S: ChatSink + ?Sized>(
    sink: &S,
    prefix: &str,
    message: &IncomingMessage,
) -> bool {
    if message.author_is_bot {
        return false;
    }
    let Some(command) = parse(prefix, &message.text) else {
        return false;
    };

    debug!("Running command {:?} for {}", command, message.user_name);

    if let Err(e) = sink
        .send(&message.chat_id, &command.response(prefix))
        .await
    {
        error!("Failed to answer command {:?}: {:#}", command, e);
    }
    true
}
