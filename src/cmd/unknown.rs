use crate::db::CmdResult;
use crate::Frame;

/// Represents an unrecognized command name.
#[derive(Debug)]
pub struct Unknown {
    command_name: String,
}

impl Unknown {
    pub(crate) fn new(key: impl ToString) -> Unknown {
        Unknown {
            command_name: key.to_string(),
        }
    }

    pub(crate) fn get_name(&self) -> &str {
        &self.command_name
    }

    pub(crate) fn apply(self) -> CmdResult {
        CmdResult {
            reply: Frame::Error(format!("ERR unknown command '{}'", self.command_name)),
            persist: Vec::new(),
        }
    }
}
