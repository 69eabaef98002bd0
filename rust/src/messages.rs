//! Structured diagnostics collected during a scheduling run.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub level: Level,
    /// Stable identifier, e.g. `"runaway"` or `"loop_detected"`.
    pub id: &'static str,
    pub text: String,
    pub scenario: Option<String>,
    pub property: Option<String>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
        };
        write!(f, "{}", level)?;
        if let Some(scenario) = &self.scenario {
            write!(f, " [{}]", scenario)?;
        }
        if let Some(property) = &self.property {
            write!(f, " {}", property)?;
        }
        write!(f, ": {}", self.text)
    }
}

/// Collects messages. Scheduling never depends on what happens to them.
#[derive(Clone, Debug, Default)]
pub struct MessageHandler {
    messages: Vec<Message>,
}

impl MessageHandler {
    pub fn send(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn warning(
        &mut self,
        id: &'static str,
        text: impl Into<String>,
        scenario: Option<&str>,
        property: Option<&str>,
    ) {
        self.send(Message {
            level: Level::Warning,
            id,
            text: text.into(),
            scenario: scenario.map(str::to_string),
            property: property.map(str::to_string),
        });
    }

    pub fn error(
        &mut self,
        id: &'static str,
        text: impl Into<String>,
        scenario: Option<&str>,
        property: Option<&str>,
    ) {
        self.send(Message {
            level: Level::Error,
            id,
            text: text.into(),
            scenario: scenario.map(str::to_string),
            property: property.map(str::to_string),
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn count(&self, level: Level) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
