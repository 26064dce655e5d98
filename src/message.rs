use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Severity of a structured message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Warning,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Warning => "Warning",
            MessageType::Error => "Error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A warning or error recovered from the log, possibly spanning several lines.
///
/// Two messages are the same logical message when their rendering (see the
/// `Display` impl) is identical; `occurrences` is the only field that changes
/// after a message has been emitted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub block: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub code: String,
    #[serde(rename = "message")]
    pub text: String,
    pub intro: String,
    pub indent: usize,
    #[serde(default = "one")]
    pub occurrences: u32,
}

fn one() -> u32 {
    1
}

impl Message {
    pub fn new(
        block: impl Into<String>,
        source: impl Into<String>,
        kind: MessageType,
        code: impl Into<String>,
        text: impl Into<String>,
        intro: impl Into<String>,
        indent: usize,
    ) -> Self {
        Message {
            block: block.into(),
            source: source.into(),
            kind,
            code: code.into(),
            text: text.into(),
            intro: intro.into(),
            indent,
            occurrences: 1,
        }
    }

    /// Hex SHA-256 of the rendered message; the dedup key.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.intro.trim().is_empty() {
            writeln!(f, "{}", self.intro)?;
        }
        write!(f, "{:indent$}", "", indent = self.indent)?;
        write!(f, "{}: {}: ", self.source, self.kind)?;
        if !self.code.trim().is_empty() {
            write!(f, "{}: ", self.code)?;
        }
        write!(f, "{}", self.text)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("block", &self.block)
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("text", &self.text)
            .field("intro", &self.intro)
            .field("indent", &self.indent)
            .field("occurrences", &self.occurrences)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_code_intro_and_indent() {
        let msg = Message::new(
            "Compiler",
            "Foo.cpp(10)",
            MessageType::Error,
            "C2065",
            "'x': undeclared identifier",
            "In file included from Bar.h:3:",
            2,
        );
        assert_eq!(
            msg.to_string(),
            "In file included from Bar.h:3:\n  Foo.cpp(10): Error: C2065: 'x': undeclared identifier"
        );
    }

    #[test]
    fn blank_code_is_omitted() {
        let msg = Message::new("Content", "LogTemp", MessageType::Warning, "", "careful", "", 0);
        assert_eq!(msg.to_string(), "LogTemp: Warning: careful");
    }

    #[test]
    fn fingerprint_ignores_occurrences() {
        let a = Message::new("Content", "LogTemp", MessageType::Warning, "", "careful", "", 0);
        let mut b = a.clone();
        b.occurrences = 7;
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_differs_on_indent() {
        let a = Message::new("Content", "LogTemp", MessageType::Warning, "", "careful", "", 0);
        let b = Message::new("Content", "LogTemp", MessageType::Warning, "", "careful", "", 4);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn json_uses_wire_field_names() {
        let msg = Message::new("Compiler", "a.cpp", MessageType::Error, "C1", "bad", "", 0);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["message"], "bad");
        assert_eq!(json["occurrences"], 1);
        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
