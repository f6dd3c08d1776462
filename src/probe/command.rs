//! How the probe is invoked.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The probe program and the arguments it always receives.
///
/// The default runs the platform `ping`. Tests and users can point this at
/// any binary or script that prints ping-compatible output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeCommand {
    /// Program name or path.
    pub program: String,
    /// Arguments placed before any user-supplied ones.
    pub base_args: Vec<String>,
    /// How long a stop request waits for a polite exit before killing.
    pub grace_ms: u64,
}

impl Default for ProbeCommand {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
            base_args: Vec::new(),
            grace_ms: 500,
        }
    }
}

impl ProbeCommand {
    /// A command running `program` with no fixed arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Add fixed arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the stop grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// The full argument vector for one run.
    ///
    /// Windows `ping` stops after four attempts unless told otherwise, so
    /// `-t` is added there when the user passed nothing of their own.
    pub fn arguments(&self, address: &str, extra: &[String]) -> Vec<String> {
        let mut args = self.base_args.clone();
        if extra.is_empty() && cfg!(windows) && self.is_platform_ping() {
            args.push("-t".to_string());
        }
        args.extend(extra.iter().cloned());
        args.push(address.to_string());
        args
    }

    fn is_platform_ping(&self) -> bool {
        let name = self
            .program
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.program)
            .to_ascii_lowercase();
        name == "ping" || name == "ping.exe"
    }
}

/// Split a user argument string into words.
///
/// Whitespace separates words; single or double quotes group them. There is
/// no escape character.
pub fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in s.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        args.push(current);
    }
    args
}
