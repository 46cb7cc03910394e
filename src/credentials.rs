use anyhow::{Context, Result, bail};
use std::io::{BufRead, IsTerminal, Write};

use crate::config::API_KEY_ENV;

pub const PROMPT: &str = "Enter your Roboflow API key: ";

/// Where the API key comes from: the environment first, a terminal prompt second.
pub trait CredentialSource {
    /// Value of the key variable, if set.
    fn env_key(&self) -> Option<String>;

    /// Whether a person can answer a prompt.
    fn is_interactive(&self) -> bool;

    /// Shows `message` and reads one line of input.
    fn prompt(&mut self, message: &str) -> Result<String>;
}

/// Reads `ROBOFLOW_API_KEY` and prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct Terminal;

impl CredentialSource for Terminal {
    fn env_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV).ok()
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn prompt(&mut self, message: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        let n = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read API key from terminal")?;
        if n == 0 {
            bail!("no API key entered (stdin closed)");
        }
        Ok(line)
    }
}

/// Returns the key from the environment, or asks for it once.
///
/// An empty variable counts as unset. Without a terminal to ask on this is a
/// configuration error rather than a blocking read.
pub fn resolve_api_key<C>(source: &mut C) -> Result<String>
where
    C: CredentialSource + ?Sized,
{
    if let Some(key) = source.env_key().filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    if !source.is_interactive() {
        bail!(
            "Missing configuration: {} is not set and no terminal is attached to prompt for it",
            API_KEY_ENV
        );
    }

    let entered = source.prompt(PROMPT)?;
    Ok(entered.trim_end_matches(['\r', '\n']).to_string())
}
