//! Shell command - runs many commands through one cache instance

use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use super::{execute, Command};
use crate::domain::TypedCache;

/// One shell line, parsed with the same grammar as the CLI subcommands
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Parses a line into a command; `None` for blank lines and `#` comments
///
/// Arguments are split on whitespace, so values cannot contain spaces.
pub fn parse_line(line: &str) -> Option<Result<Command, clap::Error>> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    Some(ShellLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command))
}

/// Reads stdin line by line until EOF, printing one JSON result per command
pub async fn run(cache: &mut TypedCache) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let output = match parse_line(&line) {
            None => continue,
            Some(Err(e)) => json!({ "error": e.kind().as_str().unwrap_or("invalid command") }),
            Some(Ok(command)) => match execute(cache, &command).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "Command failed");
                    json!({ "error": e.to_string() })
                }
            },
        };

        stdout.write_all(format!("{}\n", output).as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let command = parse_line("  hset user:1 name alice ").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Hset {
                key: "user:1".to_string(),
                field: "name".to_string(),
                value: "alice".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# warm up").is_none());
    }

    #[test]
    fn test_parse_line_invalid() {
        assert!(parse_line("frobnicate key").unwrap().is_err());
        assert!(parse_line("hget only-key").unwrap().is_err());
    }
}
