//! Command-line argument parsing for the `ferraco-wa` watcher.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

/// Options for watching a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Overrides `FERRACO_WS_URL`
    pub url: Option<String>,
    /// Conversations to subscribe to once connected
    pub subscribe: Vec<String>,
    /// Print state changes as JSON lines
    pub json: bool,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Connect and watch the session (default)
    Run(RunOptions),
}

/// Why the arguments could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgsError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("unknown argument: {0}")]
    Unknown(String),
}

pub const USAGE: &str = "\
Usage: ferraco-wa [OPTIONS]

Options:
  --url <URL>          WebSocket endpoint (default: $FERRACO_WS_URL)
  --subscribe <ID>     Subscribe to a conversation; may be repeated
  --json               Print state changes as JSON lines
  -V, --version        Print version
  -h, --help           Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// The first item is the program name and is skipped. `--version` and
/// `--help` win over everything else.
///
/// # Examples
///
/// ```
/// use ferraco_whatsapp::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["ferraco-wa".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut options = RunOptions::default();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--json" => options.json = true,
            "--url" => {
                options.url = Some(args.next().ok_or(ArgsError::MissingValue("--url"))?);
            }
            "--subscribe" => {
                let id = args.next().ok_or(ArgsError::MissingValue("--subscribe"))?;
                options.subscribe.push(id);
            }
            _ => return Err(ArgsError::Unknown(arg)),
        }
    }

    Ok(CliCommand::Run(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, ArgsError> {
        let mut all = vec!["ferraco-wa".to_string()];
        all.extend(args.iter().map(|s| s.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Ok(CliCommand::Run(RunOptions::default())));
    }

    #[test]
    fn test_parse_run_options() {
        let command = parse(&[
            "--url",
            "wss://crm.example/ws",
            "--subscribe",
            "conv-1",
            "--json",
            "--subscribe",
            "conv-2",
        ]);
        assert_eq!(
            command,
            Ok(CliCommand::Run(RunOptions {
                url: Some("wss://crm.example/ws".to_string()),
                subscribe: vec!["conv-1".to_string(), "conv-2".to_string()],
                json: true,
            }))
        );
    }

    #[test]
    fn test_version_wins_after_options() {
        assert_eq!(parse(&["--json", "--version"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(parse(&["--url"]), Err(ArgsError::MissingValue("--url")));
        assert_eq!(
            parse(&["--subscribe"]),
            Err(ArgsError::MissingValue("--subscribe"))
        );
    }

    #[test]
    fn test_unknown_flag() {
        assert_eq!(
            parse(&["--update"]),
            Err(ArgsError::Unknown("--update".to_string()))
        );
    }
}
