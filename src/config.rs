//! Runtime configuration and command-line parsing.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use thiserror::Error;

use crate::Amount;
use crate::model::{CustomerId, TransactionKind};

/// Capacity of the channel feeding the ledger task.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Customers seeded at startup, with their limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub customers: Vec<(CustomerId, Amount)>,
    pub mailbox_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let limits = [100_000, 80_000, 1_000_000, 10_000_000, 500_000];
        Self {
            customers: (1..).zip(limits.map(Amount::new)).collect(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// How listeners of one server process map to ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Every listener serves the same ledger.
    #[default]
    Shared,
    /// Each listener owns a separate ledger. Round-robining one customer's
    /// traffic across them loses updates.
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub ports: Vec<u16>,
    pub topology: Topology,
    pub ledger: LedgerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ports: vec![3000, 3001],
            topology: Topology::Shared,
            ledger: LedgerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub customer: CustomerId,
    pub amount: Amount,
    pub count: u64,
    pub kind: TransactionKind,
    /// Base urls, requests are distributed round-robin in this order.
    pub endpoints: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            customer: 3,
            amount: Amount::new(1),
            count: 1000,
            kind: TransactionKind::Debit,
            endpoints: vec![
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Errors that can occur when parsing command-line arguments
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("missing subcommand, expected `serve` or `verify`")]
    MissingCommand,

    #[error("unknown subcommand '{0}'")]
    UnknownCommand(String),

    #[error("option {0} expects a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for {option}")]
    InvalidValue { option: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve(ServerConfig),
    Verify(VerifierConfig),
}

impl Command {
    /// Parse arguments, not including the program name.
    ///
    /// ```text
    /// serve [--isolated] [--host H] [PORT...]
    /// verify [--customer N] [--amount N] [--count N] [--credit] [--timeout-ms N] [URL...]
    /// ```
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            Some("serve") => parse_serve(args).map(Command::Serve),
            Some("verify") => parse_verify(args).map(Command::Verify),
            Some(other) => Err(ArgsError::UnknownCommand(other.to_string())),
            None => Err(ArgsError::MissingCommand),
        }
    }
}

fn parse_serve(mut args: impl Iterator<Item = String>) -> Result<ServerConfig, ArgsError> {
    let mut config = ServerConfig::default();
    let mut ports = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--isolated" => config.topology = Topology::Isolated,
            "--host" => config.host = value_of(&arg, args.next())?,
            opt if opt.starts_with("--") => return Err(ArgsError::UnknownOption(opt.to_string())),
            _ => ports.push(parse_value("port", arg)?),
        }
    }

    if !ports.is_empty() {
        config.ports = ports;
    }
    Ok(config)
}

fn parse_verify(mut args: impl Iterator<Item = String>) -> Result<VerifierConfig, ArgsError> {
    let mut config = VerifierConfig::default();
    let mut endpoints = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--customer" => config.customer = value_of(&arg, args.next())?,
            "--amount" => config.amount = positive_amount(&arg, args.next())?,
            "--count" => config.count = value_of(&arg, args.next())?,
            "--credit" => config.kind = TransactionKind::Credit,
            "--timeout-ms" => {
                config.request_timeout = Duration::from_millis(value_of(&arg, args.next())?)
            }
            opt if opt.starts_with("--") => return Err(ArgsError::UnknownOption(opt.to_string())),
            _ => endpoints.push(arg),
        }
    }

    if !endpoints.is_empty() {
        config.endpoints = endpoints;
    }
    Ok(config)
}

fn positive_amount(option: &str, value: Option<String>) -> Result<Amount, ArgsError> {
    let amount = Amount::new(value_of(option, value)?);
    if !amount.is_positive() {
        return Err(ArgsError::InvalidValue {
            option: option.to_string(),
            value: amount.to_string(),
        });
    }
    Ok(amount)
}

fn value_of<T: std::str::FromStr>(option: &str, value: Option<String>) -> Result<T, ArgsError> {
    let value = value.ok_or_else(|| ArgsError::MissingValue(option.to_string()))?;
    parse_value(option, value)
}

fn parse_value<T: std::str::FromStr>(option: &str, value: String) -> Result<T, ArgsError> {
    value.parse().map_err(|_| ArgsError::InvalidValue {
        option: option.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, ArgsError> {
        Command::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn default_customer_table() {
        let config = LedgerConfig::default();
        assert_eq!(config.customers.len(), 5);
        assert_eq!(config.customers[0], (1, Amount::new(100_000)));
        assert_eq!(config.customers[4], (5, Amount::new(500_000)));
    }

    #[test]
    fn serve_defaults_to_two_shared_listeners() {
        let Command::Serve(config) = parse(&["serve"]).unwrap() else {
            panic!("expected serve");
        };
        assert_eq!(config.ports, [3000, 3001]);
        assert_eq!(config.topology, Topology::Shared);
    }

    #[test]
    fn serve_with_isolated_ports() {
        let Command::Serve(config) =
            parse(&["serve", "--isolated", "--host", "0.0.0.0", "9999"]).unwrap()
        else {
            panic!("expected serve");
        };
        assert_eq!(config.ports, [9999]);
        assert_eq!(config.topology, Topology::Isolated);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn verify_defaults_match_race_script() {
        let Command::Verify(config) = parse(&["verify"]).unwrap() else {
            panic!("expected verify");
        };
        assert_eq!(config, VerifierConfig::default());
        assert_eq!(config.customer, 3);
        assert_eq!(config.count, 1000);
        assert_eq!(config.endpoints.len(), 2);
    }

    #[test]
    fn verify_with_options() {
        let Command::Verify(config) = parse(&[
            "verify",
            "--customer",
            "1",
            "--amount",
            "5",
            "--count",
            "20",
            "--credit",
            "--timeout-ms",
            "250",
            "http://localhost:9999",
        ])
        .unwrap() else {
            panic!("expected verify");
        };
        assert_eq!(config.customer, 1);
        assert_eq!(config.amount, Amount::new(5));
        assert_eq!(config.count, 20);
        assert_eq!(config.kind, TransactionKind::Credit);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.endpoints, ["http://localhost:9999"]);
    }

    #[test]
    fn verify_refuses_non_positive_amounts() {
        for value in ["0", "-1", "-9223372036854775808"] {
            assert_eq!(
                parse(&["verify", "--amount", value]),
                Err(ArgsError::InvalidValue {
                    option: "--amount".to_string(),
                    value: value.to_string(),
                })
            );
        }
    }

    #[test]
    fn invalid_arguments_are_reported() {
        assert_eq!(parse(&[]), Err(ArgsError::MissingCommand));
        assert_eq!(
            parse(&["bench"]),
            Err(ArgsError::UnknownCommand("bench".to_string()))
        );
        assert_eq!(
            parse(&["verify", "--count"]),
            Err(ArgsError::MissingValue("--count".to_string()))
        );
        assert_eq!(
            parse(&["serve", "port"]),
            Err(ArgsError::InvalidValue {
                option: "port".to_string(),
                value: "port".to_string()
            })
        );
        assert_eq!(
            parse(&["serve", "--fast"]),
            Err(ArgsError::UnknownOption("--fast".to_string()))
        );
    }
}
