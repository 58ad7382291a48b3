use anyhow::{bail, Result};

use super::Command;
use crate::indexer::TokenStandard;

const SEND_USAGE: &str = "Usage: send <contract> <token_id> <recipient> [amount]";

fn parse_standard(arg: &str) -> Result<TokenStandard> {
    match arg.to_lowercase().as_str() {
        "721" | "erc721" | "erc-721" => Ok(TokenStandard::Erc721),
        "1155" | "erc1155" | "erc-1155" => Ok(TokenStandard::Erc1155),
        other => bail!("Unknown token standard '{other}'. Use 721 or 1155."),
    }
}

impl Command {
    /// Parse a command from a raw input string.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let Some(cmd) = parts.next() else {
            bail!("No command entered. Type 'help' for a list of commands.");
        };
        let args: Vec<&str> = parts.collect();

        match cmd.to_lowercase().as_str() {
            "connect" => Ok(Command::Connect),

            "disconnect" | "logout" => Ok(Command::Disconnect),

            "status" => Ok(Command::Status),

            "address" | "addr" => Ok(Command::Address),

            "balance" | "bal" => Ok(Command::Balance),

            "nfts" | "nft" => match args.as_slice() {
                [] => Ok(Command::Nfts { standard: None }),
                [standard] => Ok(Command::Nfts {
                    standard: Some(parse_standard(standard)?),
                }),
                _ => bail!("Too many arguments. Usage: nfts [721|1155]"),
            },

            "refresh" | "reload" => Ok(Command::Refresh),

            "send" | "transfer" => {
                let (contract, token_id, recipient, amount) = match args.as_slice() {
                    [contract, token_id, recipient] => (*contract, *token_id, *recipient, "1"),
                    [contract, token_id, recipient, amount] => {
                        (*contract, *token_id, *recipient, *amount)
                    }
                    [] => bail!("Missing contract. {SEND_USAGE}"),
                    [_] => bail!("Missing token id. {SEND_USAGE}"),
                    [_, _] => bail!("Missing recipient. {SEND_USAGE}"),
                    _ => bail!("Too many arguments. {SEND_USAGE}"),
                };
                Ok(Command::Send {
                    contract: contract.to_string(),
                    token_id: token_id.to_string(),
                    recipient: recipient.to_string(),
                    amount: amount.to_string(),
                })
            }

            "help" | "h" | "?" => Ok(Command::Help {
                command: args.first().map(|s| s.to_lowercase()),
            }),

            "exit" | "quit" | "q" => Ok(Command::Exit),

            other => bail!("Unknown command: '{other}'. Type 'help' for a list of commands."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_balance() {
        assert_eq!(Command::parse("balance").unwrap(), Command::Balance);
        assert_eq!(Command::parse("bal").unwrap(), Command::Balance);
        assert_eq!(Command::parse("  BALANCE  ").unwrap(), Command::Balance);
    }

    #[test]
    fn parse_lifecycle() {
        assert_eq!(Command::parse("connect").unwrap(), Command::Connect);
        assert_eq!(Command::parse("disconnect").unwrap(), Command::Disconnect);
        assert_eq!(Command::parse("reload").unwrap(), Command::Refresh);
        assert_eq!(Command::parse("q").unwrap(), Command::Exit);
    }

    #[test]
    fn parse_nfts() {
        assert_eq!(
            Command::parse("nfts").unwrap(),
            Command::Nfts { standard: None }
        );
        assert_eq!(
            Command::parse("nfts 721").unwrap(),
            Command::Nfts {
                standard: Some(TokenStandard::Erc721)
            }
        );
        assert_eq!(
            Command::parse("nft ERC-1155").unwrap(),
            Command::Nfts {
                standard: Some(TokenStandard::Erc1155)
            }
        );
        assert!(Command::parse("nfts 20").is_err());
    }

    #[test]
    fn parse_send() {
        let cmd = Command::parse(
            "send 0x00000000000000000000000000000000000000c0 7 0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed 3",
        )
        .unwrap();
        match cmd {
            Command::Send {
                contract,
                token_id,
                recipient,
                amount,
            } => {
                assert_eq!(contract, "0x00000000000000000000000000000000000000c0");
                assert_eq!(token_id, "7");
                assert_eq!(recipient, "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
                assert_eq!(amount, "3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_send_defaults_amount_to_one() {
        let cmd = Command::parse("send 0xc0 7 0xabc").unwrap();
        assert!(matches!(cmd, Command::Send { ref amount, .. } if amount == "1"));
    }

    #[test]
    fn parse_send_missing_args() {
        let err = Command::parse("send 0xc0").unwrap_err();
        assert!(err.to_string().contains("Missing token id"));
        assert!(Command::parse("send 0xc0 7 0xabc 1 extra").is_err());
    }

    #[test]
    fn parse_help() {
        assert_eq!(
            Command::parse("help send").unwrap(),
            Command::Help {
                command: Some("send".into())
            }
        );
        assert_eq!(Command::parse("?").unwrap(), Command::Help { command: None });
    }

    #[test]
    fn parse_errors() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }
}
