/// Top-level command names, for completion.
pub const COMMAND_NAMES: &[&str] = &[
    "connect",
    "disconnect",
    "status",
    "address",
    "balance",
    "nfts",
    "refresh",
    "send",
    "help",
    "exit",
];

#[must_use]
pub fn help_text(command: Option<&str>) -> String {
    match command {
        Some("connect") => {
            "connect\n  Request account access from the wallet provider and load\n  balance and NFT listings for the first account.\n  Reconnecting replaces the current session.".to_string()
        }
        Some("disconnect") | Some("logout") => {
            "disconnect\n  End the session and clear all loaded data.\n  Alias: logout".to_string()
        }
        Some("status") => {
            "status\n  Show connection state, account, provider and indexer URL.".to_string()
        }
        Some("address") | Some("addr") => {
            "address\n  Show the connected account address.\n  Alias: addr".to_string()
        }
        Some("balance") | Some("bal") => {
            "balance\n  Show the native balance, rounded to three decimals.\n  Alias: bal".to_string()
        }
        Some("nfts") | Some("nft") => {
            "nfts [721|1155]\n  Show held ERC-721 and ERC-1155 tokens, or one standard only.\n  ipfs:// images are shown through the configured gateway.\n  Alias: nft".to_string()
        }
        Some("refresh") | Some("reload") => {
            "refresh\n  Reload balance and both NFT listings for the connected account.\n  Alias: reload".to_string()
        }
        Some("send") | Some("transfer") => {
            "send <contract> <token_id> <recipient> [amount]\n  Transfer ERC-1155 tokens with safeTransferFrom.\n  Amount defaults to 1 and must not exceed the listed balance.\n  The wallet provider signs; listings reload after confirmation.\n  Example: send 0xc0ffee...01 7 0x5aAe...eAed 2\n  Alias: transfer".to_string()
        }
        Some("exit") | Some("quit") | Some("q") => {
            "exit\n  Exit the viewer.\n  Aliases: quit, q".to_string()
        }
        Some(other) => format!("Unknown command: '{other}'. Type 'help' for a list."),
        None => {
            "Available commands:\n\
             \n\
             \x20 connect      Connect to the wallet provider\n\
             \x20 disconnect   End the session\n\
             \x20 status       Show connection status\n\
             \x20 address      Show connected address\n\
             \x20 balance      Show native balance\n\
             \x20 nfts         Show held NFTs\n\
             \x20 refresh      Reload balance and listings\n\
             \x20 send         Send ERC-1155 tokens\n\
             \x20 help         Show help for a command\n\
             \x20 exit         Exit the viewer\n\
             \n\
             Type 'help <command>' for details."
                .to_string()
        }
    }
}
