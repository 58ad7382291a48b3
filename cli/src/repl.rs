//! REPL shell: Reedline-based interactive viewer session.
use anyhow::Result;
use reedline::{DefaultCompleter, DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use somnia_viewer_core::address::short_address;
use somnia_viewer_core::commands::{Command, ExecContext, COMMAND_NAMES};
use somnia_viewer_core::{ConnectionSession, SessionNotice, ViewerConfig};
use tokio::sync::broadcast::{self, error::TryRecvError};

const ALIASES: &[&str] = &[
    "logout", "addr", "bal", "nft", "reload", "transfer", "quit", "q",
];

pub async fn run_repl(
    session: &ConnectionSession,
    ctx: &ExecContext,
    config: &ViewerConfig,
) -> Result<()> {
    println!("Somnia Viewer v{}", env!("CARGO_PKG_VERSION"));
    println!("Indexer:  {}", ctx.api_base);
    if session.has_provider() {
        println!("Provider: {}", config.provider_url);
    } else {
        println!("Provider: none (connect is unavailable)");
    }
    println!("Type 'connect' to load your wallet, 'help' for a list of commands.");
    println!();

    let mut notices = session.notices();

    let commands: Vec<String> = COMMAND_NAMES
        .iter()
        .chain(ALIASES)
        .map(|s| s.to_string())
        .collect();
    let completer = Box::new(DefaultCompleter::new(commands));
    let mut line_editor = Reedline::create().with_completer(completer);

    loop {
        print_notices(&mut notices);
        let prompt = build_prompt(session).await;

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match Command::parse(line) {
                    Ok(Command::Exit) => {
                        println!("Goodbye.");
                        break;
                    }
                    Ok(cmd) => {
                        if let Some(prompt_msg) = cmd.confirmation_prompt() {
                            if !prompt_confirm(&prompt_msg) {
                                println!("Cancelled.");
                                continue;
                            }
                        }
                        match cmd.execute(session, ctx, false).await {
                            Ok(output) => {
                                if !output.is_empty() {
                                    println!("{output}");
                                }
                            }
                            Err(e) => {
                                eprintln!("Error: {e}");
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("{e}");
                    }
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!("Goodbye.");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}

async fn build_prompt(session: &ConnectionSession) -> DefaultPrompt {
    let label = match session.session().await {
        Some(info) => format!("[viewer {}]", short_address(&info.address)),
        None => "[viewer disconnected]".to_string(),
    };
    DefaultPrompt::new(
        DefaultPromptSegment::Basic(label),
        DefaultPromptSegment::Empty,
    )
}

/// Print lifecycle notices that arrived since the last prompt.
fn print_notices(notices: &mut broadcast::Receiver<SessionNotice>) {
    loop {
        match notices.try_recv() {
            Ok(notice) => print_notice(&notice),
            Err(TryRecvError::Lagged(skipped)) => {
                eprintln!("({skipped} session notices dropped)");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn print_notice(notice: &SessionNotice) {
    match notice {
        // Shown by the command output itself.
        SessionNotice::Connected(_) | SessionNotice::TransferConfirmed(_) => {}
        SessionNotice::AccountSwitched(address) => {
            println!("* Wallet switched to {}. Reloading.", short_address(address));
        }
        SessionNotice::Disconnected(reason) => {
            println!("* Session ended: {reason}");
        }
        SessionNotice::ReloadRequired { chain_id } => {
            println!("* Network changed (chain {chain_id}). Type 'connect' to reload.");
        }
    }
}

fn prompt_confirm(prompt: &str) -> bool {
    use std::io::Write;
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush().ok();
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
}
