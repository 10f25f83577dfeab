//! Line-oriented terminal front end for the flow.
//!
//! Each turn renders the current phase, reads one command and runs it.
//! Failed steps are not printed separately; the next screen shows the
//! recorded error.

use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::flow::{FlowController, Phase};
use crate::services::GatewayApi;
use crate::utils::{IDENTITY_MAX_LEN, IDENTITY_MIN_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        identity: String,
        friendly_name: String,
    },
    Verify(String),
    Challenge(String),
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((line, ""));

        match name.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "create" => {
                let (identity, friendly_name) = rest
                    .split_once(char::is_whitespace)
                    .map(|(identity, name)| (identity, name.trim()))
                    .unwrap_or((rest, ""));
                Command::Create {
                    identity: identity.to_string(),
                    friendly_name: friendly_name.to_string(),
                }
            }
            "verify" => Command::Verify(rest.to_string()),
            "challenge" => Command::Challenge(rest.to_string()),
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        }
    }
}

/// The text shown for the controller's current state.
pub struct Screen<'a, G>(pub &'a FlowController<G>);

impl<G: GatewayApi> fmt::Display for Screen<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flow = self.0;
        let current = flow.phase();

        writeln!(f)?;
        writeln!(f, "TOTP Authentication Demo")?;

        let steps: Vec<String> = Phase::ALL
            .iter()
            .map(|phase| {
                let mark = if phase.is_completed(current) {
                    "x"
                } else if *phase == current {
                    ">"
                } else {
                    " "
                };
                format!("[{}] {}. {}", mark, phase.step(), phase.title())
            })
            .collect();
        writeln!(f, "{}", steps.join("  ->  "))?;

        if let Some(error) = flow.error() {
            writeln!(f, "Error: {}", error)?;
        }

        match current {
            Phase::Setup => {
                writeln!(f, "Create a TOTP factor for a user id.")?;
                writeln!(
                    f,
                    "Identity: {}-{} characters, letters, digits and dashes.",
                    IDENTITY_MIN_LEN, IDENTITY_MAX_LEN
                )?;
                writeln!(f, "Command: create <identity> [friendly name]")?;
            }
            Phase::Register => {
                if let Some(factor) = flow.factor() {
                    writeln!(f, "Factor {} for {}", factor.factor_sid, factor.identity)?;
                    if let Some(binding) = &factor.binding {
                        if let Some(uri) = &binding.uri {
                            writeln!(f, "Provisioning URI: {}", uri)?;
                        }
                        if let Some(secret) = &binding.secret {
                            writeln!(f, "Secret (manual entry): {}", secret)?;
                            writeln!(f, "Save this secret securely, it won't be shown again.")?;
                        }
                    }
                }
                if let Some(result) = flow.verify_result() {
                    writeln!(
                        f,
                        "Verification status: {}",
                        result.status().unwrap_or("unknown")
                    )?;
                }
                writeln!(f, "Command: verify <6-digit code>")?;
            }
            Phase::Authenticate => {
                writeln!(f, "Your TOTP factor has been verified and activated.")?;
                if let Some(result) = flow.challenge_result() {
                    if result.is_approved() {
                        writeln!(f, "Authentication successful. The code was verified.")?;
                    } else {
                        writeln!(
                            f,
                            "Authentication failed. Status: {}",
                            result.status().unwrap_or("unknown")
                        )?;
                    }
                }
                writeln!(f, "Command: challenge <6-digit code>")?;
            }
        }

        writeln!(f, "Also: reset, help, quit")
    }
}

const HELP: &str = "\
create <identity> [friendly name]  enroll a new TOTP factor
verify <code>                      activate the factor with a code from your app
challenge <code>                   authenticate with a code from your app
reset                              start over
quit                               leave
";

/// Runs the interactive loop until `quit` or end of input.
pub async fn run<G, R, W>(
    flow: &mut FlowController<G>,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    G: GatewayApi,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output
            .write_all(Screen(&*flow).to_string().as_bytes())
            .await?;
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Help => output.write_all(HELP.as_bytes()).await?,
            Command::Unknown(name) => {
                output
                    .write_all(format!("Unknown command '{}'. Try 'help'.\n", name).as_bytes())
                    .await?
            }
            Command::Reset => flow.reset(),
            Command::Create {
                identity,
                friendly_name,
            } => {
                if let Err(e) = flow.create_factor(&identity, &friendly_name).await {
                    tracing::debug!(error = %e, "create failed");
                }
            }
            Command::Verify(code) => {
                if let Err(e) = flow.verify_factor(&code).await {
                    tracing::debug!(error = %e, "verify failed");
                }
            }
            Command::Challenge(code) => {
                if let Err(e) = flow.challenge(&code).await {
                    tracing::debug!(error = %e, "challenge failed");
                }
            }
        }
    }

    output.flush().await
}
