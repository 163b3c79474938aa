use std::fmt::{self, Write};

use crate::state::AppState;

const TITLE: &str = "Lit Secrets Web Demo";
const NOT_CONNECTED: &str = "Please connect your wallet to access the application.";
const SECRET_PLACEHOLDER: &str = "Enter Lit Secrets object..";
const PROMPT_PLACEHOLDER: &str =
    "This prompt will be processed through the encrypted api key in your lit secret";

/// Draw the screen for `state` as plain text.
pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = draw(state, &mut out);
    out
}

fn draw(state: &AppState, out: &mut String) -> fmt::Result {
    let header = match state.wallet_address {
        Some(address) => address.truncated(),
        None if state.is_connecting => "Connecting...".to_string(),
        None => "Connect Wallet".to_string(),
    };
    writeln!(out, "== {TITLE} ==  [{header}]")?;
    writeln!(out)?;

    if let Some(error) = &state.error {
        writeln!(out, "! {error}")?;
        writeln!(out)?;
    }

    if !state.is_connected() {
        return writeln!(out, "{NOT_CONNECTED}");
    }

    writeln!(out, "Lit Secret:")?;
    writeln!(out, "  {}", or_placeholder(&state.encrypted_data, SECRET_PLACEHOLDER))?;
    writeln!(out, "Prompt:")?;
    writeln!(out, "  {}", or_placeholder(&state.prompt, PROMPT_PLACEHOLDER))?;
    writeln!(out)?;

    let run = if state.is_loading {
        "Processing..."
    } else {
        "Run Lit Action"
    };
    writeln!(out, "[{run}]")?;

    if let Some(response) = state.response.as_deref().filter(|r| !r.is_empty()) {
        writeln!(out)?;
        writeln!(out, "Response:")?;
        for line in response.lines() {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
