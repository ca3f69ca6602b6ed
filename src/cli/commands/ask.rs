//! Ask command implementation.

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, debug: bool, json: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lisearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let show_debug = debug || settings.chat.show_debug;
    let assistant = Assistant::from_settings(settings)?;
    let session = assistant.new_session();

    let spinner = Output::spinner("Thinking...");
    let outcome = assistant.agent().run(question, &session.history()).await;
    spinner.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    Output::answer(&result.response);
    if show_debug {
        Output::debug_info(&result);
    }

    Ok(())
}
