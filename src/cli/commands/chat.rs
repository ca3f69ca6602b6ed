//! Interactive chat command.

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Example questions shown by the `examples` command.
pub const EXAMPLE_QUERIES: [&str; 5] = [
    "What are the top 5 selling wines?",
    "Show me trending beers this week",
    "What products are low in stock?",
    "Search for citrus flavor drinks",
    "Sales summary by category",
];

/// Run the interactive chat command.
pub async fn run_chat(debug: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lisearch doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut show_debug = debug || settings.chat.show_debug;
    let assistant = Assistant::from_settings(settings)?;
    let agent = assistant.agent();
    let mut session = assistant.new_session();

    println!("\n{}", style("LiSearch Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your store data, or 'exit' to quit. Commands: clear, debug, examples.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("debug") {
            show_debug = !show_debug;
            Output::info(&format!(
                "Debug info {}.",
                if show_debug { "on" } else { "off" }
            ));
            continue;
        }

        if input.eq_ignore_ascii_case("examples") {
            Output::header("Example queries");
            for example in EXAMPLE_QUERIES {
                Output::list_item(example);
            }
            println!();
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let outcome = session.send(&agent, input).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(result) => {
                Output::answer(&result.response);
                if show_debug {
                    Output::debug_info(&result);
                    println!();
                }
            }
            Err(e) => {
                Output::error(&format!("❌ Error: {}", e));
            }
        }
    }

    Ok(())
}
