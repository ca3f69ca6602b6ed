//! Tools command implementation.

use crate::agent::tool_definitions;
use crate::cli::{content_preview, Output};
use console::style;

/// List the tools the assistant can call.
pub fn run_tools(verbose: bool) -> anyhow::Result<()> {
    let tools = tool_definitions();

    Output::header(&format!("Available tools ({})", tools.len()));
    println!();

    for tool in &tools {
        println!("  {}", style(&tool.name).bold().cyan());
        if verbose {
            println!("    {}", tool.description);
            println!(
                "    {}",
                style(serde_json::to_string(&tool.parameters)?).dim()
            );
        } else {
            println!("    {}", style(content_preview(&tool.description, 90)).dim());
        }
    }
    println!();

    Ok(())
}
