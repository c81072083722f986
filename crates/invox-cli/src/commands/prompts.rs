//! Prompts command - inspect the prompt template library.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use invox_core::PromptLibrary;

use super::load_prompts;

/// Arguments for the prompts command.
#[derive(Args)]
pub struct PromptsArgs {
    /// Extra prompt templates JSON file
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: PromptsCommand,
}

#[derive(Subcommand)]
enum PromptsCommand {
    /// List all templates
    List,

    /// Show a template's full text
    Show {
        /// Template code, e.g. invoice_google
        code: String,
    },
}

pub async fn run(args: PromptsArgs) -> anyhow::Result<()> {
    let library = load_prompts(args.file.as_deref())?;

    match args.command {
        PromptsCommand::List => list(&library),
        PromptsCommand::Show { code } => show(&library, &code),
    }
}

fn list(library: &PromptLibrary) -> anyhow::Result<()> {
    for template in library.templates() {
        let status = if template.active {
            style("active").green()
        } else {
            style("inactive").yellow()
        };

        println!(
            "{:<20} {:<8} {:<8} {:<10} {}",
            template.code,
            template.provider.code(),
            template.document_type.code(),
            status,
            template.name
        );
    }

    Ok(())
}

fn show(library: &PromptLibrary, code: &str) -> anyhow::Result<()> {
    let Some(template) = library.by_code(code) else {
        anyhow::bail!("No prompt template with code '{}'", code);
    };

    println!("{} ({})", style(&template.name).bold(), template.code);
    println!(
        "Provider: {}  Document type: {}",
        template.provider.code(),
        template.document_type.code()
    );
    println!();
    println!("{}", template.template);

    Ok(())
}
