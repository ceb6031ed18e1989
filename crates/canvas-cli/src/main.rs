use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use canvas_core::{paths, Config, ModelList, NodeId, Point};
use canvas_llm::HttpBackend;
use canvas_runtime::{CanvasSession, Delivery, Purpose, SessionConfig};
use clap::{Parser, Subcommand};
use colored::Colorize;

mod address;
mod logging;

use logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "chat-canvas")]
#[command(about = "Branching LLM conversations stored as a canvas document")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, short, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Canvas document to work on
    #[arg(long, short, env = "CHAT_CANVAS_FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the conversation tree
    Show {
        /// Include full responses
        #[arg(long)]
        full: bool,
    },
    /// Add a node with a prompt
    Add {
        prompt: String,
        /// Parent address, e.g. 0.1 (omit for a new root)
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
        /// Files whose contents are sent along with the prompt
        #[arg(long = "attach")]
        attach: Vec<String>,
    },
    /// Send a node's prompt to its model and wait for the answer
    Submit { node: String },
    /// Search the web for a node's prompt and keep the results as its response
    Search { node: String },
    /// Re-run every node from the root down to this one
    Rerun { node: String },
    /// Ask for follow-up questions and add them as children
    FollowUps { node: String },
    /// Add an empty child next to a node
    Fork { node: String },
    /// Add a child asking to explain a piece of a node's response
    Explain { node: String, selection: String },
    /// Copy a node and its subtree next to the original
    Clone { node: String },
    /// Remove a node and its subtree
    Delete { node: String },
    /// Move a node to a new position
    Move {
        node: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// List the models offered for new nodes
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = Config::new();
    let models = ModelList::load();
    let file = cli.file.unwrap_or_else(paths::default_document_path);

    log::debug!("Canvas document: {}", file.display());
    log::debug!("Default model: {}", models.default_model());

    if let Commands::Models = cli.command {
        for (i, model) in models.models().iter().enumerate() {
            if i == 0 {
                println!("{} {}", model.green(), "(default)".dimmed());
            } else {
                println!("{}", model);
            }
        }
        return Ok(());
    }

    let session_config = SessionConfig::from_config(&config, &models);
    let backend = Arc::new(HttpBackend::new(config));
    let mut session = CanvasSession::new(backend, session_config);
    if file.exists() {
        session.load(&file)?;
    }

    let changed = run(&mut session, cli.command).await?;
    if changed {
        save(&session, &file)?;
    }
    Ok(())
}

/// Returns whether the document needs saving
async fn run(session: &mut CanvasSession, command: Commands) -> Result<bool> {
    match command {
        Commands::Show { full } => {
            show(session, full);
            Ok(false)
        }
        Commands::Add {
            prompt,
            parent,
            model,
            x,
            y,
            attach,
        } => {
            let parent = parent
                .map(|parent| address::resolve(session.canvas(), &parent))
                .transpose()?;
            let node = session.create_node(parent, Point::new(x, y))?;
            session.set_prompt(node, prompt)?;
            if let Some(model) = model {
                session.set_model(node, model)?;
            }
            if !attach.is_empty() {
                session.set_attached_files(node, attach)?;
            }
            print_created(session, node);
            Ok(true)
        }
        Commands::Submit { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            session.submit(node)?;
            let deliveries = session.run_until_idle().await;
            report(session, deliveries);
            Ok(true)
        }
        Commands::Search { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            session.search(node)?;
            let deliveries = session.run_until_idle().await;
            report(session, deliveries);
            Ok(true)
        }
        Commands::Rerun { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            session.rerun(node)?;
            let deliveries = session.run_until_idle().await;
            report(session, deliveries);
            Ok(true)
        }
        Commands::FollowUps { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            session.generate_follow_ups(node)?;
            let deliveries = session.run_until_idle().await;
            report(session, deliveries);
            for child in session.canvas().get(node)?.children() {
                print_created(session, *child);
            }
            Ok(true)
        }
        Commands::Fork { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            let child = session.fork(node)?;
            print_created(session, child);
            Ok(true)
        }
        Commands::Explain { node, selection } => {
            let node = address::resolve(session.canvas(), &node)?;
            match session.explain_selection(node, &selection)? {
                Some(child) => {
                    print_created(session, child);
                    Ok(true)
                }
                None => {
                    println!("{}", "Nothing selected".yellow());
                    Ok(false)
                }
            }
        }
        Commands::Clone { node } => {
            let node = address::resolve(session.canvas(), &node)?;
            let clone = session.clone_branch(node)?;
            print_created(session, clone);
            Ok(true)
        }
        Commands::Delete { node } => {
            let target = address::resolve(session.canvas(), &node)?;
            let removed = session.canvas().subtree_pre_order(target).len();
            session.delete_subtree(target)?;
            println!("{}", format!("Deleted {} ({} node(s))", node, removed).green());
            Ok(true)
        }
        Commands::Move { node, x, y } => {
            let target = address::resolve(session.canvas(), &node)?;
            session.move_node(target, Point::new(x, y))?;
            println!("{}", format!("Moved {} to ({}, {})", node, x, y).green());
            Ok(true)
        }
        Commands::Models => Ok(false),
    }
}

fn save(session: &CanvasSession, file: &Path) -> Result<()> {
    session.save(file)?;
    log::info!("Saved canvas to {}", file.display());
    Ok(())
}

fn show(session: &CanvasSession, full: bool) {
    let canvas = session.canvas();
    if canvas.roots().is_empty() {
        println!("{}", "Canvas is empty".dimmed());
        return;
    }
    for entry in canvas.outline() {
        let Ok(node) = canvas.get(entry.id) else {
            continue;
        };
        let indices = canvas.path_indices(entry.id).unwrap_or_default();
        let indent = "  ".repeat(indices.len().saturating_sub(1));
        println!(
            "{}{} {} {}",
            indent,
            address::format(&indices).cyan(),
            node.prompt.trim(),
            format!("[{}]", node.model_id).dimmed()
        );
        if node.response_markdown.is_empty() {
            continue;
        }
        let response = if full {
            node.response_markdown.clone()
        } else {
            summarize(&node.response_markdown)
        };
        for line in response.lines() {
            println!("{}  {}", indent, line.dimmed());
        }
    }
}

fn summarize(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > 80 {
        let cut: String = first_line.chars().take(77).collect();
        format!("{}...", cut)
    } else if text.lines().nth(1).is_some() {
        format!("{} ...", first_line)
    } else {
        first_line.to_string()
    }
}

fn print_created(session: &CanvasSession, node: NodeId) {
    println!(
        "{}",
        format!("Created {}", address::describe(session.canvas(), node)).green()
    );
}

fn report(session: &CanvasSession, deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        let at = address::describe(session.canvas(), delivery.node);
        match (&delivery.outcome, delivery.purpose) {
            (Ok(text), Purpose::Answer) => {
                println!("{}", format!("== {} ==", at).cyan());
                println!("{}", text);
            }
            (Ok(_), Purpose::FollowUps) => {
                println!("{}", format!("Follow-up questions added under {}", at).green());
            }
            (Err(e), _) => {
                println!("{}", format!("{} failed: {}", at, e).red());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_responses_are_shown_whole() {
        assert_eq!(summarize("Done."), "Done.");
    }

    #[test]
    fn multi_line_responses_are_cut_after_the_first_line() {
        assert_eq!(summarize("First\nSecond"), "First ...");
        let long = "x".repeat(100);
        assert_eq!(summarize(&long), format!("{}...", "x".repeat(77)));
    }

    #[test]
    fn cli_parses_dotted_addresses() {
        let cli = Cli::parse_from(["chat-canvas", "move", "0.1", "10", "20.5"]);
        match cli.command {
            Commands::Move { node, x, y } => {
                assert_eq!(node, "0.1");
                assert_eq!((x, y), (10.0, 20.5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn cli_parses_search() {
        let cli = Cli::parse_from(["chat-canvas", "search", "1.0"]);
        assert!(matches!(cli.command, Commands::Search { node } if node == "1.0"));
    }
}
