//! # docbot CLI
//!
//! The `docbot` binary is the interface to the support bot. It provides
//! commands for inspecting the corpus, asking one-shot questions, and
//! running an interactive chat session with ticket escalation.
//!
//! ## Usage
//!
//! ```bash
//! docbot --config ./config/docbot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docbot corpus` | Scan the corpus and report document/chunk counts |
//! | `docbot ask "<question>"` | Answer a single question with sources |
//! | `docbot chat` | Interactive session; uncertain answers offer a ticket |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use docbot::config::{self, Config};
use docbot::engine::QaEngine;
use docbot::escalation::{escalate, Requester};
use docbot::loader;
use docbot::memory::ConversationMemory;
use docbot::models::Answer;
use docbot::ticket::TicketStore;

/// docbot — a retrieval-augmented support bot for local documentation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docbot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docbot",
    about = "docbot — a retrieval-augmented support bot for local documentation",
    version,
    long_about = "docbot ingests a directory of documents (PDF, Markdown, plain text), \
    indexes them with embeddings, and answers questions with a generative model grounded \
    in retrieved excerpts. Low-confidence answers can be escalated into support tickets."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the corpus and report document/chunk counts.
    ///
    /// Reads and chunks every matching document without calling any
    /// embedding or generation provider. Useful for verifying the corpus
    /// configuration before paying for an index build.
    Corpus,

    /// Ask a single question and print the answer with its sources.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Start an interactive chat session.
    ///
    /// Keeps conversation history across questions so follow-ups resolve,
    /// and offers ticket escalation when an answer looks uncertain.
    /// Session commands: `:tickets`, `:ticket`, `:reset`, `:help`, `:quit`.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docbot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Corpus => run_corpus(&cfg),
        Commands::Ask { question } => run_ask(&cfg, &question).await,
        Commands::Chat => run_chat(&cfg).await,
    }
}

fn run_corpus(cfg: &Config) -> Result<()> {
    let chunks = loader::load_corpus(&cfg.corpus, cfg.chunking.max_tokens);
    let documents: BTreeSet<&str> = chunks.iter().map(|c| c.source_id.as_str()).collect();

    println!("corpus scan");
    println!("  directory: {}", cfg.corpus.dir.display());
    println!("  documents: {}", documents.len());
    println!("  chunks: {}", chunks.len());
    println!("ok");
    Ok(())
}

async fn run_ask(cfg: &Config, question: &str) -> Result<()> {
    let engine = QaEngine::bootstrap(cfg).await;
    let mut memory = ConversationMemory::new();

    let answer = engine.ask(&mut memory, question).await;
    print_answer(&answer);

    if answer.is_uncertain() {
        println!();
        println!("This answer looks uncertain. Run `docbot chat` to escalate it into a support ticket.");
    }
    Ok(())
}

async fn run_chat(cfg: &Config) -> Result<()> {
    let engine = QaEngine::bootstrap(cfg).await;
    let mut memory = ConversationMemory::new();
    let mut tickets = TicketStore::new();
    let requester = Requester::from(&cfg.requester);

    // The question/answer pair eligible for escalation.
    let mut last_uncertain: Option<(String, String)> = None;

    println!("docbot chat — ask questions about your documentation. Type :help for commands.");
    if engine.is_ready() {
        println!("engine ready ({} chunks indexed)", engine.indexed_chunks());
    } else {
        println!(
            "engine unavailable: {}",
            engine.unavailable_reason().unwrap_or("unknown")
        );
    }
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match input {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":help" => {
                println!("  :tickets  list this session's support tickets");
                println!("  :ticket   escalate the last uncertain answer");
                println!("  :reset    clear the conversation history");
                println!("  :quit     leave the chat");
            }
            ":reset" => {
                memory.reset();
                last_uncertain = None;
                println!("Conversation history cleared.");
            }
            ":tickets" => {
                if tickets.list().is_empty() {
                    println!("No tickets created yet.");
                }
                for ticket in tickets.list() {
                    println!(
                        "Ticket {} [{}] {} ({})",
                        ticket.id,
                        ticket.status,
                        ticket.summary,
                        ticket.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            ":ticket" => match last_uncertain.take() {
                Some((question, answer_text)) => {
                    let request = escalate(&question, &answer_text, &requester);
                    let ticket = tickets.create(&request);
                    println!("Support ticket created! Ticket ID: {}", ticket.id);
                }
                None => println!("Nothing to escalate — no uncertain answer yet."),
            },
            question => {
                let answer = engine.ask(&mut memory, question).await;
                print_answer(&answer);

                if answer.is_uncertain() {
                    last_uncertain = Some((question.to_string(), answer.text.clone()));
                    println!();
                    println!("This answer looks uncertain. Type :ticket to create a support ticket.");
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if !answer.supporting_chunks.is_empty() {
        println!();
        println!("Sources:");
        for chunk in &answer.supporting_chunks {
            println!("  - {} (page {})", chunk.source_id, chunk.page_number);
        }
    }
}
