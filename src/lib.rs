//! # docbot
//!
//! A retrieval-augmented support bot that answers questions over a local
//! documentation corpus.
//!
//! docbot ingests a directory of documents (PDF, Markdown, plain text),
//! chunks and embeds them into an in-memory vector index, and answers
//! questions by retrieving the most relevant chunks and handing them to a
//! generative model together with the conversation history. Answers that
//! read as uncertain can be escalated into a tracked support ticket.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Corpus   │──▶│   Pipeline    │──▶│ Vector index   │
//! │ PDF/MD/TXT│   │ Chunk + Embed │   │ (in-memory)    │
//! └──────────┘   └──────────────┘   └───────┬───────┘
//!                                           │
//!                  ┌────────────┐   ┌───────▼───────┐
//!                  │ Conversation│◀─▶│   QA engine    │
//!                  │   memory    │   │ retrieve + gen │
//!                  └────────────┘   └───────┬───────┘
//!                                           │ uncertain?
//!                                   ┌───────▼───────┐
//!                                   │  Escalation →  │
//!                                   │  ticket store  │
//!                                   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docbot corpus                    # scan the corpus, report chunk counts
//! docbot ask "How do I upgrade?"   # one-shot question
//! docbot chat                      # interactive session with escalation
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and startup validation |
//! | [`models`] | Core data types |
//! | [`loader`] | Corpus discovery and text extraction |
//! | [`chunk`] | Paragraph-boundary text splitting |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | In-memory vector index |
//! | [`memory`] | Conversation turn history |
//! | [`generation`] | Generative chat provider abstraction |
//! | [`engine`] | Retrieval-augmented QA orchestration |
//! | [`uncertainty`] | Hedging-phrase answer classification |
//! | [`escalation`] | Uncertain answer → ticket request |
//! | [`ticket`] | In-memory ticket store |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod escalation;
pub mod generation;
pub mod index;
pub mod loader;
pub mod memory;
pub mod models;
pub mod ticket;
pub mod uncertainty;
