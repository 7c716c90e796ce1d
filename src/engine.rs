//! Retrieval-augmented question answering.
//!
//! [`QaEngine`] owns the built index and the provider handles, and carries
//! an explicit lifecycle state: a construction failure produces an engine
//! in the `Unavailable` state rather than a process crash, and every later
//! `ask` on it returns the fixed uninitialized notice. Conversation memory
//! is owned by the caller and passed in by reference; the engine never
//! touches ambient state.
//!
//! All per-question failures (embedding call, model call) are converted to
//! an [`Answer`] value describing the problem — nothing escapes `ask`.

use tracing::{error, info, warn};

use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::generation::{self, ChatMessage, ChatModel};
use crate::index::EmbeddingIndex;
use crate::loader;
use crate::memory::ConversationMemory;
use crate::models::{Answer, Chunk, ConversationTurn};

/// Fixed response used while the engine is unavailable.
pub const UNINITIALIZED_ANSWER: &str =
    "The question answering engine is not initialized. Please check the logs.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a support assistant for product documentation. \
Use the provided context excerpts to answer the user's question. \
If the context does not contain the answer, say that you don't know instead of guessing.";

const CONDENSE_SYSTEM_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question. Respond with the question only.";

enum EngineState {
    Ready(ReadyEngine),
    Unavailable { reason: String },
}

struct ReadyEngine {
    index: EmbeddingIndex,
    embedder: Box<dyn Embedder>,
    chat: Box<dyn ChatModel>,
}

/// The question-answering engine. Built once at startup and shared by all
/// handlers for the life of the process.
pub struct QaEngine {
    state: EngineState,
    top_k: usize,
    max_history_turns: usize,
}

impl QaEngine {
    /// Build the engine from configuration. Never fails: corpus, provider,
    /// or index errors leave the engine in the unavailable state with the
    /// cause recorded.
    pub async fn bootstrap(config: &Config) -> Self {
        match Self::initialize(config).await {
            Ok(engine) => engine,
            Err(e) => {
                error!("QA engine initialization failed: {:#}", e);
                Self {
                    state: EngineState::Unavailable {
                        reason: format!("{:#}", e),
                    },
                    top_k: config.retrieval.top_k,
                    max_history_turns: config.memory.max_turns,
                }
            }
        }
    }

    async fn initialize(config: &Config) -> anyhow::Result<Self> {
        let chunks = loader::load_corpus(&config.corpus, config.chunking.max_tokens);
        if chunks.is_empty() {
            anyhow::bail!(
                "no documents loaded from '{}'",
                config.corpus.dir.display()
            );
        }

        let embedder = embedding::create_embedder(&config.embedding)?;
        let chat = generation::create_chat_model(&config.generation)?;

        info!(
            "embedding {} chunks with {}",
            chunks.len(),
            embedder.model_name()
        );
        let index =
            EmbeddingIndex::build(chunks, embedder.as_ref(), config.embedding.batch_size).await?;
        info!("QA engine ready: {} chunks indexed", index.len());

        Ok(Self::from_parts(
            index,
            embedder,
            chat,
            config.retrieval.top_k,
            config.memory.max_turns,
        ))
    }

    /// Assemble an engine from an already-built index and providers.
    pub fn from_parts(
        index: EmbeddingIndex,
        embedder: Box<dyn Embedder>,
        chat: Box<dyn ChatModel>,
        top_k: usize,
        max_history_turns: usize,
    ) -> Self {
        Self {
            state: EngineState::Ready(ReadyEngine {
                index,
                embedder,
                chat,
            }),
            top_k,
            max_history_turns,
        }
    }

    /// An engine that answers every question with the uninitialized notice.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Unavailable {
                reason: reason.into(),
            },
            top_k: 0,
            max_history_turns: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Why the engine is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            EngineState::Unavailable { reason } => Some(reason),
            EngineState::Ready(_) => None,
        }
    }

    /// Number of indexed chunks (0 when unavailable).
    pub fn indexed_chunks(&self) -> usize {
        match &self.state {
            EngineState::Ready(ready) => ready.index.len(),
            EngineState::Unavailable { .. } => 0,
        }
    }

    /// Answer a question using retrieved context and the session history.
    ///
    /// On success the turn is recorded in `memory`. Failures return an
    /// explanatory answer and leave the memory untouched, so one bad call
    /// never poisons the session.
    pub async fn ask(&self, memory: &mut ConversationMemory, question: &str) -> Answer {
        let ready = match &self.state {
            EngineState::Ready(ready) => ready,
            EngineState::Unavailable { .. } => return Answer::bare(UNINITIALIZED_ANSWER),
        };

        // Follow-up questions lean on pronouns; resolve them against the
        // history before retrieval.
        let standalone = if memory.is_empty() {
            question.to_string()
        } else {
            self.condense_question(ready, memory, question).await
        };

        let query_vec = match ready.embedder.embed_query(&standalone).await {
            Ok(vec) => vec,
            Err(e) => {
                warn!("query embedding failed: {:#}", e);
                return Answer::bare(format!(
                    "An error occurred while processing your question: {}",
                    e
                ));
            }
        };

        let hits = ready.index.search(&query_vec, self.top_k);
        let context = build_context(&hits);
        let supporting: Vec<Chunk> = hits.iter().map(|(chunk, _)| (*chunk).clone()).collect();

        let messages = self.build_answer_messages(memory, question, &context);
        let text = match ready.chat.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("answer generation failed: {:#}", e);
                return Answer::bare(format!(
                    "An error occurred while processing your question: {}",
                    e
                ));
            }
        };

        memory.append(ConversationTurn {
            question: question.to_string(),
            answer: text.clone(),
            sources: supporting.clone(),
        });

        Answer {
            text,
            supporting_chunks: supporting,
        }
    }

    /// Rephrase a follow-up into a standalone question. Falls back to the
    /// raw question when the model call fails; retrieval still proceeds.
    async fn condense_question(
        &self,
        ready: &ReadyEngine,
        memory: &ConversationMemory,
        question: &str,
    ) -> String {
        let transcript: String = memory
            .recent(self.max_history_turns)
            .iter()
            .map(|turn| format!("Human: {}\nAssistant: {}\n", turn.question, turn.answer))
            .collect();

        let messages = vec![
            ChatMessage::system(CONDENSE_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Chat history:\n{}\nFollow up question: {}",
                transcript, question
            )),
        ];

        match ready.chat.complete(&messages).await {
            Ok(standalone) => standalone,
            Err(e) => {
                warn!("question condensing failed, using raw question: {:#}", e);
                question.to_string()
            }
        }
    }

    fn build_answer_messages(
        &self,
        memory: &ConversationMemory,
        question: &str,
        context: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(ANSWER_SYSTEM_PROMPT)];

        for turn in memory.recent(self.max_history_turns) {
            messages.push(ChatMessage::user(turn.question.clone()));
            messages.push(ChatMessage::assistant(turn.answer.clone()));
        }

        messages.push(ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}",
            context, question
        )));

        messages
    }
}

/// Join retrieved chunk texts into a grounding context, each headed by its
/// provenance so the model can point back at sources.
fn build_context(hits: &[(&Chunk, f32)]) -> String {
    hits.iter()
        .map(|(chunk, _)| {
            format!(
                "[{} (page {})]\n{}",
                chunk.source_id, chunk.page_number, chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct TableEmbedder {
        dims: usize,
        table: HashMap<String, Vec<f32>>,
    }

    impl TableEmbedder {
        fn new(dims: usize, pairs: &[(&str, Vec<f32>)]) -> Self {
            let table = pairs
                .iter()
                .map(|(text, vec)| (text.to_string(), vec.clone()))
                .collect();
            Self { dims, table }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        fn model_name(&self) -> &str {
            "table-test"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    self.table
                        .get(t)
                        .cloned()
                        .unwrap_or_else(|| vec![0.0; self.dims])
                })
                .collect())
        }
    }

    struct StubChat {
        reply: String,
    }

    #[async_trait]
    impl ChatModel for StubChat {
        fn model_name(&self) -> &str {
            "stub-chat"
        }
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        fn model_name(&self) -> &str {
            "failing-chat"
        }
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            anyhow::bail!("model endpoint unreachable")
        }
    }

    fn chunk(text: &str, source_id: &str, page: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_id: source_id.to_string(),
            page_number: page,
        }
    }

    async fn ready_engine(reply: &str) -> QaEngine {
        let embedder = TableEmbedder::new(
            3,
            &[
                ("retry limits", vec![1.0, 0.0, 0.0]),
                ("install steps", vec![0.0, 1.0, 0.0]),
                ("What is the retry limit?", vec![1.0, 0.0, 0.0]),
            ],
        );
        let chunks = vec![
            chunk("retry limits", "manual.pdf", 4),
            chunk("install steps", "setup.md", 0),
        ];
        let index = EmbeddingIndex::build(chunks, &embedder, 8).await.unwrap();
        QaEngine::from_parts(
            index,
            Box::new(embedder),
            Box::new(StubChat {
                reply: reply.to_string(),
            }),
            2,
            6,
        )
    }

    #[tokio::test]
    async fn test_unavailable_engine_returns_fixed_answer() {
        let engine = QaEngine::unavailable("no documents loaded");
        let mut memory = ConversationMemory::new();

        let answer = engine.ask(&mut memory, "anything at all?").await;
        assert_eq!(answer.text, UNINITIALIZED_ANSWER);
        assert!(answer.supporting_chunks.is_empty());
        assert!(memory.is_empty(), "unavailable ask must not record a turn");

        // Same fixed answer regardless of question text.
        let again = engine.ask(&mut memory, "a different question").await;
        assert_eq!(again.text, UNINITIALIZED_ANSWER);
        assert!(memory.is_empty());
        assert!(!engine.is_ready());
        assert_eq!(engine.unavailable_reason(), Some("no documents loaded"));
    }

    #[tokio::test]
    async fn test_successful_ask_records_one_turn() {
        let engine = ready_engine("You can change it in the [retry] section.").await;
        let mut memory = ConversationMemory::new();

        let question = "What is the retry limit?";
        let answer = engine.ask(&mut memory, question).await;

        assert_eq!(answer.text, "You can change it in the [retry] section.");
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.history()[0].question, question);
        assert_eq!(memory.history()[0].answer, answer.text);
    }

    #[tokio::test]
    async fn test_supporting_chunks_in_retrieval_order() {
        let engine = ready_engine("Answered.").await;
        let mut memory = ConversationMemory::new();

        let answer = engine.ask(&mut memory, "What is the retry limit?").await;
        assert_eq!(answer.supporting_chunks.len(), 2);
        // The question embeds alongside "retry limits", so that chunk leads.
        assert_eq!(answer.supporting_chunks[0].source_id, "manual.pdf");
        assert_eq!(answer.supporting_chunks[0].page_number, 4);
        assert_eq!(answer.supporting_chunks[1].source_id, "setup.md");
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_answer_value() {
        let embedder = TableEmbedder::new(2, &[("doc", vec![1.0, 0.0])]);
        let index = EmbeddingIndex::build(vec![chunk("doc", "a.md", 0)], &embedder, 4)
            .await
            .unwrap();
        let engine = QaEngine::from_parts(index, Box::new(embedder), Box::new(FailingChat), 3, 6);
        let mut memory = ConversationMemory::new();

        let answer = engine.ask(&mut memory, "does this work?").await;
        assert!(answer.text.contains("An error occurred"));
        assert!(answer.supporting_chunks.is_empty());
        assert!(memory.is_empty(), "failed ask must not record a turn");
    }

    #[tokio::test]
    async fn test_follow_up_still_answers_and_grows_history() {
        let engine = ready_engine("Still answered.").await;
        let mut memory = ConversationMemory::new();

        engine.ask(&mut memory, "What is the retry limit?").await;
        let answer = engine.ask(&mut memory, "And how do I raise it?").await;

        assert_eq!(answer.text, "Still answered.");
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.history()[1].question, "And how do I raise it?");
    }
}
