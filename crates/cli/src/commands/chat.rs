//! Chat command handler.
//!
//! Runs one query through the full answering pipeline and prints the
//! response with its sources and confidence.

use clap::Args;
use sahayak_core::{config::AppConfig, AppError, AppResult};
use sahayak_pipeline::{
    ChatRequest, InMemorySessionStore, JsonlQueryLog, QueryPipeline,
};
use sahayak_pipeline::synthesize::Synthesizer;
use sahayak_retrieval::index::SqliteIndex;
use sahayak_retrieval::{create_embedder, Retriever};
use std::sync::Arc;

/// Ask a question through the full answering pipeline
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The question to ask
    pub message: String,

    /// Session identifier for follow-up questions
    #[arg(short, long)]
    pub session: Option<String>,

    /// Include debug information
    #[arg(long)]
    pub debug: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");
        tracing::debug!("Chat command options: {:?}", self);

        let pipeline = build_pipeline(config)?;

        let mut request = ChatRequest::new(self.message.clone());
        if let Some(ref session) = self.session {
            request = request.with_session(session.clone());
        }
        if self.debug {
            request = request.with_debug();
        }

        let response = pipeline.handle(request).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("{}", response.response);

        if !response.sources.is_empty() {
            println!("\nSources:");
            for source in &response.sources {
                match &source.url {
                    Some(url) => println!(
                        "  - {} ({:.0}%) {}",
                        source.title, source.similarity, url
                    ),
                    None => println!("  - {} ({:.0}%)", source.title, source.similarity),
                }
            }
        }

        println!(
            "\nConfidence: {:.2} | Topic: {} | {:.2}s | Session: {}",
            response.confidence,
            response.topic_detected,
            response.processing_time,
            response.session_id
        );

        if let Some(ref debug_info) = response.debug {
            tracing::debug!("Debug info: {:?}", debug_info);
            println!(
                "Debug: kind={}, retrieved={}, verdict={}, index_unavailable={}",
                debug_info.query_kind.as_str(),
                debug_info.retrieved_count,
                debug_info.verdict,
                debug_info.index_unavailable
            );
        }

        Ok(())
    }
}

/// Wire up the pipeline from configuration.
pub fn build_pipeline(config: &AppConfig) -> AppResult<QueryPipeline> {
    let embedder = create_embedder(&config.embedding)?;

    let index = SqliteIndex::open(&config.index_db_path())?;
    let retriever = Retriever::new(Arc::new(index), config.retrieval.topic_boost);

    let client = sahayak_llm::create_client(
        &config.provider,
        config.llm.endpoint.as_deref(),
        config.api_key.as_deref(),
    )
    .map_err(AppError::Config)?;

    let synthesizer = Synthesizer::new(client, config.model.clone(), config.llm.clone())?;

    let qlog = JsonlQueryLog::new(config.query_log_path())?;

    Ok(QueryPipeline::new(
        config.clone(),
        embedder,
        retriever,
        synthesizer,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(qlog),
    ))
}
