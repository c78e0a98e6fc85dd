//! Search command handler.
//!
//! Direct retrieval against the passage index, bypassing synthesis.
//! Useful for debugging relevance and topic boosting.

use clap::Args;
use sahayak_core::{config::AppConfig, AppResult};
use sahayak_pipeline::intent;
use sahayak_retrieval::index::SqliteIndex;
use sahayak_retrieval::{create_embedder, Retriever, Topic};
use std::sync::Arc;

/// Search the passage index directly (debugging)
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Topic hint override (defaults to the classifier's label)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let embedder = create_embedder(&config.embedding)?;
        let index = SqliteIndex::open(&config.index_db_path())?;
        let retriever = Retriever::new(Arc::new(index), config.retrieval.topic_boost);

        let processed = intent::preprocess(&self.query);
        let topic = match self.topic {
            Some(ref label) => Topic::parse(label),
            None => intent::classify(&processed),
        };

        let embedding = embedder.embed(&processed).await?;
        let outcome = retriever.retrieve(&embedding, topic, self.top_k);

        if self.json {
            let results: Vec<serde_json::Value> = outcome
                .passages
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.passage.id,
                        "title": r.passage.title,
                        "topic": r.passage.topic,
                        "url": r.passage.url,
                        "distance": r.distance,
                        "similarity": r.similarity(),
                    })
                })
                .collect();

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "query": self.query,
                    "topic_hint": topic,
                    "index_unavailable": outcome.index_unavailable,
                    "results": results,
                }))?
            );
            return Ok(());
        }

        if outcome.index_unavailable {
            println!("Passage index unavailable.");
            return Ok(());
        }

        if outcome.passages.is_empty() {
            println!("No passages found.");
            return Ok(());
        }

        println!(
            "Top {} passages for \"{}\" (topic hint: {}):\n",
            outcome.passages.len(),
            self.query,
            topic
        );

        for (i, retrieved) in outcome.passages.iter().enumerate() {
            println!(
                "{}. {} [{}] distance={:.3} similarity={:.1}%",
                i + 1,
                retrieved.passage.title,
                retrieved.passage.topic,
                retrieved.distance,
                retrieved.similarity() * 100.0
            );
            if let Some(ref url) = retrieved.passage.url {
                println!("   {}", url);
            }
        }

        Ok(())
    }
}
