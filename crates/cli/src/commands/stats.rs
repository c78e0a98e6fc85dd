//! Stats command handler.
//!
//! Aggregates the append-only query log into usage statistics.

use clap::Args;
use sahayak_core::{config::AppConfig, AppError, AppResult};
use sahayak_pipeline::qlog;

/// Show query log statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = qlog::read_stats(&config.query_log_path())?;

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Query statistics");
        println!("  Total queries:       {}", stats.total_queries);

        if stats.total_queries == 0 {
            return Ok(());
        }

        println!("  Average confidence:  {:.3}", stats.average_confidence);
        println!(
            "  Average time:        {:.3}s",
            stats.average_processing_time
        );

        if let Some(last) = stats.last_query_at {
            println!("  Last query:          {}", last.to_rfc3339());
        }

        println!("  Topics:");
        for (topic, count) in &stats.topic_distribution {
            println!("    {:20} {}", topic, count);
        }

        Ok(())
    }
}
