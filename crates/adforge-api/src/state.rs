//! Application state.

use std::sync::Arc;

use adforge_llm_client::LlmClient;
use adforge_notion::{CreativeRepository, NotionClient};
use adforge_pipeline::{CreativePipeline, PipelineConfig, PollConfig};
use adforge_video_client::VideoClient;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<CreativePipeline>,
    pub records: Arc<CreativeRepository>,
}

impl AppState {
    /// Create new application state from startup configuration.
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let llm = Arc::new(LlmClient::new(config.llm.clone())?);
        let video = Arc::new(VideoClient::new(config.video.clone())?);
        let notion = NotionClient::new(config.notion.clone())?;
        let records = Arc::new(CreativeRepository::new(notion));

        let pipeline_config = PipelineConfig {
            max_generation_attempts: config.generation_attempts,
            poll: PollConfig {
                interval: config.poll_interval,
                max_attempts: config.poll_max_attempts,
                ..PollConfig::default()
            },
        };
        let pipeline = Arc::new(CreativePipeline::new(
            llm,
            video,
            Arc::clone(&records),
            pipeline_config,
        ));

        Ok(Self {
            config,
            pipeline,
            records,
        })
    }
}
