use crate::fetcher::HeadlineSource;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::summarizer::TopicSummarizer;
use crate::types::{NewsAnalysis, Result, TopicResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const POLITENESS_DELAY: Duration = Duration::from_secs(1);

/// Drives the per-topic fetch → summarize pipeline for one request.
///
/// Topics run sequentially in request order. Each topic takes one slot from
/// the shared rate limiter, then runs fetch+summarize as a single retried
/// unit: a transient failure in either stage triggers a fresh fetch, since
/// a digest is cheap to reacquire and must not outlive a failed attempt.
/// A topic that exhausts its retries degrades to a `Failed` entry; it never
/// aborts the rest of the batch.
pub struct TopicCoordinator {
    source: Arc<dyn HeadlineSource>,
    summarizer: TopicSummarizer,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    politeness_delay: Duration,
}

impl TopicCoordinator {
    pub fn new(
        source: Arc<dyn HeadlineSource>,
        summarizer: TopicSummarizer,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            source,
            summarizer,
            limiter,
            retry: RetryPolicy::default(),
            politeness_delay: POLITENESS_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    /// Process all topics and return one result entry per topic, in
    /// request order.
    pub async fn run(&self, topics: &[String]) -> NewsAnalysis {
        let mut analysis = NewsAnalysis::new();

        for topic in topics {
            self.limiter.acquire().await;

            match self.retry.run(|| self.process_topic(topic)).await {
                Ok(summary) => {
                    info!("topic '{}' summarized", topic);
                    analysis.insert(topic.clone(), TopicResult::Summary(summary));
                }
                Err(error) => {
                    warn!("topic '{}' failed after retries: {}", topic, error);
                    analysis.insert(topic.clone(), TopicResult::Failed(error.to_string()));
                }
            }

            // Fixed delay toward the feed host, on top of the rate limiter.
            tokio::time::sleep(self.politeness_delay).await;
        }

        analysis
    }

    async fn process_topic(&self, topic: &str) -> Result<String> {
        let digest = self.source.fetch(topic).await?;
        self.summarizer.summarize(&digest).await
    }
}
