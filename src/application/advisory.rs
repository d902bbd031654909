use crate::domain::money::Money;
use crate::domain::ports::AdvisoryTextProvider;
use crate::error::DispatchError;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const FALLBACK_INSIGHT: &str = "Route optimized for safety and speed.";
pub const FALLBACK_BRIEFING: &str = "Operations running smoothly.";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Asks the text collaborator for advisory copy and never fails.
///
/// Missing provider, provider errors, timeouts and blank answers all yield
/// a fixed fallback string.
#[derive(Clone)]
pub struct AdvisoryService {
    provider: Option<Arc<dyn AdvisoryTextProvider>>,
    timeout: Duration,
}

impl AdvisoryService {
    /// Creates a new advisory service with the default five second timeout.
    pub fn new(provider: Option<Arc<dyn AdvisoryTextProvider>>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// An advisory service that always answers with the fallback.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A short line explaining a quoted fare.
    pub async fn ride_insight(&self, origin: &str, destination: &str, price: Money) -> String {
        let prompt = format!(
            "Provide a very short, witty explanation of why a ride from {origin} to {destination} \
             costs ${:.2}. Mention one imaginary local landmark or traffic condition. \
             Keep it under 20 words.",
            price.value()
        );
        self.generate_or(&prompt, FALLBACK_INSIGHT).await
    }

    /// A one-paragraph summary for administrators.
    pub async fn operations_briefing(&self, active_rides: usize, revenue: Money) -> String {
        let prompt = format!(
            "You are a logistics consultant. Briefly summarize performance: {active_rides} active \
             rides and ${revenue} revenue. Suggest one growth tip."
        );
        self.generate_or(&prompt, FALLBACK_BRIEFING).await
    }

    async fn generate_or(&self, prompt: &str, fallback: &str) -> String {
        let Some(provider) = &self.provider else {
            return fallback.to_string();
        };
        let outcome = match tokio::time::timeout(self.timeout, provider.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::AdvisoryUnavailable(format!(
                "no answer within {:?}",
                self.timeout
            ))),
        };
        match outcome {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback.to_string(),
            Err(err) => {
                warn!(error = %err, "advisory text unavailable, using fallback");
                fallback.to_string()
            }
        }
    }
}
