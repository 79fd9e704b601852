use std::{fmt, sync::LazyLock, time::Duration};

use regex::Regex;
use tokio::time;

use gridseek_config::Config;
use gridseek_providers::LlmProvider;

use crate::{ServiceError, ServiceResult, schema::ResponseSchema};

const FENCE_PATTERN: &str = r"(?s)```(?:json)?\s*(.*?)\s*```";

static FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(FENCE_PATTERN).ok());

/// Attempt budget and pacing for one validated model call.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
	/// Total model calls, first attempt included.
	pub max_attempts: u32,
	pub call_timeout: Duration,
	pub base_backoff: Duration,
	pub max_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			max_attempts: cfg.search.max_attempts.max(1),
			call_timeout: Duration::from_millis(cfg.providers.llm.timeout_ms),
			base_backoff: Duration::from_millis(cfg.search.retry_backoff_ms),
			max_backoff: Duration::from_millis(cfg.search.max_backoff_ms),
		}
	}

	/// Delay before retrying after the `failures`-th transport failure: doubles each time,
	/// capped at `max_backoff`.
	pub fn backoff(&self, failures: u32) -> Duration {
		let factor = 1_u32 << failures.saturating_sub(1).min(16);

		self.base_backoff.saturating_mul(factor).min(self.max_backoff)
	}
}

/// Why one attempt produced no value.
#[derive(Debug)]
pub enum AttemptFailure {
	/// The model call itself failed (network, HTTP status, unreadable envelope).
	Provider(gridseek_providers::Error),
	/// The model call did not finish within the per-call timeout.
	Timeout(Duration),
	/// The model answered, but not with the expected JSON shape.
	Malformed(String),
}
impl AttemptFailure {
	/// Transport failures are paced with backoff; malformed output is retried right away.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Provider(_) | Self::Timeout(_))
	}
}
impl fmt::Display for AttemptFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Provider(err) => write!(f, "provider call failed: {err}"),
			Self::Timeout(limit) => write!(f, "provider call timed out after {}ms", limit.as_millis()),
			Self::Malformed(reason) => write!(f, "malformed response: {reason}"),
		}
	}
}

/// Removes a surrounding ```` ``` ```` or ```` ```json ```` fence if one is present; otherwise
/// returns the trimmed text unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
	FENCE
		.as_ref()
		.and_then(|re| re.captures(raw))
		.and_then(|caps| caps.get(1))
		.map(|inner| inner.as_str().trim())
		.unwrap_or_else(|| raw.trim())
}

/// Parses raw model text into `T`, rejecting anything that does not fit the schema.
pub fn parse_response<T>(raw: &str) -> Result<T, String>
where
	T: ResponseSchema,
{
	let stripped = strip_code_fence(raw);
	let value: T = serde_json::from_str(stripped).map_err(|err| err.to_string())?;

	value.check()?;

	Ok(value)
}

/// Sends `prompt` until the response validates as `T` or the attempt budget runs out.
///
/// The prompt is identical on every attempt. The first valid response is returned
/// immediately. Exhaustion yields [`ServiceError::Validation`] naming `context`.
pub async fn generate_validated<T>(
	llm: &dyn LlmProvider,
	model: &str,
	prompt: &str,
	policy: &RetryPolicy,
	context: &str,
) -> ServiceResult<T>
where
	T: ResponseSchema,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut transport_failures = 0_u32;
	let mut last_failure = None;

	for attempt in 1..=max_attempts {
		let failure = match time::timeout(policy.call_timeout, llm.generate(model, prompt)).await {
			Err(_) => AttemptFailure::Timeout(policy.call_timeout),
			// The HTTP client enforces the same limit and may fire first.
			Ok(Err(err)) if err.is_timeout() => AttemptFailure::Timeout(policy.call_timeout),
			Ok(Err(err)) => AttemptFailure::Provider(err),
			Ok(Ok(raw)) => match parse_response::<T>(&raw) {
				Ok(value) => {
					tracing::info!(context, attempt, "Model response validated.");

					return Ok(value);
				},
				Err(reason) => {
					tracing::debug!(context, attempt, response_chars = raw.len(), "Rejected model response.");

					AttemptFailure::Malformed(reason)
				},
			},
		};

		tracing::warn!(context, attempt, max_attempts, error = %failure, "Validation failed.");

		if failure.is_transport() && attempt < max_attempts {
			transport_failures += 1;

			let delay = policy.backoff(transport_failures);

			tracing::info!(context, delay_ms = delay.as_millis() as u64, "Backing off before retry.");

			time::sleep(delay).await;
		}

		last_failure = Some(failure);
	}

	Err(ServiceError::Validation {
		context: context.to_string(),
		attempts: max_attempts,
		last_error: last_failure.map(|failure| failure.to_string()).unwrap_or_default(),
	})
}
