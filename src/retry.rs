//! Exponential-backoff retry policy wrapped around the request pipeline.
//!
//! Connection-class failures are re-attempted up to 3 times with a short doubling delay;
//! rate-limit responses get a larger budget of 6 attempts on a 60-second base, honoring
//! any server-provided Retry-After hint. Every other error is terminal.

// std
use std::time::Duration as StdDuration;
// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

const MAX_CONNECTION_ATTEMPTS: u32 = 3;
const MAX_RATE_LIMIT_ATTEMPTS: u32 = 6;
const CONNECTION_BASE_DELAY: StdDuration = StdDuration::from_millis(500);
const RATE_LIMIT_BASE_DELAY: StdDuration = StdDuration::from_secs(60);

/// Backoff budgets applied by the request pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts (including the first) for connection-class failures.
	pub max_connection_attempts: u32,
	/// Total attempts (including the first) for rate-limit responses.
	pub max_rate_limit_attempts: u32,
	/// Base delay doubled per connection-class attempt.
	pub connection_base_delay: StdDuration,
	/// Base delay doubled per rate-limit attempt.
	pub rate_limit_base_delay: StdDuration,
}
impl RetryPolicy {
	/// Creates the default policy (3 connection attempts, 6 rate-limit attempts).
	pub fn new() -> Self {
		Self {
			max_connection_attempts: MAX_CONNECTION_ATTEMPTS,
			max_rate_limit_attempts: MAX_RATE_LIMIT_ATTEMPTS,
			connection_base_delay: CONNECTION_BASE_DELAY,
			rate_limit_base_delay: RATE_LIMIT_BASE_DELAY,
		}
	}

	/// Overrides the connection-class attempt budget.
	pub fn with_max_connection_attempts(mut self, attempts: u32) -> Self {
		self.max_connection_attempts = attempts.max(1);

		self
	}

	/// Overrides the rate-limit attempt budget.
	pub fn with_max_rate_limit_attempts(mut self, attempts: u32) -> Self {
		self.max_rate_limit_attempts = attempts.max(1);

		self
	}

	/// Overrides the connection-class base delay.
	pub fn with_connection_base_delay(mut self, delay: StdDuration) -> Self {
		self.connection_base_delay = delay;

		self
	}

	/// Overrides the rate-limit base delay.
	pub fn with_rate_limit_base_delay(mut self, delay: StdDuration) -> Self {
		self.rate_limit_base_delay = delay;

		self
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new()
	}
}

/// Per-operation attempt counters evaluated against a [`RetryPolicy`].
#[derive(Debug)]
pub(crate) struct RetryState<'a> {
	policy: &'a RetryPolicy,
	connection_attempts: u32,
	rate_limit_attempts: u32,
}
impl<'a> RetryState<'a> {
	pub(crate) fn new(policy: &'a RetryPolicy) -> Self {
		Self { policy, connection_attempts: 0, rate_limit_attempts: 0 }
	}

	/// Returns the delay to sleep before the next attempt, or `None` when the error is
	/// terminal or its budget is exhausted.
	pub(crate) fn next_delay(&mut self, error: &Error) -> Option<StdDuration> {
		match error {
			Error::Connection(_) => {
				self.connection_attempts += 1;

				if self.connection_attempts >= self.policy.max_connection_attempts {
					return None;
				}

				Some(jittered(exponential(
					self.policy.connection_base_delay,
					self.connection_attempts,
				)))
			},
			Error::RateLimit { retry_after } => {
				self.rate_limit_attempts += 1;

				if self.rate_limit_attempts >= self.policy.max_rate_limit_attempts {
					return None;
				}

				let computed = jittered(exponential(
					self.policy.rate_limit_base_delay,
					self.rate_limit_attempts,
				));
				let hinted = retry_after
					.and_then(|hint| StdDuration::try_from(hint).ok())
					.unwrap_or(StdDuration::ZERO);

				Some(computed.max(hinted))
			},
			_ => None,
		}
	}
}

fn exponential(base: StdDuration, attempt: u32) -> StdDuration {
	base.saturating_mul(1_u32 << (attempt - 1).min(16))
}

/// Equal jitter: half the computed delay is kept, the other half is randomized, so the
/// schedule stays monotonically increasing on average without synchronizing clients.
fn jittered(delay: StdDuration) -> StdDuration {
	let millis = delay.as_millis().min(u128::from(u64::MAX)) as u64;

	if millis < 2 {
		return delay;
	}

	let half = millis / 2;
	let spread = rand::rng().random_range(0..=half);

	StdDuration::from_millis(half + spread)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{ApiError, ConnectionError};

	fn policy() -> RetryPolicy {
		RetryPolicy::new()
			.with_connection_base_delay(StdDuration::from_millis(100))
			.with_rate_limit_base_delay(StdDuration::from_millis(100))
	}

	#[test]
	fn connection_errors_get_three_attempts_total() {
		let policy = policy();
		let mut state = RetryState::new(&policy);
		let error = Error::from(ConnectionError::Timeout);

		assert!(state.next_delay(&error).is_some());
		assert!(state.next_delay(&error).is_some());
		assert!(state.next_delay(&error).is_none());
	}

	#[test]
	fn rate_limit_errors_get_six_attempts_total() {
		let policy = policy();
		let mut state = RetryState::new(&policy);
		let error = Error::RateLimit { retry_after: None };
		let retries =
			std::iter::from_fn(|| state.next_delay(&error)).take(10).collect::<Vec<_>>();

		assert_eq!(retries.len(), 5);
	}

	#[test]
	fn delays_grow_with_the_attempt_number() {
		assert_eq!(
			exponential(StdDuration::from_millis(100), 1),
			StdDuration::from_millis(100),
		);
		assert_eq!(
			exponential(StdDuration::from_millis(100), 3),
			StdDuration::from_millis(400),
		);
	}

	#[test]
	fn jitter_keeps_delays_within_bounds() {
		let delay = StdDuration::from_millis(400);

		for _ in 0..32 {
			let sampled = jittered(delay);

			assert!(sampled >= StdDuration::from_millis(200));
			assert!(sampled <= delay);
		}
	}

	#[test]
	fn retry_after_hints_floor_the_computed_delay() {
		let policy = policy();
		let mut state = RetryState::new(&policy);
		let error = Error::RateLimit { retry_after: Some(Duration::seconds(30)) };
		let delay = state.next_delay(&error).expect("First rate-limit attempt should retry.");

		assert!(delay >= StdDuration::from_secs(30));
	}

	#[test]
	fn terminal_errors_are_never_retried() {
		let policy = policy();
		let mut state = RetryState::new(&policy);

		assert!(state.next_delay(&Error::authentication("bad key")).is_none());
		assert!(state.next_delay(&Error::from(ApiError::with_message(500, "boom"))).is_none());
	}
}
