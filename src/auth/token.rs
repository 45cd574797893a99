//! Token record structs, lifecycle helpers, and the client-owned token slot.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Marker distinguishing plain bearer tokens from JWT service tokens.
///
/// Service-account tokens must be announced with an `X-Bearer-Token-Type: JWT` request
/// header; the pipeline reads this marker to decide whether to attach it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BearerType {
	/// Standard opaque bearer token.
	#[default]
	Bearer,
	/// Signed JWT issued through the service-assertion grant.
	Jwt,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Record describing one issued access token.
///
/// Records are replaced wholesale on refresh; the fields are never mutated in place.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the token endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Issued-at instant recorded from the token endpoint response.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus expires_in or an absolute expiry.
	pub expires_at: OffsetDateTime,
	/// Bearer-type marker read by the request pipeline.
	pub bearer_type: BearerType,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::new()
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("bearer_type", &self.bearer_type)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	bearer_type: BearerType,
}
impl TokenRecordBuilder {
	fn new() -> Self {
		Self::default()
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Marks the record as a JWT service token.
	pub fn bearer_type(mut self, bearer_type: BearerType) -> Self {
		self.bearer_type = bearer_type;

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord {
			access_token,
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
			bearer_type: self.bearer_type,
		})
	}
}

/// Side-effecting hook invoked whenever the client stores a rotated token.
pub type TokenSaver = Arc<dyn Fn(&TokenRecord) + Send + Sync>;

/// Single-writer holder for the client's active token.
///
/// At most one record is held at a time. [`store`](TokenSlot::store) swaps the record
/// under one lock write, so concurrent readers observe either the old or the new token,
/// never a partially-updated one, and then invokes the optional saver hook.
#[derive(Clone, Default)]
pub struct TokenSlot {
	inner: Arc<RwLock<Option<TokenRecord>>>,
	saver: Option<TokenSaver>,
}
impl TokenSlot {
	/// Creates an empty slot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches a saver hook invoked on every successful store.
	pub fn with_saver(mut self, saver: TokenSaver) -> Self {
		self.saver = Some(saver);

		self
	}

	/// Returns a clone of the active record, if any.
	pub fn current(&self) -> Option<TokenRecord> {
		self.inner.read().clone()
	}

	/// Replaces the active record and notifies the saver hook.
	pub fn store(&self, record: TokenRecord) {
		*self.inner.write() = Some(record.clone());

		if let Some(saver) = &self.saver {
			saver(&record);
		}
	}

	/// Drops the active record.
	pub fn clear(&self) {
		*self.inner.write() = None;
	}
}
impl Debug for TokenSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSlot")
			.field("held", &self.inner.read().is_some())
			.field("saver_set", &self.saver.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn builder_handles_relative_expiry() {
		let record = TokenRecord::builder()
			.access_token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(30))
			.build()
			.expect("Token record builder should support relative expiry calculations.");

		assert_eq!(record.expires_at, macros::datetime!(2025-01-01 00:30 UTC));
		assert!(record.is_expired_at(macros::datetime!(2025-01-01 00:30 UTC)));
		assert!(!record.is_expired_at(macros::datetime!(2025-01-01 00:29 UTC)));
	}

	#[test]
	fn builder_requires_access_token_and_expiry() {
		assert!(matches!(
			TokenRecord::builder().expires_in(Duration::hours(1)).build(),
			Err(TokenRecordBuilderError::MissingAccessToken),
		));
		assert!(matches!(
			TokenRecord::builder().access_token("secret").build(),
			Err(TokenRecordBuilderError::MissingExpiry),
		));
	}

	#[test]
	fn slot_swaps_records_and_notifies_saver() {
		let saved = Arc::new(RwLock::new(Vec::new()));
		let sink = saved.clone();
		let slot = TokenSlot::new().with_saver(Arc::new(move |record: &TokenRecord| {
			sink.write().push(record.access_token.expose().to_owned());
		}));

		assert!(slot.current().is_none());

		let record = TokenRecord::builder()
			.access_token("first")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token record fixture should build.");

		slot.store(record);
		slot.store(
			TokenRecord::builder()
				.access_token("second")
				.expires_in(Duration::hours(1))
				.build()
				.expect("Rotated token record fixture should build."),
		);

		assert_eq!(
			slot.current().map(|record| record.access_token.expose().to_owned()).as_deref(),
			Some("second"),
		);
		assert_eq!(*saved.read(), vec!["first".to_owned(), "second".to_owned()]);

		slot.clear();

		assert!(slot.current().is_none());
	}

	#[test]
	fn debug_output_never_contains_secrets() {
		let record = TokenRecord::builder()
			.access_token("topsecret")
			.refresh_token("alsosecret")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token record fixture should build.");
		let rendered = format!("{record:?}");

		assert!(!rendered.contains("topsecret"));
		assert!(!rendered.contains("alsosecret"));
		assert!(rendered.contains("<redacted>"));
	}
}
