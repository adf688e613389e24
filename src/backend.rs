//! Collaborator endpoint contracts and the default reqwest transport.
//!
//! The broker consumes four collaborator endpoints: two credential lookups
//! whose failures are always recoverable (the token broker falls through to
//! its next strategy), and two persistence endpoints whose failures are
//! always surfaced. [`CollaboratorApi`] is the only seam; the
//! `reqwest`-backed [`ReqwestCollaborator`] ships behind the `reqwest`
//! feature.

// self
use crate::{_prelude::*, error::BackendError};

#[cfg(feature = "reqwest")] const BODY_PREVIEW_LIMIT: usize = 256;
/// Relative path of the stored-token lookup endpoint.
pub const STORED_TOKEN_PATH: &str = "integrations/storage/token";
/// Relative path of the connected-account status endpoint.
pub const ACCOUNT_STATUS_PATH: &str = "integrations/storage/status";
/// Relative path of the remote-selection persistence endpoint.
pub const PERSIST_SELECTION_PATH: &str = "attachments/remote";
/// Relative path of the local-upload persistence endpoint.
pub const LOCAL_UPLOAD_PATH: &str = "attachments/upload";

/// Boxed future returned by collaborator calls.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + 'a + Send>>;

/// Collaborator endpoints consumed by the broker.
pub trait CollaboratorApi: Send + Sync {
	/// Fetches a previously-stored credential for the authenticated user.
	fn fetch_stored_token(&self) -> BackendFuture<'_, Option<String>>;

	/// Fetches the connected external account's email.
	fn fetch_account_email(&self) -> BackendFuture<'_, Option<String>>;

	/// Stores a remotely-picked file's metadata; returns the canonical record.
	fn persist_selection(&self, record: SelectionRecord) -> BackendFuture<'_, StoredFile>;

	/// Stores a locally-uploaded file; returns the canonical record.
	fn persist_local_upload(&self, upload: LocalUpload) -> BackendFuture<'_, StoredFile>;
}

/// Public fields of a selection posted to the persistence endpoint.
///
/// The credential used to fetch the file's bytes never appears here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
	/// Provider-side document identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Media type.
	pub mime_type: String,
	/// User-facing link.
	pub link: Url,
	/// Icon reference, when available.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub icon: Option<Url>,
	/// Thumbnail (preview) reference, when available.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub thumbnail: Option<Url>,
	/// Byte size, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	/// Attachment category chosen by the caller.
	pub category: String,
}

/// Canonical stored-file record returned by both persistence endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
	/// Stored-file identifier assigned by the collaborator.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Media type.
	pub mime_type: String,
	/// User-facing link, when the collaborator exposes one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<Url>,
	/// Attachment category the file was stored under.
	pub category: String,
	/// Byte size, when known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
}

/// Locally-chosen file payload for the upload endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalUpload {
	/// File name reported by the caller.
	pub file_name: String,
	/// Media type reported by the caller.
	pub media_type: String,
	/// Raw file bytes.
	pub bytes: Vec<u8>,
	/// Attachment category chosen by the caller.
	pub category: String,
}

#[cfg(feature = "reqwest")]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTokenResponse {
	access_token: Option<String>,
}

#[cfg(feature = "reqwest")]
#[derive(Deserialize)]
struct AccountStatusResponse {
	email: Option<String>,
}

/// Collaborator transport backed by [`ReqwestClient`].
///
/// Endpoint paths are resolved against the base URL; the two lookup
/// endpoints map `404` to "nothing stored" instead of an error, because the
/// token broker treats absence and failure identically anyway.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestCollaborator {
	base: Url,
	client: ReqwestClient,
	bearer: Option<String>,
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestCollaborator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestCollaborator")
			.field("base", &self.base.as_str())
			.field("bearer_set", &self.bearer.is_some())
			.finish()
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestCollaborator {
	/// Creates a collaborator client for the provided base URL.
	pub fn new(base: Url) -> Self {
		Self::with_client(base, ReqwestClient::default())
	}

	/// Creates a collaborator client that reuses an existing [`ReqwestClient`].
	pub fn with_client(base: Url, client: ReqwestClient) -> Self {
		Self { base, client, bearer: None }
	}

	/// Attaches the dashboard session's bearer token to every request.
	pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
		self.bearer = Some(token.into());

		self
	}

	fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
		self.base.join(path).map_err(BackendError::request)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.bearer {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}

	async fn fetch_optional<T>(&self, path: &str) -> Result<Option<T>, BackendError>
	where
		T: serde::de::DeserializeOwned,
	{
		let url = self.endpoint(path)?;
		let response = self.authorize(self.client.get(url)).send().await?;
		let status = response.status();

		if status.as_u16() == 404 {
			return Ok(None);
		}
		if !status.is_success() {
			return Err(unexpected_status(status.as_u16(), response.text().await.ok()));
		}

		Ok(Some(parse_json(&response.bytes().await?, status.as_u16())?))
	}

	async fn read_stored_file(
		&self,
		response: reqwest::Response,
	) -> Result<StoredFile, BackendError> {
		let status = response.status();

		if !status.is_success() {
			return Err(unexpected_status(status.as_u16(), response.text().await.ok()));
		}

		parse_json(&response.bytes().await?, status.as_u16())
	}
}
#[cfg(feature = "reqwest")]
impl CollaboratorApi for ReqwestCollaborator {
	fn fetch_stored_token(&self) -> BackendFuture<'_, Option<String>> {
		Box::pin(async move {
			let response = self.fetch_optional::<StoredTokenResponse>(STORED_TOKEN_PATH).await?;

			Ok(response.and_then(|payload| payload.access_token))
		})
	}

	fn fetch_account_email(&self) -> BackendFuture<'_, Option<String>> {
		Box::pin(async move {
			let response = self.fetch_optional::<AccountStatusResponse>(ACCOUNT_STATUS_PATH).await?;

			Ok(response.and_then(|payload| payload.email))
		})
	}

	fn persist_selection(&self, record: SelectionRecord) -> BackendFuture<'_, StoredFile> {
		Box::pin(async move {
			let url = self.endpoint(PERSIST_SELECTION_PATH)?;
			let response = self.authorize(self.client.post(url)).json(&record).send().await?;

			self.read_stored_file(response).await
		})
	}

	fn persist_local_upload(&self, upload: LocalUpload) -> BackendFuture<'_, StoredFile> {
		Box::pin(async move {
			let url = self.endpoint(LOCAL_UPLOAD_PATH)?;
			let part = reqwest::multipart::Part::bytes(upload.bytes)
				.file_name(upload.file_name)
				.mime_str(&upload.media_type)
				.map_err(BackendError::request)?;
			let form = reqwest::multipart::Form::new()
				.part("file", part)
				.text("category", upload.category);
			let response = self.authorize(self.client.post(url)).multipart(form).send().await?;

			self.read_stored_file(response).await
		})
	}
}

#[cfg(feature = "reqwest")]
fn unexpected_status(status: u16, body: Option<String>) -> BackendError {
	BackendError::UnexpectedStatus { status, body_preview: body.map(truncate_preview) }
}

#[cfg(feature = "reqwest")]
fn parse_json<T>(bytes: &[u8], status: u16) -> Result<T, BackendError>
where
	T: serde::de::DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| BackendError::ResponseParse { source, status: Some(status) })
}

#[cfg(feature = "reqwest")]
fn truncate_preview(body: String) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn selection_record_serializes_with_camel_case_fields() {
		let record = SelectionRecord {
			id: "doc-1".into(),
			name: "thesis.pdf".into(),
			mime_type: "application/pdf".into(),
			link: Url::parse("https://drive.example/doc-1").expect("Link fixture should parse."),
			icon: None,
			thumbnail: None,
			size: Some(1_024),
			category: "report".into(),
		};
		let payload = serde_json::to_value(&record)
			.expect("Selection record should serialize successfully.");

		assert_eq!(payload["mimeType"], "application/pdf");
		assert_eq!(payload["category"], "report");
		assert!(payload.get("icon").is_none(), "Absent icon should be omitted from the payload.");
		assert!(
			payload.get("credential").is_none() && payload.get("accessToken").is_none(),
			"No credential field may exist on the persisted record.",
		);
	}

	#[test]
	fn stored_file_deserializes_with_optional_fields_absent() {
		let stored: StoredFile = serde_json::from_str(
			"{\"id\":\"att-9\",\"name\":\"thesis.pdf\",\"mimeType\":\"application/pdf\",\"category\":\"report\"}",
		)
		.expect("Stored-file record should deserialize without optional fields.");

		assert_eq!(stored.id, "att-9");
		assert_eq!(stored.link, None);
		assert_eq!(stored.size, None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn body_previews_truncate_long_payloads() {
		let long = "x".repeat(BODY_PREVIEW_LIMIT + 64);
		let preview = truncate_preview(long);

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
