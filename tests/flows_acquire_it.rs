#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use picker_broker::{
	auth::{IdentityHint, ScopeSet, StoredHint},
	backend::ReqwestCollaborator,
	bootstrap::InstantTimer,
	error::{Error, TokenAcquisitionError},
	flows::{AcquireStrategy, Broker, ReqwestBroker},
	host::{ConsentPrompt, LibraryError, TokenGrant, scripted::ScriptedHost},
	provider::{ProviderDescriptor, ProviderId},
	store::{HintStore, MemoryHintStore},
	url::Url,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse URL fixture.")
}

fn descriptor() -> ProviderDescriptor {
	ProviderDescriptor::builder(
		ProviderId::new("mock-stack").expect("Provider identifier fixture should be valid."),
	)
	.api_script(url("https://cdn.example/api.js"))
	.identity_script(url("https://cdn.example/gsi.js"))
	.scope(ScopeSet::new(["drive.file", "drive.readonly"]).expect("Scope fixture should be valid."))
	.build()
	.expect("Descriptor fixture should build.")
}

fn build_broker(
	server: &MockServer,
	host: &ScriptedHost,
	store: Arc<MemoryHintStore>,
) -> ReqwestBroker {
	Broker::with_collaborator(
		ReqwestCollaborator::new(
			Url::parse(&server.base_url()).expect("Mock server base URL should parse."),
		),
		store,
		Arc::new(host.clone()),
		Arc::new(InstantTimer::default()),
		descriptor(),
		"api-key-1",
		"client-1",
	)
}

#[tokio::test]
async fn backend_issued_token_short_circuits_the_chain() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"T1\"}");
		})
		.await;
	let status_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/status");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"never@x.edu\"}");
		})
		.await;
	let credential =
		broker.acquire_token().await.expect("Backend-issued acquisition should succeed.");

	token_mock.assert_async().await;

	assert_eq!(credential.expose(), "T1");
	assert_eq!(status_mock.hits_async().await, 0, "The status endpoint must never be consulted.");
	assert!(
		host.identity().token_requests().is_empty(),
		"Neither silent nor interactive re-authorization may run.",
	);
	assert_eq!(
		host.api().bearer_credentials(),
		vec!["T1".to_owned()],
		"The adopted credential must be mirrored into the library state.",
	);
	assert_eq!(broker.acquire_metrics.adoptions(AcquireStrategy::BackendIssued), 1);
}

#[tokio::test]
async fn cached_credential_is_reused_without_network_calls() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"T1\"}");
		})
		.await;
	let first = broker.acquire_token().await.expect("First acquisition should succeed.");
	let second = broker.acquire_token().await.expect("Second acquisition should succeed.");

	assert_eq!(first, second, "The cached credential must be reused verbatim.");
	assert_eq!(
		token_mock.hits_async().await,
		1,
		"The second call must issue zero additional network calls.",
	);
	assert_eq!(broker.acquire_metrics.attempts(), 2);
	assert_eq!(broker.acquire_metrics.adoptions(AcquireStrategy::BackendIssued), 1);
	assert_eq!(broker.acquire_metrics.adoptions(AcquireStrategy::CachedCredential), 1);
}

#[tokio::test]
async fn silent_failure_falls_through_to_interactive_with_the_backend_hint() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/token");
			then.status(404);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/status");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"a@x.edu\"}");
		})
		.await;
	host.identity().queue_grant(Err(LibraryError::coded("interaction_required", "silent denied")));
	host.identity().queue_grant(Ok(TokenGrant::issued("T2")));

	let credential = broker.acquire_token().await.expect("Interactive fallback should succeed.");

	assert_eq!(credential.expose(), "T2");
	assert_eq!(host.identity().token_requests(), vec![
		(ConsentPrompt::Silent, Some("a@x.edu".to_owned())),
		(ConsentPrompt::SelectAccount, Some("a@x.edu".to_owned())),
	]);
	assert_eq!(broker.acquire_metrics.adoptions(AcquireStrategy::InteractiveReauthorize), 1);
}

#[tokio::test]
async fn stored_hint_biases_reauthorization_when_status_is_empty() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let store = Arc::new(MemoryHintStore::default());

	store
		.save(StoredHint::new(
			IdentityHint::new("b@x.edu").expect("Hint fixture should be valid."),
		))
		.await
		.expect("Seeding the hint store should succeed.");

	let broker = build_broker(&server, &host, store);

	host.identity().queue_grant(Ok(TokenGrant::issued("T3")));

	let credential = broker.acquire_token().await.expect("Silent acquisition should succeed.");

	assert_eq!(credential.expose(), "T3");
	assert_eq!(
		host.identity().token_requests(),
		vec![(ConsentPrompt::Silent, Some("b@x.edu".to_owned()))],
		"The remembered hint must bias the silent request.",
	);
}

#[tokio::test]
async fn backend_errors_are_swallowed_and_the_chain_continues() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/token");
			then.status(500).body("storage backend down");
		})
		.await;
	host.identity().queue_grant(Ok(TokenGrant::issued("T4")));

	let credential = broker
		.acquire_token()
		.await
		.expect("A failing backend lookup must not fail the acquisition.");

	assert_eq!(credential.expose(), "T4");
	assert_eq!(broker.acquire_metrics.adoptions(AcquireStrategy::SilentReauthorize), 1);
}

#[tokio::test]
async fn exhausted_chain_surfaces_the_interactive_library_error() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));

	host.identity().queue_grant(Err(LibraryError::message("silent denied")));
	host.identity().queue_grant(Err(LibraryError::coded("access_denied", "user closed chooser")));

	let error = broker.acquire_token().await.expect_err("An exhausted chain must fail.");

	match error {
		Error::TokenAcquisition(TokenAcquisitionError::Interactive { source }) => {
			assert_eq!(source.code.as_deref(), Some("access_denied"));
		},
		other => panic!("Expected an interactive acquisition error, got: {other}."),
	}

	assert_eq!(broker.acquire_metrics.failures(), 1);
}

#[tokio::test]
async fn empty_interactive_grant_is_reported_as_such() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host, Arc::new(MemoryHintStore::default()));

	// The grant queue stays empty: both requests settle without a token.
	let error = broker.acquire_token().await.expect_err("Empty grants must fail the acquisition.");

	assert!(matches!(error, Error::TokenAcquisition(TokenAcquisitionError::EmptyGrant)));
	assert_eq!(host.identity().token_requests().len(), 2);
}
