#![cfg(feature = "reqwest")]

// std
use std::sync::{Arc, Mutex as StdMutex};
// crates.io
use httpmock::prelude::*;
// self
use picker_broker::{
	auth::ScopeSet,
	backend::ReqwestCollaborator,
	bootstrap::InstantTimer,
	error::Error,
	flows::{Broker, FileDescriptor, ReqwestBroker, SelectionConfig, SelectionOutcome},
	host::{PickedDocument, PickerOutcome, PickerView, scripted::ScriptedHost},
	provider::{ProviderDescriptor, ProviderId},
	store::MemoryHintStore,
	url::Url,
};

const STORED_FILE_BODY: &str = "{\"id\":\"att-1\",\"name\":\"thesis.pdf\",\"mimeType\":\"application/pdf\",\"category\":\"report\"}";

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

fn build_broker(server: &MockServer, host: &ScriptedHost) -> ReqwestBroker {
	Broker::with_collaborator(
		ReqwestCollaborator::new(
			Url::parse(&server.base_url()).expect("Mock server base URL should parse."),
		),
		Arc::new(MemoryHintStore::default()),
		Arc::new(host.clone()),
		Arc::new(InstantTimer::default()),
		descriptor(),
		"api-key-1",
		"client-1",
	)
}

fn picked_document() -> PickedDocument {
	PickedDocument {
		id: "doc-1".into(),
		name: "thesis.pdf".into(),
		mime_type: "application/pdf".into(),
		url: url("https://drive.example/doc-1"),
		icon_url: Some(url("https://drive.example/doc-1/icon")),
		preview_url: Some(url("https://drive.example/doc-1/thumb")),
		size_bytes: Some(2_048),
	}
}

async fn mock_stored_token(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/integrations/storage/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"T1\"}");
		})
		.await;
}

#[tokio::test]
async fn dismissed_widget_resolves_cancelled_without_dispatching() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;

	let persist_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/attachments/remote");
			then.status(200).header("content-type", "application/json").body(STORED_FILE_BODY);
		})
		.await;
	// No queued widget outcome: the scripted picker answers with a dismissal.
	let outcome = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect("A dismissal is a settled outcome, not an error.");

	assert!(outcome.is_cancelled());
	assert_eq!(persist_mock.hits_async().await, 0, "The dispatcher must never be invoked.");
}

#[tokio::test]
async fn callback_with_skip_flag_never_reaches_persistence() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;
	host.api().queue_picker_outcome(PickerOutcome::Picked(picked_document()));

	let persist_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/attachments/remote");
			then.status(200).header("content-type", "application/json").body(STORED_FILE_BODY);
		})
		.await;
	let delivered: Arc<StdMutex<Option<FileDescriptor>>> = Arc::new(StdMutex::new(None));
	let sink = delivered.clone();
	let config = SelectionConfig::new("report")
		.with_on_picked(move |descriptor| {
			*sink.lock().expect("Callback sink lock should not be poisoned.") = Some(descriptor);
		})
		.with_skip_persistence(true);
	let outcome = broker.open_selection(config).await.expect("The selection should settle.");

	assert!(matches!(outcome, SelectionOutcome::Picked(_)));
	assert_eq!(persist_mock.hits_async().await, 0, "The skip flag must stop persistence.");

	let descriptor = delivered
		.lock()
		.expect("Callback sink lock should not be poisoned.")
		.take()
		.expect("The callback must receive the descriptor.");

	assert_eq!(descriptor.id, "doc-1");
	assert_eq!(descriptor.media_type, "application/pdf");
	assert_eq!(descriptor.credential.expose(), "T1");
	assert_eq!(descriptor.size, Some(2_048));
}

#[tokio::test]
async fn picked_selection_persists_and_returns_the_stored_record() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;
	host.api().queue_picker_outcome(PickerOutcome::Picked(picked_document()));

	let persist_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/attachments/remote").json_body_partial(
				"{\"id\":\"doc-1\",\"mimeType\":\"application/pdf\",\"category\":\"report\"}",
			);
			then.status(200).header("content-type", "application/json").body(STORED_FILE_BODY);
		})
		.await;
	let outcome = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect("The persisted selection should settle.");

	persist_mock.assert_async().await;

	match outcome {
		SelectionOutcome::Stored(stored) => {
			assert_eq!(stored.id, "att-1");
			assert_eq!(stored.category, "report");
		},
		other => panic!("Expected a stored outcome, got: {other:?}."),
	}
}

#[tokio::test]
async fn callback_without_skip_flag_still_persists() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;
	host.api().queue_picker_outcome(PickerOutcome::Picked(picked_document()));

	let persist_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/attachments/remote");
			then.status(200).header("content-type", "application/json").body(STORED_FILE_BODY);
		})
		.await;
	let calls = Arc::new(StdMutex::new(0_u32));
	let counter = calls.clone();
	let config = SelectionConfig::new("report").with_on_picked(move |_descriptor| {
		*counter.lock().expect("Callback counter lock should not be poisoned.") += 1;
	});
	let outcome = broker.open_selection(config).await.expect("The selection should settle.");

	persist_mock.assert_async().await;

	assert!(matches!(outcome, SelectionOutcome::Stored(_)));
	assert_eq!(*calls.lock().expect("Callback counter lock should not be poisoned."), 1);
}

#[tokio::test]
async fn persistence_failure_propagates_to_the_caller() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;
	host.api().queue_picker_outcome(PickerOutcome::Picked(picked_document()));
	server
		.mock_async(|when, then| {
			when.method(POST).path("/attachments/remote");
			then.status(500).body("attachment store down");
		})
		.await;

	let error = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect_err("A failing persistence call must surface.");

	match error {
		Error::Persistence(persistence) => {
			assert_eq!(persistence.endpoint, "persist-selection");
		},
		other => panic!("Expected a persistence error, got: {other}."),
	}
}

#[tokio::test]
async fn concurrent_selection_is_rejected_busy_then_recovers() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;

	let gate = host.api().hold_picker();
	let held = gate.lock().await;
	let background = broker.clone();
	let pending = tokio::spawn(async move {
		background.open_selection(SelectionConfig::new("report")).await
	});

	// Wait for the first session to reach the (held) widget.
	while host.api().picker_requests().is_empty() {
		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
	}

	let error = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect_err("A second session while one is pending must be rejected.");

	assert!(matches!(error, Error::SessionBusy(_)));

	drop(held);

	let outcome = pending
		.await
		.expect("The pending selection task should not panic.")
		.expect("The pending selection should settle once released.");

	assert!(outcome.is_cancelled());

	let retry = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect("A new session after settlement should be accepted.");

	assert!(retry.is_cancelled());
}

#[tokio::test]
async fn picker_module_loads_once_and_views_stay_fixed() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	mock_stored_token(&server).await;

	broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect("First selection should settle.");
	broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect("Second selection should settle.");

	assert_eq!(host.api().picker_module_loads(), 1, "The sub-module is memoized per broker.");

	let requests = host.api().picker_requests();

	assert_eq!(requests.len(), 2);

	let request = &requests[0];

	assert_eq!(request.api_key, "api-key-1");
	assert_eq!(request.credential.expose(), "T1");
	assert!(!request.multi_select, "Single-selection only.");
	assert_eq!(request.views, vec![PickerView::Browse { thumbnails: true }, PickerView::Upload]);
}

#[tokio::test]
async fn disposed_broker_rejects_selection_as_not_ready() {
	let server = MockServer::start_async().await;
	let host = ScriptedHost::new();
	let broker = build_broker(&server, &host);

	broker.dispose();

	let error = broker
		.open_selection(SelectionConfig::new("report"))
		.await
		.expect_err("A disposed broker must reject selections.");

	assert!(matches!(error, Error::NotReady(_)));
}
