// std
use std::{
	env, fs,
	path::PathBuf,
	process,
	sync::Arc,
	time::{SystemTime, UNIX_EPOCH},
};
// self
use picker_broker::{
	auth::{IdentityHint, StoredHint},
	store::{FileHintStore, HintStore, MemoryHintStore},
};

fn hint(email: &str) -> StoredHint {
	StoredHint::new(IdentityHint::new(email).expect("Hint fixture should be valid."))
}

async fn exercise_contract(store: Arc<dyn HintStore>) {
	assert_eq!(store.load().await.expect("An empty store should load successfully."), None);

	store.save(hint("a@x.edu")).await.expect("First save should succeed.");
	store.save(hint("b@x.edu")).await.expect("Second save should succeed.");

	let loaded = store
		.load()
		.await
		.expect("Load should succeed after saves.")
		.expect("A hint should be present after saving.");

	assert_eq!(loaded.email.email(), "b@x.edu", "Saves replace the hint whole.");

	store.clear().await.expect("Clear should succeed.");

	assert_eq!(store.load().await.expect("Load should succeed after clear."), None);
}

#[tokio::test]
async fn memory_store_honors_the_contract() {
	exercise_contract(Arc::new(MemoryHintStore::default())).await;
}

#[tokio::test]
async fn file_store_honors_the_contract_and_persists() {
	let unique = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should sit after the epoch.")
		.as_nanos();
	let path: PathBuf =
		env::temp_dir().join(format!("picker_broker_hints_it_{}_{unique}.json", process::id()));
	let store = FileHintStore::open(&path).expect("Hint store should open.");

	exercise_contract(Arc::new(store.clone())).await;

	store.save(hint("c@x.edu")).await.expect("Save before reopen should succeed.");
	drop(store);

	let reopened = FileHintStore::open(&path).expect("Hint store should reopen.");
	let loaded = reopened
		.load()
		.await
		.expect("Load should succeed after reopen.")
		.expect("The hint should survive a restart.");

	assert_eq!(loaded.email.email(), "c@x.edu");

	fs::remove_file(&path).expect("Temporary hint snapshot should be removable.");
}
