//! Credential acquisition via the prioritized strategy chain.
//!
//! [`Broker::acquire_token`] walks [`AcquireStrategy::CHAIN`] in order: the
//! in-memory cache, the backend-issued token, silent re-authorization, then
//! interactive re-authorization. Failures inside the middle strategies are
//! swallowed and recorded as skips so the fall-through stays auditable; only
//! the final strategy surfaces its error. An internal async mutex serializes
//! acquisitions so strategies of concurrent calls never interleave, and a
//! settled credential is mirrored into the API library's own authorization
//! state on every adoption.

mod metrics;

pub use metrics::AcquireMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	backend::CollaboratorApi,
	bootstrap::BootstrapHandles,
	error::TokenAcquisitionError,
	flows::{AcquireStrategy, Broker},
	host::ConsentPrompt,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

enum StrategyOutcome {
	Acquired(Credential),
	FallThrough,
}

impl<A> Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	/// Acquires a usable credential, idempotent per outstanding credential.
	///
	/// A second call without an intervening failure returns the cached value
	/// with zero collaborator or library calls.
	pub async fn acquire_token(&self) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::AcquireToken;

		let span = FlowSpan::new(KIND, "acquire_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.acquire_metrics.record_attempt();

				let handles = self.ready_handles().await?;
				let _serial = self.acquire_serial.lock().await;
				let mut login_hint: Option<Option<String>> = None;

				for strategy in AcquireStrategy::CHAIN {
					match self.try_strategy(strategy, &handles, &mut login_hint).await? {
						StrategyOutcome::Acquired(credential) => {
							self.acquire_metrics.record_adoption(strategy);

							return Ok(credential);
						},
						StrategyOutcome::FallThrough => {},
					}
				}

				// Only an empty interactive grant falls off the chain end;
				// interactive errors surface above.
				Err(TokenAcquisitionError::EmptyGrant.into())
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => {
				self.acquire_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn try_strategy(
		&self,
		strategy: AcquireStrategy,
		handles: &BootstrapHandles,
		login_hint: &mut Option<Option<String>>,
	) -> Result<StrategyOutcome> {
		match strategy {
			AcquireStrategy::CachedCredential => Ok(self
				.credential
				.read()
				.clone()
				.map_or(StrategyOutcome::FallThrough, StrategyOutcome::Acquired)),
			AcquireStrategy::BackendIssued => match self.collaborator.fetch_stored_token().await {
				Ok(Some(token)) =>
					Ok(StrategyOutcome::Acquired(self.adopt(handles, Credential::new(token)))),
				Ok(None) => {
					obs::record_strategy_skip(strategy.as_str(), "no stored token");

					Ok(StrategyOutcome::FallThrough)
				},
				Err(error) => {
					obs::record_strategy_skip(strategy.as_str(), &error.to_string());

					Ok(StrategyOutcome::FallThrough)
				},
			},
			AcquireStrategy::SilentReauthorize => {
				let hint = self.resolve_login_hint().await;
				let request =
					handles.token_handle.request_access_token(ConsentPrompt::Silent, hint.as_deref());
				let outcome = match request.await {
					Ok(grant) => match grant.access_token {
						Some(token) =>
							StrategyOutcome::Acquired(self.adopt(handles, Credential::new(token))),
						None => {
							obs::record_strategy_skip(strategy.as_str(), "empty grant");

							StrategyOutcome::FallThrough
						},
					},
					Err(error) => {
						obs::record_strategy_skip(strategy.as_str(), &error.to_string());

						StrategyOutcome::FallThrough
					},
				};

				*login_hint = Some(hint);

				Ok(outcome)
			},
			AcquireStrategy::InteractiveReauthorize => {
				// The silent step already resolved the hint; re-resolve only
				// if the chain was somehow entered here first.
				let hint = match login_hint.take() {
					Some(hint) => hint,
					None => self.resolve_login_hint().await,
				};
				let grant = handles
					.token_handle
					.request_access_token(ConsentPrompt::SelectAccount, hint.as_deref())
					.await
					.map_err(|source| TokenAcquisitionError::Interactive { source })?;

				match grant.access_token {
					Some(token) =>
						Ok(StrategyOutcome::Acquired(self.adopt(handles, Credential::new(token)))),
					None => Ok(StrategyOutcome::FallThrough),
				}
			},
		}
	}

	// Overwrites the cache whole and mirrors the credential into the API
	// library's request-authorization state.
	fn adopt(&self, handles: &BootstrapHandles, credential: Credential) -> Credential {
		*self.credential.write() = Some(credential.clone());
		handles.api.set_bearer_credential(&credential);

		credential
	}

	// Backend status email overrides the stored hint; absence of both is
	// valid and never blocks acquisition.
	async fn resolve_login_hint(&self) -> Option<String> {
		if let Ok(Some(email)) = self.collaborator.fetch_account_email().await {
			return Some(email);
		}

		match self.hint_store.load().await {
			Ok(Some(stored)) => Some(stored.email.email().to_owned()),
			_ => None,
		}
	}
}
