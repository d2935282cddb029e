// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stable and session identifiers merged into every request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use statsig_common_storage::{get_object_from_storage, set_object_in_storage, StorageGateway};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

const STABLE_ID_KEY_PREFIX: &str = "statsig.stable_id";
const MAX_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);
const MAX_SESSION_AGE: Duration = Duration::from_secs(4 * 60 * 60);

/// Supplies the identifiers attached to outbound URLs and payloads.
#[async_trait]
pub trait IdentitySource: Send + Sync + 'static {
	/// Identifier that survives process restarts.
	async fn stable_id(&self, sdk_key: &str) -> String;

	/// Identifier for the current session.
	async fn session_id(&self, sdk_key: &str) -> String;
}

pub type SharedIdentitySource = Arc<dyn IdentitySource>;

#[derive(Debug, Clone)]
struct Session {
	id: String,
	started_at: Instant,
	last_update: Instant,
}

impl Session {
	fn new(now: Instant) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			started_at: now,
			last_update: now,
		}
	}

	fn is_expired(&self, now: Instant) -> bool {
		now.saturating_duration_since(self.last_update) > MAX_SESSION_IDLE
			|| now.saturating_duration_since(self.started_at) > MAX_SESSION_AGE
	}
}

/// Default [`IdentitySource`]: stable IDs persisted through the storage
/// gateway, session IDs kept in process and rotated after inactivity.
#[derive(Debug)]
pub struct StorageIdentity {
	storage: Arc<StorageGateway>,
	/// One cell per SDK key. Resolution (read, generate, persist) runs once
	/// per cell; concurrent callers wait on it.
	stable_ids: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
	sessions: Mutex<HashMap<String, Session>>,
}

impl StorageIdentity {
	pub fn new(storage: Arc<StorageGateway>) -> Self {
		Self {
			storage,
			stable_ids: Mutex::new(HashMap::new()),
			sessions: Mutex::new(HashMap::new()),
		}
	}

	/// Replaces the stable ID for `sdk_key` and persists it.
	pub async fn override_stable_id(&self, sdk_key: &str, stable_id: impl Into<String>) {
		let stable_id = stable_id.into();
		self.stable_ids.lock().insert(
			sdk_key.to_string(),
			Arc::new(OnceCell::new_with(Some(stable_id.clone()))),
		);
		self.persist_stable_id(sdk_key, &stable_id).await;
	}

	async fn persist_stable_id(&self, sdk_key: &str, stable_id: &str) {
		let key = stable_id_storage_key(sdk_key);
		if let Err(e) = set_object_in_storage(&self.storage, &key, stable_id).await {
			warn!(error = %e, "failed to persist stable ID");
		}
	}

	async fn load_or_create_stable_id(&self, sdk_key: &str) -> String {
		let key = stable_id_storage_key(sdk_key);
		if let Some(id) = get_object_from_storage::<String>(&self.storage, &key).await {
			return id;
		}

		let id = Uuid::new_v4().to_string();
		debug!(stable_id = %id, "generated new stable ID");
		self.persist_stable_id(sdk_key, &id).await;
		id
	}

	fn session_id_at(&self, sdk_key: &str, now: Instant) -> String {
		let mut sessions = self.sessions.lock();
		let session = sessions
			.entry(sdk_key.to_string())
			.or_insert_with(|| Session::new(now));

		if session.is_expired(now) {
			debug!("session expired, starting a new one");
			*session = Session::new(now);
		}
		session.last_update = now;
		session.id.clone()
	}
}

#[async_trait]
impl IdentitySource for StorageIdentity {
	async fn stable_id(&self, sdk_key: &str) -> String {
		let cell = Arc::clone(self.stable_ids.lock().entry(sdk_key.to_string()).or_default());
		cell.get_or_init(|| self.load_or_create_stable_id(sdk_key))
			.await
			.clone()
	}

	async fn session_id(&self, sdk_key: &str) -> String {
		self.session_id_at(sdk_key, Instant::now())
	}
}

/// Storage key for a stable ID, namespaced by a hash of the SDK key.
pub fn stable_id_storage_key(sdk_key: &str) -> String {
	format!("{STABLE_ID_KEY_PREFIX}.{}", djb2(sdk_key))
}

/// 32-bit DJB2 over UTF-16 code units, rendered as an unsigned decimal.
fn djb2(value: &str) -> String {
	let hash = value.encode_utf16().fold(0i32, |hash, unit| {
		(hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
	});
	(hash as u32).to_string()
}
