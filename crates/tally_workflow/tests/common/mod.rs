//! In-memory collaborators for workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tally_cache::{CacheConfig, MemoryCache};
use tally_core::{ArtifactIdentity, RenderedState, Subject, TriggerButton, TriggerEvent};
use tally_error::{
    StoreError, StoreErrorKind, SurfaceError, SurfaceErrorKind, TallyResult,
};
use tally_interface::{MemberDirectory, RecordStore, RenderingSurface};
use tally_workflow::{
    Collaborators, TriggerConfig, TriggerDispatcher, TriggerTable, VerificationWorkflow,
    WorkflowConfig,
};

pub const GUILD: &str = "guild-1";
pub const CHANNEL: &str = "channel-1";
pub const MODERATOR: &str = "mod-1";
pub const MODERATOR_ROLE: &str = "role-mod";
pub const BOT: &str = "bot-1";

/// Store of record keeping submissions in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    subjects: Mutex<Vec<Subject>>,
    rejected: Mutex<HashSet<String>>,
    permissions: Mutex<HashMap<(String, String), String>>,
    pub mark_verified_calls: AtomicUsize,
    pub mark_rejected_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
    pub unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn add(&self, subject: Subject) {
        self.subjects.lock().push(subject);
    }

    pub fn require_role(&self, action: &str, guild_id: &str, role_id: &str) {
        self.permissions
            .lock()
            .insert((action.to_string(), guild_id.to_string()), role_id.to_string());
    }

    pub fn get(&self, id: &str) -> Option<Subject> {
        self.subjects.lock().iter().find(|s| s.id == id).cloned()
    }

    pub fn rescore(&self, id: &str, score: i64) {
        if let Some(subject) = self.subjects.lock().iter_mut().find(|s| s.id == id) {
            subject.score = score;
        }
        self.rejected.lock().remove(id);
    }

    pub fn is_rejected(&self, id: &str) -> bool {
        self.rejected.lock().contains(id)
    }

    fn check(&self) -> TallyResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::new(StoreErrorKind::Unavailable("store offline".into())).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn pending_subject(&self, context_id: &str) -> TallyResult<Option<Subject>> {
        self.check()?;
        let rejected = self.rejected.lock();
        Ok(self
            .subjects
            .lock()
            .iter()
            .find(|s| s.context_id == context_id && !s.verified && !rejected.contains(&s.id))
            .cloned())
    }

    async fn subject(&self, subject_id: &str) -> TallyResult<Option<Subject>> {
        self.check()?;
        Ok(self.get(subject_id))
    }

    async fn mark_verified(&self, subject_id: &str) -> TallyResult<()> {
        self.check()?;
        self.mark_verified_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(subject) = self.subjects.lock().iter_mut().find(|s| s.id == subject_id) {
            subject.verified = true;
        }
        Ok(())
    }

    async fn mark_rejected(&self, subject_id: &str) -> TallyResult<()> {
        self.check()?;
        self.mark_rejected_calls.fetch_add(1, Ordering::SeqCst);
        self.rejected.lock().insert(subject_id.to_string());
        Ok(())
    }

    async fn delete_subject(&self, subject_id: &str) -> TallyResult<()> {
        self.check()?;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.subjects.lock().retain(|s| s.id != subject_id);
        Ok(())
    }

    async fn permission_for_action(
        &self,
        action: &str,
        guild_id: &str,
    ) -> TallyResult<Option<String>> {
        self.check()?;
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .permissions
            .lock()
            .get(&(action.to_string(), guild_id.to_string()))
            .cloned())
    }
}

/// A chat platform that remembers every artifact and notification.
#[derive(Default)]
pub struct RecordingSurface {
    artifacts: Mutex<HashMap<ArtifactIdentity, (RenderedState, Vec<TriggerButton>)>>,
    next_message: AtomicUsize,
    pub notifications: Mutex<Vec<(ArtifactIdentity, String)>>,
    pub fetch_calls: AtomicUsize,
    /// Fail the next `update` like a platform hiccup would
    pub fail_next_update: AtomicBool,
}

impl RecordingSurface {
    pub fn rendering(&self, identity: &ArtifactIdentity) -> Option<RenderedState> {
        self.artifacts.lock().get(identity).map(|(r, _)| r.clone())
    }

    pub fn button_ids(&self, identity: &ArtifactIdentity) -> Vec<String> {
        self.artifacts
            .lock()
            .get(identity)
            .map(|(_, b)| b.iter().map(|b| b.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn notified(&self) -> Vec<String> {
        self.notifications.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.lock().len()
    }
}

#[async_trait]
impl RenderingSurface for RecordingSurface {
    async fn publish(
        &self,
        guild_id: &str,
        channel_id: &str,
        rendering: &RenderedState,
        buttons: &[TriggerButton],
    ) -> TallyResult<ArtifactIdentity> {
        let id = self.next_message.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = ArtifactIdentity::new(guild_id, channel_id, format!("msg-{id}"));
        self.artifacts
            .lock()
            .insert(identity.clone(), (rendering.clone(), buttons.to_vec()));
        Ok(identity)
    }

    async fn update(
        &self,
        identity: &ArtifactIdentity,
        rendering: &RenderedState,
        buttons: &[TriggerButton],
    ) -> TallyResult<()> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(SurfaceError::new(SurfaceErrorKind::Update {
                artifact: identity.correlation_key(),
                reason: "gateway timeout".into(),
            })
            .into());
        }
        self.artifacts
            .lock()
            .insert(identity.clone(), (rendering.clone(), buttons.to_vec()));
        Ok(())
    }

    async fn fetch(&self, identity: &ArtifactIdentity) -> TallyResult<Option<RenderedState>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rendering(identity))
    }

    async fn notify(&self, identity: &ArtifactIdentity, message: &str) -> TallyResult<()> {
        self.notifications
            .lock()
            .push((identity.clone(), message.to_string()));
        Ok(())
    }
}

/// Fixed members, roles and names.
#[derive(Default)]
pub struct StaticDirectory {
    roles: Mutex<HashMap<String, HashSet<String>>>,
    role_names: Mutex<HashMap<String, String>>,
    names: Mutex<HashMap<String, String>>,
}

impl StaticDirectory {
    pub fn grant(&self, user_id: &str, role_id: &str) {
        self.roles
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .insert(role_id.to_string());
    }

    pub fn name_role(&self, role_id: &str, name: &str) {
        self.role_names
            .lock()
            .insert(role_id.to_string(), name.to_string());
    }

    pub fn name_member(&self, user_id: &str, name: &str) {
        self.names.lock().insert(user_id.to_string(), name.to_string());
    }
}

#[async_trait]
impl MemberDirectory for StaticDirectory {
    async fn has_role(&self, _guild_id: &str, user_id: &str, role_id: &str) -> TallyResult<bool> {
        Ok(self
            .roles
            .lock()
            .get(user_id)
            .is_some_and(|roles| roles.contains(role_id)))
    }

    async fn role_name(&self, _guild_id: &str, role_id: &str) -> TallyResult<Option<String>> {
        Ok(self.role_names.lock().get(role_id).cloned())
    }

    async fn display_name(&self, _guild_id: &str, user_id: &str) -> TallyResult<Option<String>> {
        Ok(self.names.lock().get(user_id).cloned())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub surface: Arc<RecordingSurface>,
    pub directory: Arc<StaticDirectory>,
    pub cache: Arc<MemoryCache>,
    pub dispatcher: TriggerDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let surface = Arc::new(RecordingSurface::default());
        let directory = Arc::new(StaticDirectory::default());
        let cache = Arc::new(MemoryCache::new(&CacheConfig::default()));

        directory.name_member(MODERATOR, "Moderator One");
        directory.name_member("user-1", "ana");
        directory.name_member("user-2", "bo");

        let workflow = VerificationWorkflow::new(
            WorkflowConfig::default().with_bot_user_id(BOT.to_string()),
            TriggerTable::from_config(&TriggerConfig::default()).unwrap(),
            Collaborators {
                store: store.clone(),
                surface: surface.clone(),
                directory: directory.clone(),
            },
            cache.clone(),
            Duration::from_millis(500),
        );

        Self {
            store,
            surface,
            directory,
            cache,
            dispatcher: TriggerDispatcher::new(Arc::new(workflow)),
        }
    }

    pub fn workflow(&self) -> &VerificationWorkflow {
        self.dispatcher.workflow()
    }

    /// Trigger by button id, as a click carrying the current rendering.
    pub fn click(&self, artifact: &ArtifactIdentity, button_id: &str) -> TriggerEvent {
        let event = TriggerEvent::new(artifact.clone(), MODERATOR, button_id);
        match self.surface.rendering(artifact) {
            Some(rendering) => event.with_rendering(rendering),
            None => event,
        }
    }

    /// Trigger by emoji, as a reaction carrying nothing but the identity.
    pub fn react(&self, artifact: &ArtifactIdentity, emoji: &str) -> TriggerEvent {
        TriggerEvent::new(artifact.clone(), MODERATOR, emoji)
    }
}

pub fn subject(id: &str, context_id: &str, user_id: &str, score: i64) -> Subject {
    Subject::builder()
        .id(id)
        .context_id(context_id)
        .context_name("Spring Cup")
        .user_id(user_id)
        .ign(format!("ign-{id}"))
        .score(score)
        .proof_url(Some(format!("https://cdn.example/{id}.png")))
        .build()
        .unwrap()
}
