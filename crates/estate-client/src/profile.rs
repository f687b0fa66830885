//! # Profile Sync Controller
//!
//! Keeps the display name consistent between the identity store and the
//! user's profile document.
//!
//! ## Two-Phase Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  commit_if_changed(current, new, user)                  │
//! │                                                                         │
//! │  new == current ─────────────────────────► Unchanged (no store calls)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalise (trim, 1..=100 chars) ── invalid ──► Validation              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Phase 1: IdentityStore::update_display_name                           │
//! │       │ ── error ──► Identity        (document store untouched)        │
//! │       ▼  (completes before phase 2 starts)                             │
//! │  Phase 2: RemoteStore::update_record(users, id, {name})                │
//! │       │ ── error ──► PartialSync     (identity new, document old)      │
//! │       ▼                                                                 │
//! │  Committed                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed phase 2 is not rolled back. [`ProfileSync::resync_document`]
//! repeats phase 2 alone so a host can repair the divergence later.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tracing::{debug, error, info, warn};

use estate_core::validation::normalize_display_name;
use estate_core::{Collection, IdentityUser, ListingId, UserId};

use crate::error::{ClientError, ClientResult, StoreResult};
use crate::listings::ListingPage;
use crate::reporter::{messages, FailureReporter};
use crate::store::{IdentityStore, RemoteStore};

// =============================================================================
// Session
// =============================================================================

/// The signed-in user, passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user_id: UserId,
    display_name: String,
    email: String,
}

impl Session {
    pub fn new(user_id: UserId, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Session {
            user_id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Display name as last confirmed by the identity store.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<IdentityUser> for Session {
    fn from(user: IdentityUser) -> Self {
        Session {
            user_id: user.id,
            display_name: user.display_name,
            email: user.email,
        }
    }
}

// =============================================================================
// Profile Sync
// =============================================================================

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The name did not change; no store was called.
    Unchanged,
    /// Both stores now hold `name`.
    Committed { name: String },
}

/// Dual-write of the display name: identity store, then profile document.
#[derive(Clone)]
pub struct ProfileSync {
    identity: Arc<dyn IdentityStore>,
    store: Arc<dyn RemoteStore>,
    reporter: Arc<dyn FailureReporter>,
}

impl ProfileSync {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        store: Arc<dyn RemoteStore>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        ProfileSync {
            identity,
            store,
            reporter,
        }
    }

    /// Writes `new_name` to both stores unless it equals `current_name`.
    ///
    /// ## Returns
    /// * `Ok(Unchanged)` - Names equal, zero store calls
    /// * `Ok(Committed)` - Both stores updated
    /// * `Err(Validation)` - Name empty or too long, zero store calls
    /// * `Err(Identity)` - Identity write failed, document untouched
    /// * `Err(PartialSync)` - Identity updated, document still old
    pub async fn commit_if_changed(
        &self,
        current_name: &str,
        new_name: &str,
        user_id: &UserId,
    ) -> ClientResult<CommitOutcome> {
        if new_name == current_name {
            debug!(user_id = %user_id, "Display name unchanged");
            return Ok(CommitOutcome::Unchanged);
        }

        let name = match normalize_display_name(new_name) {
            Ok(name) => name,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Display name rejected");
                self.reporter.report_error(messages::PROFILE_UPDATE_FAILED);
                return Err(e.into());
            }
        };
        if name == current_name {
            debug!(user_id = %user_id, "Display name unchanged after trimming");
            return Ok(CommitOutcome::Unchanged);
        }

        if let Err(e) = self.identity.update_display_name(user_id, &name).await {
            warn!(user_id = %user_id, error = %e, "Identity store update failed");
            self.reporter.report_error(messages::PROFILE_UPDATE_FAILED);
            return Err(e.into());
        }
        debug!(user_id = %user_id, "Identity store updated");

        if let Err(source) = self.write_document(user_id, &name).await {
            error!(
                user_id = %user_id,
                identity_name = %name,
                error = %source,
                "Profile document update failed after identity update"
            );
            self.reporter.report_error(messages::PROFILE_PARTIAL_SYNC);
            return Err(ClientError::PartialSync {
                user_id: user_id.clone(),
                identity_name: name,
                source,
            });
        }

        info!(user_id = %user_id, "Display name committed");
        Ok(CommitOutcome::Committed { name })
    }

    /// Repeats the document write for a name the identity store already
    /// holds.
    pub async fn resync_document(&self, user_id: &UserId, name: &str) -> ClientResult<()> {
        self.write_document(user_id, name).await?;
        info!(user_id = %user_id, "Profile document resynced");
        Ok(())
    }

    async fn write_document(&self, user_id: &UserId, name: &str) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(name));

        self.store
            .update_record(Collection::Users, user_id.as_str(), fields)
            .await
    }
}

// =============================================================================
// Profile Editor
// =============================================================================

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileForm {
    pub name: String,
    /// Display only; never written to any store.
    pub email: String,
}

/// What [`ProfileEditor::toggle_editing`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Edit mode entered.
    Editing,
    /// Edit mode left and the name committed (or found unchanged).
    Saved(CommitOutcome),
}

/// State behind the Profile page: the session, the edit form and the
/// user's own listings.
pub struct ProfileEditor {
    session: Session,
    form: ProfileForm,
    editing: bool,
    sync: ProfileSync,
    identity: Arc<dyn IdentityStore>,
    listings: ListingPage,
}

impl ProfileEditor {
    pub fn new(
        session: Session,
        sync: ProfileSync,
        identity: Arc<dyn IdentityStore>,
        listings: ListingPage,
    ) -> Self {
        let form = ProfileForm {
            name: session.display_name.clone(),
            email: session.email.clone(),
        };

        ProfileEditor {
            session,
            form,
            editing: false,
            sync,
            identity,
            listings,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// The user's own listings.
    pub fn listings(&self) -> &ListingPage {
        &self.listings
    }

    /// Updates the name field. Ignored unless editing.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        if !self.editing {
            return false;
        }
        self.form.name = name.into();
        true
    }

    /// Updates the email field. Ignored unless editing.
    pub fn set_email(&mut self, email: impl Into<String>) -> bool {
        if !self.editing {
            return false;
        }
        self.form.email = email.into();
        true
    }

    /// Enters edit mode, or leaves it and commits the name.
    ///
    /// Edit mode is left whatever the commit's outcome. The session's
    /// display name follows the identity store: it changes on success and on
    /// partial sync, and stays as it was otherwise.
    pub async fn toggle_editing(&mut self) -> ClientResult<ToggleOutcome> {
        if !self.editing {
            self.editing = true;
            return Ok(ToggleOutcome::Editing);
        }
        self.editing = false;

        let result = self
            .sync
            .commit_if_changed(&self.session.display_name, &self.form.name, &self.session.user_id)
            .await;

        match result {
            Ok(outcome) => {
                if let CommitOutcome::Committed { name } = &outcome {
                    self.session.display_name = name.clone();
                    self.form.name = name.clone();
                }
                Ok(ToggleOutcome::Saved(outcome))
            }
            Err(ClientError::PartialSync {
                user_id,
                identity_name,
                source,
            }) => {
                self.session.display_name = identity_name.clone();
                self.form.name = identity_name.clone();
                Err(ClientError::PartialSync {
                    user_id,
                    identity_name,
                    source,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes one of the user's listings.
    pub async fn delete_listing(&self, id: &ListingId) -> ClientResult<()> {
        self.listings.delete_listing(id).await
    }

    /// Ends the session and disposes the owned-listings page.
    pub async fn sign_out(self) {
        self.identity.sign_out().await;
        self.listings.dispose();
        info!(user_id = %self.session.user_id, "Profile closed after sign out");
    }
}
