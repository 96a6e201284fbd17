/// Visitor progress
///
/// Records which hotspots a visitor has unlocked, per session and per
/// project, and decides which links the visitor gets to see. The session
/// token is generated and kept locally; nothing validates it, so it is a
/// convenience rather than a security boundary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::LocalStore;

/// Local store key of the session token
pub const SESSION_KEY: &str = "pano_tour_session";

/// Local store key of the unlock records
pub const PROGRESS_KEY: &str = "pano_tour_progress";

/// Locally generated visitor identity
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// `session_<millis>_<9 random chars>`
    pub fn generate() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        SessionToken(format!("session_{}_{}", Utc::now().timestamp_millis(), &random[..9]))
    }

    /// Reuse the persisted token, or create and persist a new one
    pub fn load_or_create(store: &mut LocalStore) -> Result<Self> {
        if let Some(token) = store.get(SESSION_KEY).filter(|t| !t.is_empty()) {
            return Ok(SessionToken(token.to_string()));
        }

        let token = Self::generate();
        store.set(SESSION_KEY, token.as_str())?;
        debug!(session = %token, "new visitor session");
        Ok(token)
    }

    /// Forget the persisted token; the next visit starts a new session
    pub fn clear(store: &mut LocalStore) -> Result<bool> {
        store.remove(SESSION_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        SessionToken(token.to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a link is presented to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStatus {
    /// Already visited
    Unlocked,
    /// Not visited yet, but the next place to go
    NextAvailable,
}

/// Unlocked hotspot ids per session and project.
///
/// Records only ever grow; the only way to forget progress is clearing a
/// whole session.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct UnlockTracker {
    sessions: BTreeMap<SessionToken, BTreeMap<String, Vec<String>>>,
}

impl UnlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read persisted progress. Unreadable progress starts empty.
    pub fn load(store: &LocalStore) -> Self {
        store.get_json(PROGRESS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &mut LocalStore) -> Result<()> {
        store.set_json(PROGRESS_KEY, self)
    }

    /// Mark a hotspot as visited. Returns `true` if it was newly unlocked.
    pub fn unlock(&mut self, session: &SessionToken, project: &str, hotspot_id: &str) -> bool {
        let unlocked = self
            .sessions
            .entry(session.clone())
            .or_default()
            .entry(project.to_string())
            .or_default();

        if unlocked.iter().any(|id| id == hotspot_id) {
            return false;
        }
        unlocked.push(hotspot_id.to_string());
        debug!(%session, project, hotspot_id, "hotspot unlocked");
        true
    }

    pub fn is_unlocked(&self, session: &SessionToken, project: &str, hotspot_id: &str) -> bool {
        self.unlocked(session, project).iter().any(|id| id == hotspot_id)
    }

    /// Unlocked ids in the order they were visited
    pub fn unlocked(&self, session: &SessionToken, project: &str) -> &[String] {
        self.sessions
            .get(session)
            .and_then(|projects| projects.get(project))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Strictly linear disclosure over ordered children: visited children
    /// are shown until the first unvisited one, which is shown as next
    /// available. Everything after it stays hidden.
    pub fn visible_children<'c>(
        &self,
        session: &SessionToken,
        project: &str,
        children: &[&'c str],
    ) -> Vec<(&'c str, UnlockStatus)> {
        let mut visible = Vec::new();
        for &child in children {
            if self.is_unlocked(session, project, child) {
                visible.push((child, UnlockStatus::Unlocked));
            } else {
                visible.push((child, UnlockStatus::NextAvailable));
                break;
            }
        }
        visible
    }

    /// Drop every record of a session
    pub fn clear_session(&mut self, session: &SessionToken) -> bool {
        self.sessions.remove(session).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionToken {
        SessionToken::from("session_1_abc")
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut tracker = UnlockTracker::new();

        assert!(tracker.unlock(&session(), "demo", "h1"));
        assert!(!tracker.unlock(&session(), "demo", "h1"));
        assert_eq!(tracker.unlocked(&session(), "demo"), ["h1".to_string()]);
        assert!(tracker.is_unlocked(&session(), "demo", "h1"));
        assert!(!tracker.is_unlocked(&session(), "other", "h1"));
    }

    #[test]
    fn test_progressive_disclosure() {
        let mut tracker = UnlockTracker::new();
        tracker.unlock(&session(), "demo", "c1");

        let visible = tracker.visible_children(&session(), "demo", &["c1", "c2", "c3"]);

        assert_eq!(
            visible,
            vec![("c1", UnlockStatus::Unlocked), ("c2", UnlockStatus::NextAvailable)]
        );
    }

    #[test]
    fn test_nothing_unlocked_shows_first_child() {
        let tracker = UnlockTracker::new();

        let visible = tracker.visible_children(&session(), "demo", &["c1", "c2"]);

        assert_eq!(visible, vec![("c1", UnlockStatus::NextAvailable)]);
        assert!(tracker.visible_children(&session(), "demo", &[]).is_empty());
    }

    #[test]
    fn test_unlocked_after_gap_stay_hidden() {
        let mut tracker = UnlockTracker::new();
        tracker.unlock(&session(), "demo", "c3");

        let visible = tracker.visible_children(&session(), "demo", &["c1", "c2", "c3"]);

        assert_eq!(visible, vec![("c1", UnlockStatus::NextAvailable)]);
    }

    #[test]
    fn test_progress_persists_in_local_store() {
        let mut store = LocalStore::in_memory(4096);
        let mut tracker = UnlockTracker::new();
        tracker.unlock(&session(), "demo", "h1");
        tracker.save(&mut store).unwrap();

        let restored = UnlockTracker::load(&store);

        assert_eq!(restored, tracker);
    }

    #[test]
    fn test_session_token_is_reused_until_cleared() {
        let mut store = LocalStore::in_memory(4096);

        let first = SessionToken::load_or_create(&mut store).unwrap();
        let again = SessionToken::load_or_create(&mut store).unwrap();
        assert_eq!(first, again);
        assert!(first.as_str().starts_with("session_"));

        assert!(SessionToken::clear(&mut store).unwrap());
        let fresh = SessionToken::load_or_create(&mut store).unwrap();
        assert_ne!(first, fresh);
    }
}
