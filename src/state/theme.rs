use crate::error::Result;
use crate::storage::LocalStore;

/// Local store key of the theme preference
pub const THEME_KEY: &str = "theme";

/// Interface colour scheme
///
/// Stored as the bare string `"light"` or `"dark"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Saved preference; anything unrecognised reads as light
    pub fn load(store: &LocalStore) -> Self {
        match store.get(THEME_KEY) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn save(self, store: &mut LocalStore) -> Result<()> {
        store.set(THEME_KEY, self.as_str())
    }

    /// Flip and persist the preference
    pub fn toggle(store: &mut LocalStore) -> Result<Self> {
        let next = match Self::load(store) {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        next.save(store)?;
        Ok(next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}
