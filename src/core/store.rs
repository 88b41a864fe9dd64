//! Profile store: profile name -> profile, plus the selected name

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::error::LevelError;
use super::profile::Profile;

/// Reserved profile name meaning "leveling disabled"
pub const DISABLED_PROFILE: &str = "disabled";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStore {
    profiles: BTreeMap<String, Profile>,
    selected: String,
}

impl Default for ProfileStore {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DISABLED_PROFILE.to_string(), Profile::default());
        Self {
            profiles,
            selected: DISABLED_PROFILE.to_string(),
        }
    }
}

impl ProfileStore {
    /// Load from the persisted form: a JSON-encoded mapping plus the selected name
    pub fn from_settings(profiles_json: &str, selected: &str) -> Result<Self, LevelError> {
        let profiles: BTreeMap<String, Profile> = serde_json::from_str(profiles_json)?;
        Ok(Self::from_profiles(profiles, selected))
    }

    pub fn from_profiles(mut profiles: BTreeMap<String, Profile>, selected: &str) -> Self {
        if !profiles.contains_key(DISABLED_PROFILE) {
            warn!("Stored profiles lack the disabled profile, recreating defaults");
            profiles.insert(DISABLED_PROFILE.to_string(), Profile::default());
        }
        let selected = if profiles.contains_key(selected) {
            selected.to_string()
        } else {
            warn!(selected, "Selected profile not found, falling back to disabled");
            DISABLED_PROFILE.to_string()
        };
        info!(profiles = profiles.len(), selected = %selected, "Profiles loaded");
        Self { profiles, selected }
    }

    /// Serialized mapping as stored in settings
    pub fn to_settings_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string(&self.profiles)?)
    }

    pub fn selected_name(&self) -> &str {
        &self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.selected == DISABLED_PROFILE
    }

    pub fn selected(&self) -> &Profile {
        // selection always points at an existing entry
        &self.profiles[&self.selected]
    }

    pub fn selected_mut(&mut self) -> &mut Profile {
        self.profiles
            .get_mut(&self.selected)
            .unwrap_or_else(|| unreachable!("selected profile '{}' missing", self.selected))
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn select(&mut self, name: &str) -> Result<(), LevelError> {
        if !self.profiles.contains_key(name) {
            return Err(LevelError::UnknownProfile(name.to_string()));
        }
        debug!(from = %self.selected, to = name, "Profile selected");
        self.selected = name.to_string();
        Ok(())
    }

    /// Insert a copy of the disabled profile under a new name.
    /// Does not change the selection.
    pub fn add(&mut self, name: &str) -> Result<(), LevelError> {
        if name.trim().is_empty() {
            return Err(LevelError::InvalidProfileName);
        }
        if self.profiles.contains_key(name) {
            return Err(LevelError::DuplicateProfileName(name.to_string()));
        }
        let template = self.profiles[DISABLED_PROFILE].clone();
        self.profiles.insert(name.to_string(), template);
        info!(name, "Profile added");
        Ok(())
    }

    /// Delete the selected profile and fall back to the disabled profile
    pub fn remove_selected(&mut self) -> Result<String, LevelError> {
        if self.is_disabled() {
            return Err(LevelError::ReservedProfile(DISABLED_PROFILE.to_string()));
        }
        let name = std::mem::replace(&mut self.selected, DISABLED_PROFILE.to_string());
        self.profiles.remove(&name);
        info!(name = %name, "Profile removed");
        Ok(name)
    }

    /// Replace a stored profile's content (server push)
    pub fn replace(&mut self, name: &str, profile: Profile) -> Result<(), LevelError> {
        match self.profiles.get_mut(name) {
            Some(slot) => {
                *slot = profile;
                Ok(())
            }
            None => Err(LevelError::UnknownProfile(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::ProbeSample;

    #[test]
    fn test_add_clones_disabled_template() {
        let mut store = ProfileStore::default();
        store.selected_mut().max_x = 235.0;

        store.add("A").unwrap();

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["A", "disabled"]);
        assert_eq!(store.get("A"), store.get(DISABLED_PROFILE));
        assert_eq!(store.selected_name(), DISABLED_PROFILE);
    }

    #[test]
    fn test_add_duplicate_leaves_store_unchanged() {
        let mut store = ProfileStore::default();
        store.add("A").unwrap();
        store.select("A").unwrap();
        store.selected_mut().min_y = 42.0;
        let before = store.clone();

        assert_eq!(
            store.add("A"),
            Err(LevelError::DuplicateProfileName("A".into()))
        );
        assert_eq!(store, before);
    }

    #[test]
    fn test_add_blank_name_rejected() {
        let mut store = ProfileStore::default();
        assert_eq!(store.add("  "), Err(LevelError::InvalidProfileName));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_selected_falls_back_to_disabled() {
        let mut store = ProfileStore::default();
        store.add("A").unwrap();
        store.add("B").unwrap();
        store.select("B").unwrap();

        assert_eq!(store.remove_selected().unwrap(), "B");
        assert_eq!(store.selected_name(), DISABLED_PROFILE);
        assert!(store.is_disabled());
        assert!(!store.contains("B"));
        assert!(store.contains("A"));
    }

    #[test]
    fn test_disabled_profile_cannot_be_removed() {
        let mut store = ProfileStore::default();
        assert!(matches!(
            store.remove_selected(),
            Err(LevelError::ReservedProfile(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_settings_round_trip_keeps_matrix() {
        let mut store = ProfileStore::default();
        store.add("bed").unwrap();
        store.select("bed").unwrap();
        store.selected_mut().matrix = vec![ProbeSample::new(0.0, 0.0, 0.3)];

        let json = store.to_settings_json().unwrap();
        let loaded = ProfileStore::from_settings(&json, "bed").unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_unknown_selection_falls_back() {
        let store = ProfileStore::from_settings(r#"{"disabled": {}}"#, "gone").unwrap();
        assert_eq!(store.selected_name(), DISABLED_PROFILE);
    }

    #[test]
    fn test_missing_disabled_profile_recreated() {
        let store = ProfileStore::from_settings(r#"{"A": {"max_x": 100}}"#, "A").unwrap();
        assert!(store.contains(DISABLED_PROFILE));
        assert_eq!(store.selected().max_x, 100.0);
    }

    #[test]
    fn test_loads_profiles_with_loose_numbers() {
        let store = ProfileStore::from_settings(
            r#"{"disabled": {}, "A": {"count_x": 5.5, "lift": null, "max_x": 120}}"#,
            "A",
        )
        .unwrap();
        assert_eq!(store.selected().count_x, 5);
        assert_eq!(store.selected().lift, 0.0);
        assert_eq!(store.selected().max_x, 120.0);
    }

    #[test]
    fn test_select_unknown_fails() {
        let mut store = ProfileStore::default();
        assert_eq!(
            store.select("nope"),
            Err(LevelError::UnknownProfile("nope".into()))
        );
        assert_eq!(store.selected_name(), DISABLED_PROFILE);
    }

    #[test]
    fn test_malformed_settings_reported() {
        assert!(matches!(
            ProfileStore::from_settings("not json", DISABLED_PROFILE),
            Err(LevelError::Decode(_))
        ));
    }
}
