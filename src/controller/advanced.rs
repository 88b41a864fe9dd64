//! Controller for the profile-based plugin (named profiles, persisted matrix)

use tracing::{debug, info, trace, warn};

use super::{Continuation, Effect, EffectTarget, GridView, SyncState};
use crate::core::{
    Command, InboundMessage, LevelError, ProbeBuffer, ProbeSample, Profile, ProfileForm,
    ProfileStore, SettingsPatch, DISABLED_PROFILE,
};
use crate::grid::{CanvasGeometry, DisplayList, GridRenderer};

/// Status value reported while a probing run is in progress
pub const PROBING_STATUS: &str = "PROBING";

/// Plugin instance state: store, form mirror, sample buffer and grid
pub struct LevelController {
    store: ProfileStore,
    form: ProfileForm,
    buffer: ProbeBuffer<GridView>,
    state: SyncState,
    status_text: Option<String>,
    last_error: Option<LevelError>,
    /// Profile the current run was started on
    run_profile: Option<String>,
    /// Selection saved but the server not yet told
    switch_pending: bool,
}

impl LevelController {
    pub fn new(store: ProfileStore, geometry: CanvasGeometry) -> Self {
        let form = ProfileForm::from_profile(store.selected());
        let buffer = ProbeBuffer::new(GridRenderer::new(geometry, DisplayList::default()));
        let mut controller = Self {
            store,
            form,
            buffer,
            state: SyncState::Idle,
            status_text: None,
            last_error: None,
            run_profile: None,
            switch_pending: false,
        };
        controller.load_selected();
        controller
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    /// Editable form; changes take effect on save or probe start
    pub fn form_mut(&mut self) -> &mut ProfileForm {
        &mut self.form
    }

    pub fn samples(&self) -> &[ProbeSample] {
        self.buffer.samples()
    }

    pub fn grid(&self) -> &GridView {
        self.buffer.observer()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_probing(&self) -> bool {
        self.state == SyncState::Probing
    }

    /// Saving or probing; the dashboard greys out actions
    pub fn is_busy(&self) -> bool {
        self.state != SyncState::Idle
    }

    pub fn is_disabled(&self) -> bool {
        self.store.is_disabled()
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn last_error(&self) -> Option<&LevelError> {
        self.last_error.as_ref()
    }

    /// Record an error from a user action for display
    pub fn report(&mut self, error: LevelError) {
        warn!(error = %error, "Action failed");
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Switch profile: mirror its fields, show its matrix, persist the selection.
    /// The server is notified once the selection is saved.
    pub fn select_profile(&mut self, name: &str) -> Result<Vec<Effect>, LevelError> {
        self.store.select(name)?;
        self.load_selected();
        self.switch_pending = true;
        info!(profile = name, disabled = self.is_disabled(), "Profile switched");
        Ok(vec![Effect::Persist {
            patch: SettingsPatch::SelectedProfile(name.to_string()),
            then: Continuation::NotifyProfileChanged,
        }])
    }

    /// Commit the form into the selected profile and persist all profiles
    pub fn save(&mut self) -> Result<Vec<Effect>, LevelError> {
        self.ensure_not_probing()?;
        self.commit_form()?;
        let effect = self.persist_profiles(Continuation::Idle)?;
        self.state = SyncState::Saving;
        debug!(profile = self.store.selected_name(), "Saving profile");
        Ok(vec![effect])
    }

    /// Clear the samples, commit and persist, then start probing once saved
    pub fn start_probe(&mut self) -> Result<Vec<Effect>, LevelError> {
        self.ensure_not_probing()?;
        self.form.parse()?;
        self.buffer.reset();
        self.commit_form()?;
        let effect = self.persist_profiles(Continuation::StartProbe)?;
        self.state = SyncState::Saving;
        self.run_profile = Some(self.store.selected_name().to_string());
        info!(profile = self.store.selected_name(), "Probe start requested");
        Ok(vec![effect])
    }

    pub fn cancel_probe(&mut self) -> Vec<Effect> {
        info!("Probe cancel requested");
        self.state = SyncState::Idle;
        vec![Effect::Send(Command::ProbeCancel)]
    }

    /// Add a profile cloned from the disabled template; selects it once saved
    pub fn add_profile(&mut self, name: &str) -> Result<Vec<Effect>, LevelError> {
        self.store.add(name)?;
        Ok(vec![self.persist_profiles(Continuation::SelectAdded(name.to_string()))?])
    }

    /// Delete the selected profile; selection falls back to the disabled profile
    pub fn remove_profile(&mut self) -> Result<Vec<Effect>, LevelError> {
        self.store.remove_selected()?;
        self.load_selected();
        Ok(vec![self.persist_profiles(Continuation::Removed)?])
    }

    /// Apply one push message addressed to this plugin
    pub fn handle_message(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Status { status, text } => {
                if status == PROBING_STATUS {
                    self.state = SyncState::Probing;
                } else if self.state == SyncState::Probing {
                    self.state = SyncState::Idle;
                }
                debug!(status = %status, state = ?self.state, "Status updated");
                self.status_text = Some(text.unwrap_or(status));
            }
            InboundMessage::Point(sample) => {
                self.buffer.append(sample);
            }
            InboundMessage::Profile(content) => {
                if let Some(profile) = content {
                    self.apply_pushed(*profile);
                }
                self.load_selected();
                debug!(profile = self.store.selected_name(), "Profile resynced from store");
            }
        }
    }

    /// Pushed content names no profile. It belongs to the run this client
    /// started, otherwise to the selection unless a switch is still in flight.
    fn apply_pushed(&mut self, profile: Profile) {
        let target = match self.run_profile.take() {
            Some(name) => name,
            None if self.switch_pending => {
                debug!("Pushed profile dropped during a profile switch");
                return;
            }
            None => self.store.selected_name().to_string(),
        };
        if let Err(e) = self.store.replace(&target, profile) {
            warn!(error = %e, "Pushed profile not applied");
        }
    }

    fn ensure_not_probing(&self) -> Result<(), LevelError> {
        if self.is_probing() {
            return Err(LevelError::ProbeInProgress);
        }
        Ok(())
    }

    /// Push the selected profile into the form and the grid
    fn load_selected(&mut self) {
        let profile = self.store.selected();
        self.form.load(profile);
        self.buffer.observer_mut().set_bounds(profile.bounds());
        self.buffer.replace_all(profile.matrix.clone());
    }

    /// Form values and current samples into the selected profile
    fn commit_form(&mut self) -> Result<(), LevelError> {
        let samples = self.buffer.samples().to_vec();
        let profile = self.store.selected_mut();
        self.form.commit_into(profile)?;
        profile.matrix = samples;
        let bounds = profile.bounds();
        // next redraw uses the committed bounds
        self.buffer.observer_mut().set_bounds(bounds);
        Ok(())
    }

    fn persist_profiles(&self, then: Continuation) -> Result<Effect, LevelError> {
        Ok(Effect::Persist {
            patch: SettingsPatch::Profiles(self.store.to_settings_json()?),
            then,
        })
    }

    fn follow_up(&mut self, result: Result<Vec<Effect>, LevelError>) -> Vec<Effect> {
        result.unwrap_or_else(|e| {
            self.report(e);
            Vec::new()
        })
    }
}

impl EffectTarget for LevelController {
    fn on_persisted(&mut self, then: Continuation) -> Vec<Effect> {
        trace!(?then, "Settings persisted");
        match then {
            Continuation::Idle => {
                if self.state == SyncState::Saving {
                    self.state = SyncState::Idle;
                }
                Vec::new()
            }
            Continuation::StartProbe => {
                self.state = SyncState::Probing;
                vec![Effect::Send(Command::ProbeStart)]
            }
            Continuation::NotifyProfileChanged => {
                self.switch_pending = false;
                vec![Effect::Send(Command::ProfileChanged)]
            }
            Continuation::SelectAdded(name) => {
                let result = self.select_profile(&name);
                self.follow_up(result)
            }
            Continuation::Removed => {
                let result = self.select_profile(DISABLED_PROFILE);
                self.follow_up(result)
            }
        }
    }

    fn on_persist_failed(&mut self, then: Continuation, error: LevelError) {
        warn!(?then, error = %error, "Persisting settings failed, follow-up skipped");
        match then {
            Continuation::NotifyProfileChanged => self.switch_pending = false,
            Continuation::StartProbe => self.run_profile = None,
            _ => {}
        }
        if self.state == SyncState::Saving {
            self.state = SyncState::Idle;
        }
        self.last_error = Some(error);
    }

    fn on_command_failed(&mut self, command: Command, error: LevelError) {
        warn!(command = command.name(), error = %error, "Command failed");
        if command == Command::ProbeStart && self.state == SyncState::Probing {
            self.state = SyncState::Idle;
            self.run_profile = None;
        }
        self.last_error = Some(error);
    }
}
