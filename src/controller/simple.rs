//! Controller for the single-grid plugin (four flat settings, no profiles)

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{Continuation, Effect, EffectTarget, GridView, SyncState, PROBING_STATUS};
use crate::core::{
    parse_field, Command, FieldKind, FieldValue, InboundMessage, LevelError, PcbSettings,
    ProbeBuffer, ProbeSample, SettingsPatch,
};
use crate::grid::{Bounds, CanvasGeometry, DisplayList, GridRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PcbField {
    ProbeWidth,
    ProbeHeight,
    PointsX,
    PointsY,
}

impl PcbField {
    pub const ALL: &'static [PcbField] = &[
        PcbField::ProbeWidth,
        PcbField::ProbeHeight,
        PcbField::PointsX,
        PcbField::PointsY,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PcbField::ProbeWidth => "probeWidth",
            PcbField::ProbeHeight => "probeHeight",
            PcbField::PointsX => "pointsX",
            PcbField::PointsY => "pointsY",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            PcbField::ProbeWidth | PcbField::ProbeHeight => FieldKind::Float,
            PcbField::PointsX | PcbField::PointsY => FieldKind::Int,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PcbField::ProbeWidth => "Probe width",
            PcbField::ProbeHeight => "Probe height",
            PcbField::PointsX => "Points X",
            PcbField::PointsY => "Points Y",
        }
    }
}

/// Text entries for the four settings
#[derive(Debug, Clone, PartialEq)]
pub struct PcbForm {
    values: BTreeMap<PcbField, String>,
}

impl PcbForm {
    pub fn from_settings(settings: &PcbSettings) -> Self {
        let values = PcbField::ALL
            .iter()
            .map(|&field| {
                let text = match field {
                    PcbField::ProbeWidth => settings.probe_width.to_string(),
                    PcbField::ProbeHeight => settings.probe_height.to_string(),
                    PcbField::PointsX => settings.points_x.to_string(),
                    PcbField::PointsY => settings.points_y.to_string(),
                };
                (field, text)
            })
            .collect();
        Self { values }
    }

    pub fn text(&self, field: PcbField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set_text(&mut self, field: PcbField, text: impl Into<String>) {
        self.values.insert(field, text.into());
    }

    pub fn text_mut(&mut self, field: PcbField) -> &mut String {
        self.values.entry(field).or_default()
    }

    pub fn parse(&self) -> Result<PcbSettings, LevelError> {
        let mut settings = PcbSettings::default();
        for &field in PcbField::ALL {
            match (field, parse_field(field.key(), field.kind(), self.text(field))?) {
                (PcbField::ProbeWidth, FieldValue::Float(v)) => settings.probe_width = v,
                (PcbField::ProbeHeight, FieldValue::Float(v)) => settings.probe_height = v,
                (PcbField::PointsX, FieldValue::Int(v)) => settings.points_x = v,
                (PcbField::PointsY, FieldValue::Int(v)) => settings.points_y = v,
                (field, value) => {
                    warn!(field = field.key(), ?value, "Unexpected value kind");
                }
            }
        }
        Ok(settings)
    }
}

pub struct PcbController {
    settings: PcbSettings,
    form: PcbForm,
    buffer: ProbeBuffer<GridView>,
    state: SyncState,
    status_text: Option<String>,
    last_error: Option<LevelError>,
}

impl PcbController {
    pub fn new(settings: PcbSettings, geometry: CanvasGeometry) -> Self {
        let mut renderer = GridRenderer::new(geometry, DisplayList::default());
        renderer.set_bounds(Bounds::from_extent(settings.probe_width, settings.probe_height));
        let mut buffer = ProbeBuffer::new(renderer);
        // draw the empty frame
        buffer.reset();
        Self {
            settings,
            form: PcbForm::from_settings(&settings),
            buffer,
            state: SyncState::Idle,
            status_text: None,
            last_error: None,
        }
    }

    pub fn settings(&self) -> &PcbSettings {
        &self.settings
    }

    pub fn form(&self) -> &PcbForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PcbForm {
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

    pub fn is_busy(&self) -> bool {
        self.state != SyncState::Idle
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn last_error(&self) -> Option<&LevelError> {
        self.last_error.as_ref()
    }

    pub fn report(&mut self, error: LevelError) {
        warn!(error = %error, "Action failed");
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Parse the form, size the grid to the probed area and start a run
    pub fn start_probe(&mut self) -> Result<Vec<Effect>, LevelError> {
        if self.is_probing() {
            return Err(LevelError::ProbeInProgress);
        }
        let settings = self.form.parse()?;
        self.settings = settings;
        self.buffer
            .observer_mut()
            .set_bounds(Bounds::from_extent(settings.probe_width, settings.probe_height));
        self.buffer.reset();
        self.state = SyncState::Probing;
        info!(
            width = settings.probe_width,
            height = settings.probe_height,
            points_x = settings.points_x,
            points_y = settings.points_y,
            "Probe start requested"
        );
        Ok(vec![Effect::Send(Command::PcbProbeStart {
            probe_width: settings.probe_width,
            probe_height: settings.probe_height,
            points_x: settings.points_x,
            points_y: settings.points_y,
        })])
    }

    /// Persist the four settings
    pub fn save(&mut self) -> Result<Vec<Effect>, LevelError> {
        if self.is_probing() {
            return Err(LevelError::ProbeInProgress);
        }
        let settings = self.form.parse()?;
        self.settings = settings;
        self.state = SyncState::Saving;
        debug!(?settings, "Saving grid settings");
        Ok(vec![Effect::Persist {
            patch: SettingsPatch::Pcb(settings),
            then: Continuation::Idle,
        }])
    }

    pub fn cancel_probe(&mut self) -> Vec<Effect> {
        info!("Probe cancel requested");
        self.state = SyncState::Idle;
        vec![Effect::Send(Command::PcbProbeCancel)]
    }

    pub fn handle_message(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Status { status, text } => {
                if status == PROBING_STATUS {
                    self.state = SyncState::Probing;
                } else if self.state == SyncState::Probing {
                    self.state = SyncState::Idle;
                }
                self.status_text = Some(text.unwrap_or(status));
            }
            InboundMessage::Point(sample) => self.buffer.append(sample),
            InboundMessage::Profile(_) => {
                debug!("Profile message ignored by the single-grid plugin");
            }
        }
    }
}

impl EffectTarget for PcbController {
    fn on_persisted(&mut self, then: Continuation) -> Vec<Effect> {
        if self.state == SyncState::Saving {
            self.state = SyncState::Idle;
        }
        if then != Continuation::Idle {
            warn!(?then, "Unexpected continuation for the single-grid plugin");
        }
        Vec::new()
    }

    fn on_persist_failed(&mut self, _then: Continuation, error: LevelError) {
        warn!(error = %error, "Persisting grid settings failed");
        if self.state == SyncState::Saving {
            self.state = SyncState::Idle;
        }
        self.last_error = Some(error);
    }

    fn on_command_failed(&mut self, command: Command, error: LevelError) {
        warn!(command = command.name(), error = %error, "Command failed");
        if matches!(command, Command::PcbProbeStart { .. }) && self.state == SyncState::Probing {
            self.state = SyncState::Idle;
        }
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PcbController {
        PcbController::new(PcbSettings::default(), CanvasGeometry::default())
    }

    #[test]
    fn test_form_mirrors_settings() {
        let ctrl = controller();
        assert_eq!(ctrl.form().text(PcbField::ProbeWidth), "100");
        assert_eq!(ctrl.form().text(PcbField::PointsY), "5");
        assert_eq!(PcbField::from_key("pointsX"), Some(PcbField::PointsX));
    }

    #[test]
    fn test_start_probe_sends_dimensions() {
        let mut ctrl = controller();
        ctrl.handle_message(InboundMessage::Point(ProbeSample::new(1.0, 1.0, 0.1)));
        ctrl.form_mut().set_text(PcbField::ProbeWidth, "80.5");
        ctrl.form_mut().set_text(PcbField::PointsX, "7");

        let effects = ctrl.start_probe().unwrap();

        assert_eq!(
            effects,
            vec![Effect::Send(Command::PcbProbeStart {
                probe_width: 80.5,
                probe_height: 100.0,
                points_x: 7,
                points_y: 5,
            })]
        );
        assert!(ctrl.samples().is_empty());
        assert!(ctrl.is_probing());
        assert_eq!(ctrl.grid().bounds(), Some(Bounds::new(0.0, 80.5, 0.0, 100.0)));
    }

    #[test]
    fn test_start_probe_rejects_bad_count() {
        let mut ctrl = controller();
        ctrl.form_mut().set_text(PcbField::PointsY, "2.5");

        assert!(matches!(
            ctrl.start_probe(),
            Err(LevelError::InvalidField { field: "pointsY", .. })
        ));
        assert_eq!(ctrl.state(), SyncState::Idle);
    }

    #[test]
    fn test_points_drawn_in_probe_area() {
        let mut ctrl = controller();
        ctrl.start_probe().unwrap();
        ctrl.handle_message(InboundMessage::Point(ProbeSample::new(50.0, 50.0, -0.3)));

        let labels: Vec<_> = ctrl.grid().surface().labels().collect();
        assert_eq!(labels, vec![("-0.3", 150.0, 150.0)]);
    }

    #[test]
    fn test_status_end_leaves_probing() {
        let mut ctrl = controller();
        ctrl.start_probe().unwrap();

        ctrl.handle_message(InboundMessage::Status {
            status: "PROBING".into(),
            text: Some("Point 3 of 25".into()),
        });
        assert!(ctrl.is_probing());
        assert_eq!(ctrl.status_text(), Some("Point 3 of 25"));

        ctrl.handle_message(InboundMessage::Status {
            status: "IDLE".into(),
            text: None,
        });
        assert!(!ctrl.is_probing());
        assert_eq!(ctrl.status_text(), Some("IDLE"));
    }

    #[test]
    fn test_save_persists_settings() {
        let mut ctrl = controller();
        ctrl.form_mut().set_text(PcbField::ProbeHeight, "60");

        let effects = ctrl.save().unwrap();
        let expected = PcbSettings {
            probe_height: 60.0,
            ..PcbSettings::default()
        };
        assert_eq!(
            effects,
            vec![Effect::Persist {
                patch: SettingsPatch::Pcb(expected),
                then: Continuation::Idle,
            }]
        );

        assert!(ctrl.on_persisted(Continuation::Idle).is_empty());
        assert_eq!(ctrl.state(), SyncState::Idle);
        assert_eq!(ctrl.settings(), &expected);
    }

    #[test]
    fn test_save_during_run_keeps_probing() {
        let mut ctrl = controller();
        ctrl.start_probe().unwrap();
        ctrl.handle_message(InboundMessage::Point(ProbeSample::new(10.0, 10.0, 0.2)));

        assert_eq!(ctrl.save(), Err(LevelError::ProbeInProgress));
        assert_eq!(ctrl.start_probe(), Err(LevelError::ProbeInProgress));
        assert!(ctrl.is_probing());
        assert_eq!(ctrl.samples().len(), 1);
    }

    #[test]
    fn test_cancel_and_failed_start() {
        let mut ctrl = controller();
        assert_eq!(ctrl.cancel_probe(), vec![Effect::Send(Command::PcbProbeCancel)]);

        let effects = ctrl.start_probe().unwrap();
        let Effect::Send(cmd) = effects[0].clone() else {
            panic!("expected command");
        };
        ctrl.on_command_failed(cmd, LevelError::Network("timeout".into()));
        assert_eq!(ctrl.state(), SyncState::Idle);
        assert!(ctrl.last_error().is_some());
    }

    #[test]
    fn test_profile_message_ignored() {
        let mut ctrl = controller();
        ctrl.handle_message(InboundMessage::Profile(None));
        assert_eq!(ctrl.grid().redraws(), 1);
        assert!(ctrl.samples().is_empty());
    }
}
