//! Leveling profile schema and the editable form mirroring the selected profile
//!
//! Every profile carries the same fixed set of typed fields. Coercion from
//! user-entered text is declared per field through [`FieldKind`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::buffer::ProbeSample;
use super::error::LevelError;
use crate::grid::Bounds;

/// How a field's user-entered text is coerced on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int,
    Flag,
}

/// Editable profile fields (everything except the server-written matrix data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    MinX,
    MaxX,
    MinY,
    MaxY,
    CountX,
    CountY,
    OffsetX,
    OffsetY,
    OffsetZ,
    Lift,
    LiftFeed,
    Fade,
    Divide,
    SafeHoming,
    HomeX,
    HomeY,
    HomeFeed,
}

impl ProfileField {
    pub const ALL: &'static [ProfileField] = &[
        ProfileField::MinX,
        ProfileField::MaxX,
        ProfileField::MinY,
        ProfileField::MaxY,
        ProfileField::CountX,
        ProfileField::CountY,
        ProfileField::OffsetX,
        ProfileField::OffsetY,
        ProfileField::OffsetZ,
        ProfileField::Lift,
        ProfileField::LiftFeed,
        ProfileField::Fade,
        ProfileField::Divide,
        ProfileField::SafeHoming,
        ProfileField::HomeX,
        ProfileField::HomeY,
        ProfileField::HomeFeed,
    ];

    /// Persisted key name
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::MinX => "min_x",
            ProfileField::MaxX => "max_x",
            ProfileField::MinY => "min_y",
            ProfileField::MaxY => "max_y",
            ProfileField::CountX => "count_x",
            ProfileField::CountY => "count_y",
            ProfileField::OffsetX => "offset_x",
            ProfileField::OffsetY => "offset_y",
            ProfileField::OffsetZ => "offset_z",
            ProfileField::Lift => "lift",
            ProfileField::LiftFeed => "lift_feed",
            ProfileField::Fade => "fade",
            ProfileField::Divide => "divide",
            ProfileField::SafeHoming => "safe_homing",
            ProfileField::HomeX => "home_x",
            ProfileField::HomeY => "home_y",
            ProfileField::HomeFeed => "home_feed",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ProfileField::CountX | ProfileField::CountY => FieldKind::Int,
            ProfileField::SafeHoming => FieldKind::Flag,
            _ => FieldKind::Float,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::MinX => "Min X",
            ProfileField::MaxX => "Max X",
            ProfileField::MinY => "Min Y",
            ProfileField::MaxY => "Max Y",
            ProfileField::CountX => "Points X",
            ProfileField::CountY => "Points Y",
            ProfileField::OffsetX => "Probe offset X",
            ProfileField::OffsetY => "Probe offset Y",
            ProfileField::OffsetZ => "Probe offset Z",
            ProfileField::Lift => "Lift",
            ProfileField::LiftFeed => "Lift feed",
            ProfileField::Fade => "Fade height",
            ProfileField::Divide => "Subdivide moves",
            ProfileField::SafeHoming => "Safe homing",
            ProfileField::HomeX => "Home X",
            ProfileField::HomeY => "Home Y",
            ProfileField::HomeFeed => "Home feed",
        }
    }

    /// Coerce user text into a typed value
    pub fn parse(self, text: &str) -> Result<FieldValue, LevelError> {
        parse_field(self.key(), self.kind(), text)
    }
}

/// Coerce text for a field of the given kind; `key` names the field in errors
pub fn parse_field(key: &'static str, kind: FieldKind, text: &str) -> Result<FieldValue, LevelError> {
    let invalid = || LevelError::InvalidField {
        field: key,
        value: text.to_string(),
    };
    let trimmed = text.trim();
    match kind {
        FieldKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(invalid),
        FieldKind::Int => trimmed.parse::<u32>().map(FieldValue::Int).map_err(|_| invalid()),
        FieldKind::Flag => match trimmed {
            "true" | "1" => Ok(FieldValue::Flag(true)),
            "false" | "0" => Ok(FieldValue::Flag(false)),
            _ => Err(invalid()),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(u32),
    Flag(bool),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Flag(v) => write!(f, "{}", v),
        }
    }
}

/// One named leveling setup, including its last probed matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredProfile")]
pub struct Profile {
    pub matrix: Vec<ProbeSample>,
    /// Server-written timestamp of the last completed probing run
    pub matrix_updated: f64,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub count_x: u32,
    pub count_y: u32,
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_z: f64,
    pub lift: f64,
    pub lift_feed: f64,
    pub fade: f64,
    pub divide: f64,
    pub safe_homing: bool,
    pub home_x: f64,
    pub home_y: f64,
    pub home_feed: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            matrix: Vec::new(),
            matrix_updated: 0.0,
            min_x: 0.0,
            min_y: 0.0,
            max_x: 200.0,
            max_y: 200.0,
            count_x: 5,
            count_y: 5,
            offset_x: 0.0,
            offset_y: 0.0,
            offset_z: 0.0,
            lift: 0.0,
            lift_feed: 300.0,
            fade: 2.0,
            divide: 30.0,
            safe_homing: false,
            home_x: 100.0,
            home_y: 100.0,
            home_feed: 3000.0,
        }
    }
}

/// Profile as found in settings. Older dashboards stored every numeric
/// entry through a float parse, so counts may be fractional and blank
/// entries come back as `null`.
#[derive(Default, Deserialize)]
#[serde(default)]
struct StoredProfile {
    matrix: Option<Vec<ProbeSample>>,
    matrix_updated: Option<f64>,
    min_x: Option<f64>,
    min_y: Option<f64>,
    max_x: Option<f64>,
    max_y: Option<f64>,
    count_x: Option<f64>,
    count_y: Option<f64>,
    offset_x: Option<f64>,
    offset_y: Option<f64>,
    offset_z: Option<f64>,
    lift: Option<f64>,
    lift_feed: Option<f64>,
    fade: Option<f64>,
    divide: Option<f64>,
    safe_homing: Option<bool>,
    home_x: Option<f64>,
    home_y: Option<f64>,
    home_feed: Option<f64>,
}

fn stored_count(value: Option<f64>, default: u32) -> u32 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 => v.trunc() as u32,
        Some(v) => {
            warn!(value = v, "Stored count out of range, using default");
            default
        }
        None => default,
    }
}

impl From<StoredProfile> for Profile {
    fn from(raw: StoredProfile) -> Self {
        let d = Profile::default();
        Self {
            matrix: raw.matrix.unwrap_or_default(),
            matrix_updated: raw.matrix_updated.unwrap_or(d.matrix_updated),
            min_x: raw.min_x.unwrap_or(d.min_x),
            min_y: raw.min_y.unwrap_or(d.min_y),
            max_x: raw.max_x.unwrap_or(d.max_x),
            max_y: raw.max_y.unwrap_or(d.max_y),
            count_x: stored_count(raw.count_x, d.count_x),
            count_y: stored_count(raw.count_y, d.count_y),
            offset_x: raw.offset_x.unwrap_or(d.offset_x),
            offset_y: raw.offset_y.unwrap_or(d.offset_y),
            offset_z: raw.offset_z.unwrap_or(d.offset_z),
            lift: raw.lift.unwrap_or(d.lift),
            lift_feed: raw.lift_feed.unwrap_or(d.lift_feed),
            fade: raw.fade.unwrap_or(d.fade),
            divide: raw.divide.unwrap_or(d.divide),
            safe_homing: raw.safe_homing.unwrap_or(d.safe_homing),
            home_x: raw.home_x.unwrap_or(d.home_x),
            home_y: raw.home_y.unwrap_or(d.home_y),
            home_feed: raw.home_feed.unwrap_or(d.home_feed),
        }
    }
}

impl Profile {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min_x, self.max_x, self.min_y, self.max_y)
    }

    pub fn get(&self, field: ProfileField) -> FieldValue {
        match field {
            ProfileField::CountX => FieldValue::Int(self.count_x),
            ProfileField::CountY => FieldValue::Int(self.count_y),
            ProfileField::SafeHoming => FieldValue::Flag(self.safe_homing),
            _ => FieldValue::Float(self.float(field).unwrap_or_default()),
        }
    }

    pub fn set(&mut self, field: ProfileField, value: FieldValue) {
        match (field, value) {
            (ProfileField::CountX, FieldValue::Int(v)) => self.count_x = v,
            (ProfileField::CountY, FieldValue::Int(v)) => self.count_y = v,
            (ProfileField::SafeHoming, FieldValue::Flag(v)) => self.safe_homing = v,
            (field, FieldValue::Float(v)) if field.kind() == FieldKind::Float => {
                if let Some(slot) = self.float_mut(field) {
                    *slot = v;
                }
            }
            (field, value) => {
                warn!(field = field.key(), ?value, "Value kind does not match field");
            }
        }
    }

    fn float(&self, field: ProfileField) -> Option<f64> {
        Some(match field {
            ProfileField::MinX => self.min_x,
            ProfileField::MaxX => self.max_x,
            ProfileField::MinY => self.min_y,
            ProfileField::MaxY => self.max_y,
            ProfileField::OffsetX => self.offset_x,
            ProfileField::OffsetY => self.offset_y,
            ProfileField::OffsetZ => self.offset_z,
            ProfileField::Lift => self.lift,
            ProfileField::LiftFeed => self.lift_feed,
            ProfileField::Fade => self.fade,
            ProfileField::Divide => self.divide,
            ProfileField::HomeX => self.home_x,
            ProfileField::HomeY => self.home_y,
            ProfileField::HomeFeed => self.home_feed,
            ProfileField::CountX | ProfileField::CountY | ProfileField::SafeHoming => return None,
        })
    }

    fn float_mut(&mut self, field: ProfileField) -> Option<&mut f64> {
        Some(match field {
            ProfileField::MinX => &mut self.min_x,
            ProfileField::MaxX => &mut self.max_x,
            ProfileField::MinY => &mut self.min_y,
            ProfileField::MaxY => &mut self.max_y,
            ProfileField::OffsetX => &mut self.offset_x,
            ProfileField::OffsetY => &mut self.offset_y,
            ProfileField::OffsetZ => &mut self.offset_z,
            ProfileField::Lift => &mut self.lift,
            ProfileField::LiftFeed => &mut self.lift_feed,
            ProfileField::Fade => &mut self.fade,
            ProfileField::Divide => &mut self.divide,
            ProfileField::HomeX => &mut self.home_x,
            ProfileField::HomeY => &mut self.home_y,
            ProfileField::HomeFeed => &mut self.home_feed,
            ProfileField::CountX | ProfileField::CountY | ProfileField::SafeHoming => return None,
        })
    }
}

/// A form entry as the user sees it
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Flag(bool),
}

/// Editable mirror of the selected profile's fields
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileForm {
    values: BTreeMap<ProfileField, FormValue>,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        let mut form = Self {
            values: BTreeMap::new(),
        };
        form.load(profile);
        form
    }

    /// Overwrite every entry with the profile's current values
    pub fn load(&mut self, profile: &Profile) {
        for &field in ProfileField::ALL {
            let value = match profile.get(field) {
                FieldValue::Flag(v) => FormValue::Flag(v),
                other => FormValue::Text(other.to_string()),
            };
            self.values.insert(field, value);
        }
    }

    pub fn text(&self, field: ProfileField) -> &str {
        match self.values.get(&field) {
            Some(FormValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn flag(&self, field: ProfileField) -> bool {
        matches!(self.values.get(&field), Some(FormValue::Flag(true)))
    }

    pub fn set_text(&mut self, field: ProfileField, text: impl Into<String>) {
        if field.kind() == FieldKind::Flag {
            warn!(field = field.key(), "Text entry for a flag field ignored");
            return;
        }
        self.values.insert(field, FormValue::Text(text.into()));
    }

    pub fn set_flag(&mut self, field: ProfileField, value: bool) {
        if field.kind() != FieldKind::Flag {
            warn!(field = field.key(), "Flag entry for a numeric field ignored");
            return;
        }
        self.values.insert(field, FormValue::Flag(value));
    }

    pub fn text_mut(&mut self, field: ProfileField) -> Option<&mut String> {
        match self.values.get_mut(&field) {
            Some(FormValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn flag_mut(&mut self, field: ProfileField) -> Option<&mut bool> {
        match self.values.get_mut(&field) {
            Some(FormValue::Flag(v)) => Some(v),
            _ => None,
        }
    }

    /// Parse every entry; fails on the first field that does not coerce
    pub fn parse(&self) -> Result<Vec<(ProfileField, FieldValue)>, LevelError> {
        ProfileField::ALL
            .iter()
            .map(|&field| {
                let value = match self.values.get(&field) {
                    Some(FormValue::Text(s)) => field.parse(s)?,
                    Some(FormValue::Flag(v)) => FieldValue::Flag(*v),
                    None => {
                        return Err(LevelError::InvalidField {
                            field: field.key(),
                            value: String::new(),
                        })
                    }
                };
                Ok((field, value))
            })
            .collect()
    }

    /// Write all entries into the profile, or nothing if any entry is invalid
    pub fn commit_into(&self, profile: &mut Profile) -> Result<(), LevelError> {
        for (field, value) in self.parse()? {
            profile.set(field, value);
        }
        Ok(())
    }
}
