use bitflags::bitflags;
use num_enum::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf, time::Duration};
use strum_macros::{Display, EnumIs};
use thiserror::Error;

/// 101 - Show Text header. Sets face/background/position; MZ appends the
/// speaker name as `parameters[4]`.
///
/// 401 - Show Text line. `parameters[0]` is one display line; consecutive
/// commands render as one message box.
///
/// 102 - Show Choices. `parameters[0]` is the array of choice strings.
///
/// 405 - Scroll Text line. Grouped like 401.
///
/// 320, 324, 325 - Change Actor Name/Nickname/Profile. `parameters[1]` is
/// the new value.
///
/// 356 - Plugin Command (MV). `parameters[0]` is the whole command string.
///
/// 357 - Plugin Command (MZ). String parameters from `parameters[3]` onward
/// may carry display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs, FromPrimitive)]
#[repr(u16)]
pub enum Code {
    TextHeader = 101,
    Text = 401,
    Choices = 102,
    ScrollText = 405,
    ChangeName = 320,
    ChangeNickname = 324,
    ChangeProfile = 325,
    PluginMv = 356,
    PluginMz = 357,
    #[num_enum(default)]
    Other = 0,
}

impl Code {
    /// Codes whose consecutive runs form one logical text block.
    #[must_use]
    pub const fn is_block_text(self) -> bool {
        matches!(self, Self::Text | Self::ScrollText)
    }

    #[must_use]
    pub const fn is_any_change_actor(self) -> bool {
        matches!(
            self,
            Self::ChangeName | Self::ChangeNickname | Self::ChangeProfile
        )
    }
}

/// Translation lifecycle of an [`Entry`].
///
/// `Untranslated` → `Translated` on LLM or manual fill, `Translated` →
/// `Reviewed` on human confirmation, any → `Skipped` on explicit exclusion,
/// and `Translated`/`Reviewed` → `Untranslated` when the translation is
/// cleared or the entry is reopened.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Untranslated,
    Translated,
    Reviewed,
    Skipped,
}

impl Status {
    /// Entry carries a usable translation.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Translated | Self::Reviewed)
    }
}

/// Per-field metadata driving context hints and reflow policy.
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    /// Short hint passed to the translation capability.
    pub hint: &'static str,
    /// Whether the reflow engine may rewrap this field.
    pub reflow: bool,
}

/// Semantic tag of a translatable unit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Dialog,
    Choice,
    ScrollText,
    SpeakerName,
    Name,
    Nickname,
    Profile,
    Description,
    Message,
    Term,
    GameTitle,
    DisplayName,
    PluginParam,
    PluginCommand,
}

impl Field {
    #[must_use]
    pub const fn meta(self) -> FieldMeta {
        match self {
            Self::Dialog => FieldMeta { hint: "game dialogue", reflow: true },
            Self::ScrollText => {
                FieldMeta { hint: "scrolling narration", reflow: true }
            }
            Self::Choice => FieldMeta { hint: "menu choice", reflow: false },
            Self::SpeakerName => {
                FieldMeta { hint: "character name", reflow: false }
            }
            Self::Name => FieldMeta { hint: "name", reflow: false },
            Self::Nickname => FieldMeta { hint: "title", reflow: false },
            Self::Profile => {
                FieldMeta { hint: "character bio", reflow: false }
            }
            Self::Description => {
                FieldMeta { hint: "item description", reflow: false }
            }
            Self::Message => {
                FieldMeta { hint: "battle message", reflow: false }
            }
            Self::Term => FieldMeta { hint: "menu term", reflow: false },
            Self::GameTitle => FieldMeta { hint: "game title", reflow: false },
            Self::DisplayName => {
                FieldMeta { hint: "location name", reflow: false }
            }
            Self::PluginParam => {
                FieldMeta { hint: "plugin text", reflow: false }
            }
            Self::PluginCommand => {
                FieldMeta { hint: "plugin text", reflow: false }
            }
        }
    }

    /// Maps a database record field name to its semantic tag.
    #[must_use]
    pub fn from_database_field(name: &str) -> Self {
        match name {
            "name" => Self::Name,
            "nickname" => Self::Nickname,
            "profile" => Self::Profile,
            "description" => Self::Description,
            _ => Self::Message,
        }
    }
}

/// One translatable unit with a stable id and write-back location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Deterministic id derived from source file + structural path.
    /// Uniquely determines the write-back location within a project.
    pub id: String,
    /// Source filename the entry belongs to.
    pub file: String,
    pub field: Field,
    /// Source-language text, immutable after extraction.
    pub original: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub status: Status,
    /// Speaker tag and recent dialogue supplied to the translator.
    /// Not written back to the game.
    #[serde(default)]
    pub context: String,
}

impl Entry {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        file: impl Into<String>,
        field: Field,
        original: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            field,
            original: original.into(),
            translation: String::new(),
            status: Status::Untranslated,
            context: String::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Stores a translation. An empty text reopens the entry.
    pub fn set_translation(&mut self, text: impl Into<String>) {
        self.translation = text.into();

        self.status = if self.translation.is_empty() {
            Status::Untranslated
        } else {
            Status::Translated
        };
    }

    /// Confirms a translated entry. No-op for any other state.
    pub fn review(&mut self) {
        if self.status.is_translated() {
            self.status = Status::Reviewed;
        }
    }

    pub fn skip(&mut self) {
        self.status = Status::Skipped;
    }

    /// Reopens the entry for retranslation, keeping the old text around.
    pub fn reopen(&mut self) {
        self.status = Status::Untranslated;
    }
}

/// Pronoun gender hint for a game character, supplied to the translation
/// capability so dialogue keeps consistent pronouns.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Engine variant of the processed game.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngineType {
    #[default]
    Mv,
    Mz,
}

bitflags! {
    /// Selects which file classes extraction and injection visit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u8 {
        /// `Mapxxx.json` files.
        const Map = 1 << 0;

        /// Record-array database files (`Actors.json`, `Items.json`, ...).
        const Database = 1 << 1;

        /// `System.json`.
        const System = 1 << 2;

        /// `CommonEvents.json`.
        const CommonEvents = 1 << 3;

        /// `Troops.json` battle event pages.
        const Troops = 1 << 4;

        /// `js/plugins.js` parameters.
        const Plugins = 1 << 5;
    }
}

impl Default for FileFlags {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}: IO error occurred: {1}", path = .0.display())]
    Io(PathBuf, io::Error),
    #[error("Parsing JSON data failed with: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error(
        "No `data` folder found under {path}. Select an RPG Maker MV/MZ game folder.",
        path = .0.display()
    )]
    NoDataDir(PathBuf),
    #[error("{path} does not contain a `$plugins` array literal.", path = .0.display())]
    MalformedPlugins(PathBuf),
    #[error("Patch archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Per-entry failure of the external translation capability. Never fatal to
/// a batch; the entry stays untranslated.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation backend unreachable: {0}")]
    Transport(String),
    #[error("translation request timed out after {0:?}")]
    Timeout(Duration),
}
