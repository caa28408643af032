use phf::{phf_map, phf_set};

/// Index of the first potentially-translatable parameter of an MZ plugin
/// command. Earlier slots hold the plugin name, command name, and comment.
pub const MZ_PLUGIN_PARAM_OFFSET: usize = 3;

/// Database files and the record fields worth extracting from each.
pub static DATABASE_FILES: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "Actors.json" => &["name", "nickname", "profile"],
    "Classes.json" => &["name"],
    "Items.json" => &["name", "description"],
    "Weapons.json" => &["name", "description"],
    "Armors.json" => &["name", "description"],
    "Skills.json" => &["name", "description", "message1", "message2"],
    "States.json" => &["name", "message1", "message2", "message3", "message4"],
    "Enemies.json" => &["name"],
    "Troops.json" => &["name"],
};

/// System.json type arrays shown in battle and equipment menus.
pub const SYSTEM_TYPE_ARRAYS: [&str; 5] =
    ["elements", "skillTypes", "weaponTypes", "armorTypes", "equipTypes"];

/// Message window plugins whose parameters override the default metrics.
/// Values: (width parameter, rows parameter, word-wrap parameter).
pub static MESSAGE_PLUGINS: phf::Map<
    &'static str,
    (&'static str, &'static str, &'static str),
> = phf_map! {
    "YEP_MessageCore" => ("Default Width", "Message Rows", "Word Wrapping"),
    "VisuMZ_MessageCore" => (
        "General:MessageWindow:MessageWidth",
        "General:MessageWindow:MessageRows",
        "Word Wrap:EnableWordWrap",
    ),
    "CGMZ_MessageSystem" => ("Window Width", "", ""),
    "MessageWindowPopup" => ("", "", ""),
    "Galv_MessageStyles" => ("", "", ""),
};

/// Plugin name fragments that imply word-wrap capability even without an
/// explicit word-wrap parameter.
pub static WORDWRAP_PLUGIN_HINTS: phf::Set<&'static str> = phf_set! {
    "yep",
    "visumz",
};

/// Tag understood by the known word-wrap plugins.
pub const WORDWRAP_TAG: &str = "<WordWrap>";

/// Default RPG Maker MV/MZ message window: 816px wide, 28px font,
/// roughly 4 lines of ~55 chars.
pub const DEFAULT_MESSAGE_WIDTH: u32 = 816;
pub const DEFAULT_FONT_SIZE: u32 = 28;
pub const DEFAULT_CHARS_PER_LINE: usize = 55;
pub const DEFAULT_MAX_LINES: usize = 4;

/// Horizontal padding inside the message window, both sides combined.
pub const MESSAGE_WINDOW_PADDING: u32 = 48;

/// Average glyph width relative to font size for Latin text.
pub const AVERAGE_CHAR_WIDTH_RATIO: f32 = 0.55;

/// Hard floor for the computed characters-per-line budget.
pub const MIN_CHARS_PER_LINE: usize = 20;

/// Dialogue entries kept as translation context for following entries.
pub const DEFAULT_CONTEXT_SIZE: usize = 3;

/// Completed entries between checkpoint saves during batch translation.
pub const CHECKPOINT_INTERVAL: usize = 25;

/// Suffix appended to `data` and `plugins` when backing up originals.
pub const BACKUP_SUFFIX: &str = "_original";

pub const SYSTEM_FILE: &str = "System.json";
pub const COMMON_EVENTS_FILE: &str = "CommonEvents.json";
pub const TROOPS_FILE: &str = "Troops.json";
pub const PLUGINS_FILE: &str = "plugins.js";

pub const PATCH_DATA_FILE: &str = "patch.json";
pub const PATCH_METADATA_FILE: &str = "metadata.json";
pub const PATCH_README_FILE: &str = "README.txt";
