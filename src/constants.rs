// src/constants.rs

/// The name of the configuration file, looked up inside the per-user config directory.
pub const CONFIG_FILENAME: &str = "tagmenu.toml";

/// The name of the per-user configuration directory (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "tagmenu";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV_VAR: &str = "TAGMENU_CONFIG";

/// The file a `FileSource` reads for the root fetch.
pub const ROOT_MENU_FILENAME: &str = "root.json";

/// The extension of every non-root menu file served by a `FileSource`.
pub const MENU_FILE_EXTENSION: &str = "json";

/// Depth of the prefetch launched once the root has been fetched.
pub const INIT_PREFETCH_DEPTH: u32 = 2;

/// Depth of the prefetch launched every time a menu's items are generated.
pub const ITEM_PREFETCH_DEPTH: u32 = 1;

/// How long a pending submenu waits before its spinner becomes visible.
pub const LOADING_DELAY_MS: u64 = 0;

/// Pixels moved per scroll-assist tick.
pub const SCROLL_STEP_PX: f64 = 6.0;

/// Interval between scroll-assist ticks while a scroll control is hovered.
pub const SCROLL_INTERVAL_MS: u64 = 10;

/// Default viewport used by the CLI when none is configured.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

/// Character-cell metrics used by the text surface to measure menus.
pub const CHAR_WIDTH_PX: f64 = 8.0;
pub const LINE_HEIGHT_PX: f64 = 32.0;
pub const ITEM_PADDING_PX: f64 = 20.0;

/// Width reserved for the submenu arrow / spinner column.
pub const EDGE_SPACER_PX: f64 = 15.0;

/// Height of each scroll control shown on menus that must scroll.
pub const SCROLL_BUTTON_PX: f64 = 20.0;
