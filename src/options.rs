use serde::Deserialize;

/// Frame configuration.
///
/// Every field defaults to `false`, so an empty TOML document is a valid configuration:
///
/// ```toml
/// disable_cache = true
/// automatic_back_button = true
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameOptions {
    /// Release every screen as soon as it is navigated away from, regardless of its cache mode.
    pub disable_cache: bool,

    /// Drive the host’s back-button visibility from `can_go_back`.
    pub automatic_back_button: bool,

    /// The toolkit’s content transitions are in charge; the frame’s default transition is not
    /// used. Transitions on requests or screens still are.
    pub toolkit_transitions: bool,
}

impl FrameOptions {
    pub fn from_toml_str(source: &str) -> Result<FrameOptions, toml::de::Error> {
        toml::from_str(source)
    }
}
