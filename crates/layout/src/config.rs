#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// The maximum number of measurements kept by the measurement cache before
    /// the least recently used fingerprint is evicted.
    ///
    /// - **Higher values**: Fewer calls into the external measurer while
    ///   editing long documents, but higher memory usage.
    /// - **Lower values**: Lower memory usage, but blocks scrolled out of the
    ///   working set are measured again.
    ///
    /// Defaults to `10000`.
    pub cache_capacity: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10000,
        }
    }
}

/// Runtime switches for optional layout behaviour.
///
/// Built once at process start (usually with [`FeatureFlags::from_env`]) and
/// handed to the engine through `LayoutOptions`; the engine never reads the
/// environment itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Page numbers honour per-section restarts and formats.
    pub numbering_section_aware: bool,
    /// Resolve page-number fields inside body paragraphs.
    pub body_page_tokens: bool,
    /// Resolve page-number fields inside headers and footers.
    pub header_footer_page_tokens: bool,
    /// Share header/footer layouts between pages whose numbers have the same
    /// digit count.
    pub hf_digit_bucketing: bool,
    pub debug_page_tokens: bool,
    pub debug_hf_cache: bool,
    pub debug_layout_version: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            numbering_section_aware: true,
            body_page_tokens: true,
            header_footer_page_tokens: true,
            hf_digit_bucketing: true,
            debug_page_tokens: false,
            debug_hf_cache: false,
            debug_layout_version: false,
        }
    }
}

impl FeatureFlags {
    pub const NUMBERING_SECTION_AWARE: &'static str = "SD_NUMBERING_SECTION_AWARE";
    pub const BODY_PAGE_TOKENS: &'static str = "SD_BODY_PAGE_TOKENS";
    pub const HEADER_FOOTER_PAGE_TOKENS: &'static str = "SD_HEADER_FOOTER_PAGE_TOKENS";
    pub const HF_DIGIT_BUCKETING: &'static str = "SD_HF_DIGIT_BUCKETING";
    pub const DEBUG_PAGE_TOKENS: &'static str = "SD_DEBUG_PAGE_TOKENS";
    pub const DEBUG_HF_CACHE: &'static str = "SD_DEBUG_HF_CACHE";
    pub const DEBUG_LAYOUT_VERSION: &'static str = "SD_DEBUG_LAYOUT_VERSION";

    /// Reads every flag from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads every flag through `lookup`, falling back to the default for
    /// missing or unrecognised values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, default: bool| parse_flag(lookup(key).as_deref(), default);
        Self {
            numbering_section_aware: read(
                Self::NUMBERING_SECTION_AWARE,
                defaults.numbering_section_aware,
            ),
            body_page_tokens: read(Self::BODY_PAGE_TOKENS, defaults.body_page_tokens),
            header_footer_page_tokens: read(
                Self::HEADER_FOOTER_PAGE_TOKENS,
                defaults.header_footer_page_tokens,
            ),
            hf_digit_bucketing: read(Self::HF_DIGIT_BUCKETING, defaults.hf_digit_bucketing),
            debug_page_tokens: read(Self::DEBUG_PAGE_TOKENS, defaults.debug_page_tokens),
            debug_hf_cache: read(Self::DEBUG_HF_CACHE, defaults.debug_hf_cache),
            debug_layout_version: read(Self::DEBUG_LAYOUT_VERSION, defaults.debug_layout_version),
        }
    }
}

fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
