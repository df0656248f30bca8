//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn landing_title() -> String {
        "Home".into()
    }

    pub fn language() -> String {
        "en".into()
    }

    pub fn stylesheet() -> String {
        "style.css".into()
    }
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "data".into()
    }

    pub fn templates() -> PathBuf {
        "template".into()
    }

    pub fn public() -> PathBuf {
        "public".into()
    }

    pub fn blacklist() -> PathBuf {
        "blacklist.json".into()
    }

    pub fn category_index() -> String {
        "default.md".into()
    }

    pub fn landing() -> String {
        "landing.md".into()
    }

    pub fn not_found() -> String {
        "404.html".into()
    }

    pub fn header() -> String {
        "header.md".into()
    }

    pub fn footer() -> String {
        "footer.md".into()
    }
}

// ============================================================================
// [render] Section Defaults
// ============================================================================

pub mod render {
    pub fn max_template_depth() -> usize {
        16
    }

    pub fn max_expansions() -> usize {
        1024
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }

    pub fn workers() -> usize {
        0
    }

    pub fn assets_prefix() -> String {
        "/assets".into()
    }

    pub fn media_prefix() -> String {
        "/media".into()
    }

    pub fn media_extensions() -> Vec<String> {
        vec!["mp4".into(), "webm".into(), "ogg".into()]
    }
}
