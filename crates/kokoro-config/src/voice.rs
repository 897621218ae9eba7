use std::sync::OnceLock;

use regex::Regex;

/// Check a voice identifier against `^[a-z]{2}_[a-z0-9_]+$`
///
/// The first letter doubles as the pipeline language code, so anything that
/// passes here can be routed to a pipeline.
pub fn is_valid_voice_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();

    RE.get_or_init(|| Regex::new(r"^[a-z]{2}_[a-z0-9_]+$").expect("must be valid regex"))
        .is_match(name)
}
