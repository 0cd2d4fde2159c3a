pub const DEFAULT_TAG_TYPE: &str = "regular";

// Kannada-script variants, e.g. `name:kn`, `name:kn-Latn`.
const LOCAL_SCRIPT_MARKER: &str = ":kn";

/// Split a raw tag key into `(namespace, key)` on its first colon. When the key
/// contains `:kn`, only a colon before the first `:kn` counts, so `name:kn` stays
/// `("regular", "name:kn")` while `addr:street:kn` splits as `("addr", "street:kn")`.
pub fn decompose_key(raw: &str) -> (&str, &str) {
    let namespaced_part = match raw.find(LOCAL_SCRIPT_MARKER) {
        Some(marker) => &raw[..marker],
        None => raw,
    };
    match namespaced_part.find(':') {
        Some(colon) => (&raw[..colon], &raw[colon + 1..]),
        None => (DEFAULT_TAG_TYPE, raw),
    }
}
