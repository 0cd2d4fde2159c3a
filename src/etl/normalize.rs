use once_cell::sync::Lazy;
use regex::Regex;

static ROAD_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\broad\b").unwrap());
static MAIN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmain\b").unwrap());
static CROSS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcross\b").unwrap());

// The leading space keeps the "rd" of ordinals like "3rd" out of it.
static RD_ABBREVIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i) rd\b\.?").unwrap());

static MAIN_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(th|st|nd|rd) mn\b\.?").unwrap());
static CROSS_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(th|st|nd|rd) crs\b\.?").unwrap());
static CROS_MISSPELLING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcros\b\.?").unwrap());

// Passes run in order, each one seeing the output of the previous one.
pub fn normalize_value(raw: &str) -> String {
    let value = canonical_words(raw);
    let value = expand_rd(value);
    let value = expand_main(value);
    let value = expand_cross(value);
    truncate_after_road(value)
}

fn canonical_words(value: &str) -> String {
    let value = ROAD_WORD.replace_all(value, "Road");
    let value = MAIN_WORD.replace_all(&value, "Main");
    CROSS_WORD.replace_all(&value, "Cross").into_owned()
}

fn expand_rd(value: String) -> String {
    RD_ABBREVIATION.replace_all(&value, " Road").into_owned()
}

fn expand_main(mut value: String) -> String {
    if !value.contains("Main") {
        value = MAIN_ABBREVIATION.replace_all(&value, "${1} Main").into_owned();
    }
    if value.contains("Main") && !value.contains("Main Road") {
        value = value.replace("Main", "Main Road");
    }
    value
}

fn expand_cross(mut value: String) -> String {
    if !value.contains("Cross") {
        value = if CROSS_ABBREVIATION.is_match(&value) {
            CROSS_ABBREVIATION.replace_all(&value, "${1} Cross").into_owned()
        } else {
            CROS_MISSPELLING.replace_all(&value, "Cross").into_owned()
        };
    }
    if value.contains("Cross") && !value.contains("Cross Road") {
        value = value.replace("Cross", "Cross Road");
    }
    value
}

/// Anything after the first "Road" is an area or locality name.
fn truncate_after_road(mut value: String) -> String {
    if let Some(start) = value.find("Road") {
        value.truncate(start + "Road".len());
    }
    value
}
