//! Display-name generation for ferial events
//!
//! Ferial weekdays have no entry in the i18n files; their display names
//! are generated from the event key. Only the locales with templates
//! produce a name; for everything else the assembler falls back to an
//! i18n lookup and, failing that, omits the name.

use regex::Regex;
use std::sync::LazyLock;

static WEEKDAY_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(Advent|Christmas|Lent|Easter|Ord)Weekday(\d+)(Monday|Tuesday|Wednesday|Thursday|Friday|Saturday)$",
    )
    .unwrap()
});
static DEC_WEEKDAY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^DecWeekday(\d+)$").unwrap());

/// Generates a display name for a locale and event key
pub trait NameGenerator: Send + Sync {
    fn generate(&self, locale: &str, event_key: &str) -> Option<String>;
}

/// Template-based generator with English and Latin templates
pub struct TemplateNames;

impl NameGenerator for TemplateNames {
    fn generate(&self, locale: &str, event_key: &str) -> Option<String> {
        let base = locale.split('_').next().unwrap_or(locale);
        match base {
            "en" => english_name(event_key),
            "la" => latin_name(event_key),
            _ => None,
        }
    }
}

fn english_name(event_key: &str) -> Option<String> {
    if let Some(caps) = WEEKDAY_KEY.captures(event_key) {
        let season = match &caps[1] {
            "Advent" => "Advent",
            "Christmas" => "Christmas Time",
            "Lent" => "Lent",
            "Easter" => "Easter Time",
            _ => "Ordinary Time",
        };
        let week: u32 = caps[2].parse().ok()?;
        return Some(format!(
            "{} of the {} Week of {}",
            &caps[3],
            ordinal_en(week),
            season
        ));
    }
    if let Some(caps) = DEC_WEEKDAY_KEY.captures(event_key) {
        return Some(format!("Weekday of Advent, December {}", &caps[1]));
    }
    None
}

fn latin_name(event_key: &str) -> Option<String> {
    if let Some(caps) = WEEKDAY_KEY.captures(event_key) {
        let season = match &caps[1] {
            "Advent" => "Adventus",
            "Christmas" => "temporis Nativitatis",
            "Lent" => "Quadragesimae",
            "Easter" => "temporis Paschalis",
            _ => "temporis per annum",
        };
        let week: u32 = caps[2].parse().ok()?;
        let feria = match &caps[3] {
            "Monday" => "Feria II",
            "Tuesday" => "Feria III",
            "Wednesday" => "Feria IV",
            "Thursday" => "Feria V",
            "Friday" => "Feria VI",
            _ => "Sabbato",
        };
        return Some(format!(
            "{} hebdomadae {} {}",
            feria,
            roman(week),
            season
        ));
    }
    if let Some(caps) = DEC_WEEKDAY_KEY.captures(event_key) {
        return Some(format!("Feria Adventus, die {} decembris", &caps[1]));
    }
    None
}

fn ordinal_en(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn roman(mut n: u32) -> String {
    let table = [
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in table {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_weekday_names() {
        let names = TemplateNames;
        assert_eq!(
            names.generate("en", "OrdWeekday1Monday").as_deref(),
            Some("Monday of the 1st Week of Ordinary Time")
        );
        assert_eq!(
            names.generate("en_US", "LentWeekday3Friday").as_deref(),
            Some("Friday of the 3rd Week of Lent")
        );
        assert_eq!(
            names.generate("en", "DecWeekday17").as_deref(),
            Some("Weekday of Advent, December 17")
        );
    }

    #[test]
    fn test_latin_weekday_names() {
        let names = TemplateNames;
        assert_eq!(
            names.generate("la", "OrdWeekday4Tuesday").as_deref(),
            Some("Feria III hebdomadae IV temporis per annum")
        );
        assert_eq!(
            names.generate("la", "AdventWeekday2Saturday").as_deref(),
            Some("Sabbato hebdomadae II Adventus")
        );
    }

    #[test]
    fn test_unknown_locale_or_key_yields_none() {
        let names = TemplateNames;
        assert!(names.generate("it", "OrdWeekday1Monday").is_none());
        assert!(names.generate("en", "Easter").is_none());
        assert!(names.generate("en", "OrdWeekday1Sunday").is_none());
    }

    #[test]
    fn test_ordinal_suffixes() {
        assert_eq!(ordinal_en(1), "1st");
        assert_eq!(ordinal_en(2), "2nd");
        assert_eq!(ordinal_en(3), "3rd");
        assert_eq!(ordinal_en(4), "4th");
        assert_eq!(ordinal_en(11), "11th");
        assert_eq!(ordinal_en(21), "21st");
        assert_eq!(ordinal_en(34), "34th");
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(roman(1), "I");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(9), "IX");
        assert_eq!(roman(34), "XXXIV");
    }
}
