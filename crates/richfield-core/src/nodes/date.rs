use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use richfield_html::Element;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    Short,
    #[default]
    Medium,
    Long,
    Full,
    Relative,
    Iso,
}

impl DateFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DateFormat::Short => "short",
            DateFormat::Medium => "medium",
            DateFormat::Long => "long",
            DateFormat::Full => "full",
            DateFormat::Relative => "relative",
            DateFormat::Iso => "iso",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "short" => Some(DateFormat::Short),
            "medium" => Some(DateFormat::Medium),
            "long" => Some(DateFormat::Long),
            "full" => Some(DateFormat::Full),
            "relative" => Some(DateFormat::Relative),
            "iso" => Some(DateFormat::Iso),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateData {
    /// ISO-8601 date. Kept verbatim even when it does not parse.
    pub date: String,
    #[serde(default)]
    pub format: DateFormat,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl DateData {
    pub fn new(date: impl Into<String>, format: DateFormat, locale: Option<&str>) -> Self {
        Self {
            date: date.into(),
            format,
            locale: locale
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(default_locale),
        }
    }

    pub fn today(format: DateFormat, locale: Option<&str>) -> Self {
        Self::new(
            Local::now().date_naive().format("%Y-%m-%d").to_string(),
            format,
            locale,
        )
    }

    pub fn display_text(&self) -> String {
        format_date(&self.date, self.format, &self.locale)
    }

    /// Exported text never depends on the clock: relative dates are written in long form.
    fn export_text(&self) -> String {
        let format = match self.format {
            DateFormat::Relative => DateFormat::Long,
            other => other,
        };
        format_date(&self.date, format, &self.locale)
    }

    pub(crate) fn from_element(el: &Element) -> Self {
        let date = el
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| el.text_content().trim().to_string());
        Self::new(
            date,
            el.attr("data-format")
                .and_then(DateFormat::parse)
                .unwrap_or_default(),
            el.attr("data-locale"),
        )
    }

    pub(crate) fn export_element(&self) -> Element {
        Element::new("time")
            .with_attr("datetime", self.date.clone())
            .with_attr("data-format", self.format.as_str())
            .with_attr("data-locale", self.locale.clone())
            .with_text(self.export_text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locale {
    EnUs,
    EnGb,
    De,
}

impl Locale {
    fn resolve(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
        if tag == "de" || tag.starts_with("de-") {
            Locale::De
        } else if tag == "en-gb" {
            Locale::EnGb
        } else {
            Locale::EnUs
        }
    }
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_DE: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];
const WEEKDAYS_EN: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];
const WEEKDAYS_DE: [&str; 7] = [
    "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag",
];

/// Parses `YYYY-MM-DD`, RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Formats against the local clock. Unparseable input is returned unchanged.
pub fn format_date(date: &str, format: DateFormat, locale: &str) -> String {
    format_date_relative_to(date, format, locale, Local::now().date_naive())
}

pub fn format_date_relative_to(
    date: &str,
    format: DateFormat,
    locale: &str,
    today: NaiveDate,
) -> String {
    let Some(parsed) = parse_date(date) else {
        return date.to_string();
    };
    let locale = Locale::resolve(locale);
    match format {
        DateFormat::Iso => parsed.format("%Y-%m-%d").to_string(),
        DateFormat::Relative => relative(parsed, today, locale),
        DateFormat::Short => short(parsed, locale),
        DateFormat::Medium => medium(parsed, locale),
        DateFormat::Long => long(parsed, locale),
        DateFormat::Full => full(parsed, locale),
    }
}

fn month_name(date: NaiveDate, locale: Locale) -> &'static str {
    let ix = date.month0() as usize;
    match locale {
        Locale::De => MONTHS_DE[ix],
        Locale::EnUs | Locale::EnGb => MONTHS_EN[ix],
    }
}

fn weekday_name(date: NaiveDate, locale: Locale) -> &'static str {
    let ix = date.weekday().num_days_from_monday() as usize;
    match locale {
        Locale::De => WEEKDAYS_DE[ix],
        Locale::EnUs | Locale::EnGb => WEEKDAYS_EN[ix],
    }
}

fn short(date: NaiveDate, locale: Locale) -> String {
    match locale {
        Locale::EnUs => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        Locale::EnGb => date.format("%d/%m/%Y").to_string(),
        Locale::De => date.format("%d.%m.%y").to_string(),
    }
}

fn medium(date: NaiveDate, locale: Locale) -> String {
    match locale {
        Locale::EnUs => format!("{} {}, {}", &month_name(date, locale)[..3], date.day(), date.year()),
        Locale::EnGb => format!("{} {} {}", date.day(), &month_name(date, locale)[..3], date.year()),
        Locale::De => date.format("%d.%m.%Y").to_string(),
    }
}

fn long(date: NaiveDate, locale: Locale) -> String {
    let month = month_name(date, locale);
    match locale {
        Locale::EnUs => format!("{month} {}, {}", date.day(), date.year()),
        Locale::EnGb => format!("{} {month} {}", date.day(), date.year()),
        Locale::De => format!("{}. {month} {}", date.day(), date.year()),
    }
}

fn full(date: NaiveDate, locale: Locale) -> String {
    let weekday = weekday_name(date, locale);
    match locale {
        Locale::EnUs | Locale::De => format!("{weekday}, {}", long(date, locale)),
        Locale::EnGb => format!("{weekday} {}", long(date, locale)),
    }
}

fn relative(date: NaiveDate, today: NaiveDate, locale: Locale) -> String {
    let days = date.signed_duration_since(today).num_days();
    match (locale, days) {
        (Locale::De, 0) => "heute".to_string(),
        (Locale::De, 1) => "morgen".to_string(),
        (Locale::De, -1) => "gestern".to_string(),
        (Locale::De, d) if d > 0 => format!("in {d} Tagen"),
        (Locale::De, d) => format!("vor {} Tagen", -d),
        (_, 0) => "today".to_string(),
        (_, 1) => "tomorrow".to_string(),
        (_, -1) => "yesterday".to_string(),
        (_, d) if d > 0 => format!("in {d} days"),
        (_, d) => format!("{} days ago", -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn invalid_dates_pass_through() {
        assert_eq!(format_date("not-a-date", DateFormat::Medium, "en-US"), "not-a-date");
        assert_eq!(format_date("2024-13-40", DateFormat::Long, "de"), "2024-13-40");
    }

    #[test]
    fn formats_per_locale() {
        let today = day(2024, 1, 1);
        let fmt = |f, l| format_date_relative_to("2024-01-05", f, l, today);
        assert_eq!(fmt(DateFormat::Short, "en-US"), "1/5/2024");
        assert_eq!(fmt(DateFormat::Medium, "en-US"), "Jan 5, 2024");
        assert_eq!(fmt(DateFormat::Full, "en-US"), "Friday, January 5, 2024");
        assert_eq!(fmt(DateFormat::Short, "en-GB"), "05/01/2024");
        assert_eq!(fmt(DateFormat::Long, "en-GB"), "5 January 2024");
        assert_eq!(fmt(DateFormat::Medium, "de-DE"), "05.01.2024");
        assert_eq!(fmt(DateFormat::Full, "de"), "Freitag, 5. Januar 2024");
        assert_eq!(fmt(DateFormat::Long, "fr-FR"), "January 5, 2024");
        assert_eq!(fmt(DateFormat::Iso, "en-US"), "2024-01-05");
    }

    #[test]
    fn relative_dates() {
        let today = day(2024, 1, 5);
        let rel = |date, locale| format_date_relative_to(date, DateFormat::Relative, locale, today);
        assert_eq!(rel("2024-01-05", "en-US"), "today");
        assert_eq!(rel("2024-01-04", "en-US"), "yesterday");
        assert_eq!(rel("2024-01-08", "en-US"), "in 3 days");
        assert_eq!(rel("2024-01-01T10:00:00Z", "en-US"), "4 days ago");
        assert_eq!(rel("2024-01-06", "de"), "morgen");
        assert_eq!(rel("2024-01-02", "de"), "vor 3 Tagen");
    }
}
