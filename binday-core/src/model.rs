//! Domain data structures for councils, postcodes, addresses, and collection schedules.

use std::fmt;
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a council deployment known to binday.
pub struct CouncilId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a council and its human-friendly name.
pub struct CouncilMeta {
    /// Unique identifier.
    pub id: CouncilId,
    /// Display name shown in the header.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A trimmed, non-empty postcode ready to be sent to a provider.
pub struct Postcode(String);

impl Postcode {
    /// Trim the raw input; blank input yields `None`, the "no query" state.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// The trimmed postcode text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Unique Property Reference Number.
pub struct Uprn(pub u64);

impl fmt::Display for Uprn {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Address returned from a postcode lookup.
pub struct Address {
    /// Property reference used when requesting schedules.
    pub uprn: Uprn,
    /// Full address text.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Bin colour exactly as the provider sent it, e.g. `#333` or `green`.
pub struct BinColor(pub String);

impl BinColor {
    /// Parse `#rgb` or `#rrggbb` into its components.
    #[must_use]
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|digit| digit.to_digit(16));
                let red = digits.next()??;
                let green = digits.next()??;
                let blue = digits.next()??;
                // 0xf -> 0xff
                let widen = |nibble: u32| u8::try_from(nibble * 17).ok();
                Some((widen(red)?, widen(green)?, widen(blue)?))
            }
            6 => {
                let channel = |range: Range<usize>| {
                    hex.get(range)
                        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                };
                Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One bin on the collection schedule.
pub struct BinCollection {
    /// Category label, e.g. "General waste".
    pub category: String,
    /// Card colour.
    pub color: BinColor,
    /// Next collection, as displayed by the provider.
    pub next: String,
    /// The collection after `next`.
    pub following: String,
    /// Optional free-text note.
    pub note: Option<String>,
}

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%A %d %B %Y",
    "%A, %d %B %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

impl BinCollection {
    /// Calendar date of the next collection when the label is a recognizable date.
    ///
    /// Labels like "Monday" or "Tomorrow" carry no year and return `None`.
    #[must_use]
    pub fn next_date(&self) -> Option<NaiveDate> {
        let label = self.next.trim();
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(label, format).ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Upcoming collections for a single property.
pub struct CollectionSchedule {
    /// Bins in provider order.
    pub bins: Vec<BinCollection>,
}

impl CollectionSchedule {
    /// True when the provider reported no upcoming collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(next: &str) -> BinCollection {
        BinCollection {
            category: "General".to_owned(),
            color: BinColor("#333".to_owned()),
            next: next.to_owned(),
            following: "next Monday".to_owned(),
            note: None,
        }
    }

    #[test]
    fn blank_postcodes_are_idle() {
        assert_eq!(Postcode::parse(""), None);
        assert_eq!(Postcode::parse("   \t"), None);
    }

    #[test]
    fn postcode_is_trimmed() {
        let postcode = Postcode::parse("  AB1 2CD ").expect("non-empty postcode");
        assert_eq!(postcode.as_str(), "AB1 2CD");
        assert_eq!(postcode.to_string(), "AB1 2CD");
    }

    #[test]
    fn short_hex_colours_are_widened() {
        assert_eq!(BinColor("#333".to_owned()).rgb(), Some((0x33, 0x33, 0x33)));
        assert_eq!(BinColor("#f0A".to_owned()).rgb(), Some((0xff, 0x00, 0xaa)));
    }

    #[test]
    fn long_hex_colours_are_parsed() {
        assert_eq!(
            BinColor(" #1f7a1f ".to_owned()).rgb(),
            Some((0x1f, 0x7a, 0x1f))
        );
    }

    #[test]
    fn named_or_broken_colours_have_no_rgb() {
        assert_eq!(BinColor("green".to_owned()).rgb(), None);
        assert_eq!(BinColor("#12345".to_owned()).rgb(), None);
        assert_eq!(BinColor("#zzz".to_owned()).rgb(), None);
        assert_eq!(BinColor("#ééé".to_owned()).rgb(), None);
    }

    #[test]
    fn next_date_understands_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 21);
        assert_eq!(bin("2024-10-21").next_date(), expected);
        assert_eq!(bin("21/10/2024").next_date(), expected);
        assert_eq!(bin("Monday 21 October 2024").next_date(), expected);
        assert_eq!(bin("21 October 2024").next_date(), expected);
    }

    #[test]
    fn weekday_labels_have_no_date() {
        assert_eq!(bin("Monday").next_date(), None);
        assert_eq!(bin("").next_date(), None);
    }

    #[test]
    fn empty_schedule() {
        assert!(CollectionSchedule::default().is_empty());
        let schedule = CollectionSchedule {
            bins: vec![bin("Monday")],
        };
        assert!(!schedule.is_empty());
    }
}
