//! Weekday sets and the day-name lookup table.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::text::{normalize, tokens};

/// Day-name tokens (already normalized: lowercase, no accents).
const DAY_NAMES: &[(&str, Weekday)] = &[
    ("domingo", Weekday::Sun),
    ("dom", Weekday::Sun),
    ("segunda", Weekday::Mon),
    ("seg", Weekday::Mon),
    ("terca", Weekday::Tue),
    ("ter", Weekday::Tue),
    ("quarta", Weekday::Wed),
    ("qua", Weekday::Wed),
    ("quinta", Weekday::Thu),
    ("qui", Weekday::Thu),
    ("sexta", Weekday::Fri),
    ("sex", Weekday::Fri),
    ("sabado", Weekday::Sat),
    ("sab", Weekday::Sat),
    ("sunday", Weekday::Sun),
    ("sun", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sat", Weekday::Sat),
];

fn lookup(token: &str) -> Option<Weekday> {
    let find = |t: &str| DAY_NAMES.iter().find(|(name, _)| *name == t).map(|(_, d)| *d);
    // "segundas", "tercas": plural forms.
    find(token).or_else(|| token.strip_suffix('s').and_then(find))
}

/// Set of weekdays, numbered Sunday = 0 .. Saturday = 6 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Monday through Friday.
    pub const fn business_days() -> Self {
        Self(0b0011_1110)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in Sunday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7u32)
            .filter(|n| self.0 & (1 << n) != 0)
            .map(weekday_from_sunday)
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<WeekdaySet> for Vec<u32> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().map(|d| d.num_days_from_sunday()).collect()
    }
}

impl TryFrom<Vec<u32>> for WeekdaySet {
    type Error = String;

    fn try_from(days: Vec<u32>) -> Result<Self, Self::Error> {
        let mut set = WeekdaySet::empty();
        for n in days {
            if n > 6 {
                return Err(format!("weekday number out of range: {n}"));
            }
            set.insert(weekday_from_sunday(n));
        }
        Ok(set)
    }
}

fn weekday_from_sunday(n: u32) -> Weekday {
    match n % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Words joining two day names into an inclusive range ("seg a sex").
const RANGE_WORDS: &[&str] = &["a", "ate", "to", "through"];

#[derive(Debug, Clone, Copy)]
enum Token {
    Day(Weekday),
    Through,
    Other,
}

fn classify(token: &str) -> Token {
    if RANGE_WORDS.contains(&token) {
        return Token::Through;
    }
    lookup(token).map_or(Token::Other, Token::Day)
}

/// Days from `first` to `last` inclusive, wrapping past Saturday.
fn day_range(first: Weekday, last: Weekday) -> WeekdaySet {
    let mut set = WeekdaySet::empty();
    let mut day = first;
    set.insert(day);
    while day != last {
        day = day.succ();
        set.insert(day);
    }
    set
}

/// Parse free-form delivery-day text ("Segunda e Quinta", "ter/sex",
/// "Seg a Sex").
///
/// Text with no recognizable day name yields Monday–Friday.
pub fn parse_weekdays(text: &str) -> WeekdaySet {
    let normalized = normalize(text);
    // "segunda-feira a sexta-feira": the "feira" suffix never separates a range.
    let items: Vec<Token> = tokens(&normalized)
        .filter(|t| !matches!(*t, "feira" | "feiras"))
        .map(classify)
        .collect();

    let mut set = WeekdaySet::empty();
    for (i, item) in items.iter().enumerate() {
        let Token::Day(day) = *item else { continue };
        set.insert(day);
        if let [Token::Through, Token::Day(last), ..] = &items[i + 1..] {
            set = set.union(day_range(day, *last));
        }
    }

    if set.is_empty() {
        WeekdaySet::business_days()
    } else {
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_portuguese_day_names_with_accents() {
        let set = parse_weekdays("Terça-feira e SÁBADO");
        assert_eq!(set.len(), 2);
        assert!(set.contains(Weekday::Tue));
        assert!(set.contains(Weekday::Sat));
    }

    #[test]
    fn parses_plural_and_abbreviated_names() {
        let set = parse_weekdays("segundas, qua, sex");
        assert_eq!(Vec::<u32>::from(set), vec![1, 3, 5]);
    }

    #[test]
    fn expands_day_ranges() {
        assert_eq!(parse_weekdays("Seg a Sex"), WeekdaySet::business_days());
        assert_eq!(
            parse_weekdays("Segunda-feira a sexta-feira"),
            WeekdaySet::business_days()
        );
        assert_eq!(Vec::<u32>::from(parse_weekdays("ter até qui")), vec![2, 3, 4]);
        assert_eq!(Vec::<u32>::from(parse_weekdays("sexta a segunda")), vec![0, 1, 5, 6]);
        assert_eq!(Vec::<u32>::from(parse_weekdays("seg e qua a sex")), vec![1, 3, 4, 5]);
    }

    #[test]
    fn range_word_without_two_days_is_ignored() {
        assert_eq!(Vec::<u32>::from(parse_weekdays("a partir de quarta")), vec![3]);
    }

    #[test]
    fn unmatched_text_defaults_to_business_days() {
        assert_eq!(parse_weekdays(""), WeekdaySet::business_days());
        assert_eq!(parse_weekdays("a combinar"), WeekdaySet::business_days());
    }

    #[test]
    fn feira_alone_is_not_a_day() {
        assert_eq!(parse_weekdays("feira"), WeekdaySet::business_days());
    }

    #[test]
    fn serializes_as_sunday_zero_numbers() {
        let set: WeekdaySet = [Weekday::Sun, Weekday::Sat].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[0,6]");
        let back: WeekdaySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_str::<WeekdaySet>("[7]").is_err());
    }
}
