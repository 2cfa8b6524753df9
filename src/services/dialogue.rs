//! Booking form tracker: pulls field values out of an utterance and advances
//! the form one turn at a time.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::booking::{DATE_FORMAT, MAX_PARTY_SIZE, TIME_FORMAT};
use crate::models::customer::is_valid_email;
use crate::models::{BookingDraft, BookingField, DialogueState, ExtractedFields, FieldValue};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\s@,;:<>()\[\]]+@[^\s@,;:<>()\[\]]+\.[A-Za-z]{2,}").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?:\s*(am|pm))?\b").unwrap());
static HOUR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*(am|pm)\b").unwrap());
static PARTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3})\s*(?:people|persons|person|guests|guest|pax|adults|ppl)\b|\b(?:party|table|group)\s+(?:of|for)\s+(\d{1,3})\b",
    )
    .unwrap()
});
static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,3})\b").unwrap());
static EXPLICIT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my name is|name is|name:|this is|call me|i'm|i am)\s+(\p{L}[\p{L}'\-]*(?:\s+\p{L}[\p{L}'\-]*){0,3})")
        .unwrap()
});
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}[\p{L}'\-]*(?:\s+\p{L}[\p{L}'\-]*){0,3}$").unwrap());
static BOOKING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:book|booking|reserve|reservation|appointment|schedule)\b").unwrap()
});
static CANCEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:cancel|stop|never\s*mind|start\s+over|forget\s+it)\b").unwrap()
});

/// Words that never form part of a personal name in this context.
const NON_NAME_WORDS: &[&str] = &[
    "a", "an", "and", "the", "to", "for", "at", "on", "in", "of", "with", "is", "it", "my", "me",
    "i", "we", "us", "our", "you", "your", "am", "pm", "hi", "hello", "hey", "thanks", "thank",
    "please", "yes", "no", "ok", "okay", "sure", "book", "booking", "reserve", "reservation",
    "appointment", "schedule", "table", "want", "like", "would", "need", "looking", "trying",
    "interested", "fine", "good", "great", "people", "guests", "persons", "person", "party", "email", "name", "date",
    "time", "today", "tomorrow", "tonight", "next", "this", "cancel", "stop", "help", "what",
    "when", "where", "how", "can", "could", "do", "does", "monday", "tuesday", "wednesday",
    "thursday", "friday", "saturday", "sunday", "january", "february", "march", "april", "may",
    "june", "july", "august", "september", "october", "november", "december",
];

/// Field values found in one utterance, plus fields the user attempted but
/// got wrong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUtterance {
    pub values: Vec<FieldValue>,
    pub malformed: Vec<BookingField>,
}

impl ParsedUtterance {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.malformed.is_empty()
    }

    fn push(&mut self, value: FieldValue) {
        self.values.push(value);
    }

    fn mark_malformed(&mut self, field: BookingField) {
        if !self.malformed.contains(&field) {
            self.malformed.push(field);
        }
    }

    /// Validates LLM-extracted values with the same rules as typed input.
    pub fn from_extracted(fields: &ExtractedFields) -> Self {
        let mut out = ParsedUtterance::default();

        if let Some(name) = fields.customer_name.as_deref().map(str::trim) {
            if NAME_RE.is_match(name) {
                out.push(FieldValue::Name(name.to_string()));
            } else if !name.is_empty() {
                out.mark_malformed(BookingField::Name);
            }
        }
        if let Some(date) = fields.date.as_deref().map(str::trim) {
            match NaiveDate::parse_from_str(date, DATE_FORMAT) {
                Ok(d) => out.push(FieldValue::Date(d)),
                Err(_) => out.mark_malformed(BookingField::Date),
            }
        }
        if let Some(time) = fields.time.as_deref().map(str::trim) {
            match NaiveTime::parse_from_str(time, TIME_FORMAT) {
                Ok(t) => out.push(FieldValue::Time(t)),
                Err(_) => out.mark_malformed(BookingField::Time),
            }
        }
        if let Some(size) = fields.party_size {
            match valid_party_size(size) {
                Some(n) => out.push(FieldValue::PartySize(n)),
                None => out.mark_malformed(BookingField::PartySize),
            }
        }
        if let Some(email) = fields.email.as_deref().map(str::trim) {
            let email = email.to_lowercase();
            if is_valid_email(&email) {
                out.push(FieldValue::Email(email));
            } else {
                out.mark_malformed(BookingField::Email);
            }
        }
        out
    }
}

pub fn is_booking_intent(text: &str) -> bool {
    BOOKING_RE.is_match(text)
}

pub fn is_cancel_request(text: &str) -> bool {
    CANCEL_RE.is_match(text)
}

/// Extracts every recognizable field from `text`. `awaiting` is the field
/// the assistant last asked for; `name_known` suppresses guessing a name
/// from leftover words once one has been collected.
pub fn parse_utterance(
    text: &str,
    awaiting: Option<BookingField>,
    name_known: bool,
) -> ParsedUtterance {
    let mut out = ParsedUtterance::default();
    let mut rest = text.to_string();

    // Order matters: each pass blanks out what it consumed so later,
    // looser patterns do not re-read it.
    rest = take_emails(&rest, &mut out);
    rest = take_dates(&rest, &mut out);
    rest = take_times(&rest, &mut out);
    rest = take_party_size(&rest, &mut out, awaiting);
    take_name(&rest, &mut out, awaiting, name_known);

    out
}

fn take_emails(text: &str, out: &mut ParsedUtterance) -> String {
    for m in EMAIL_RE.find_iter(text) {
        let email = m.as_str().trim_end_matches('.').to_lowercase();
        if is_valid_email(&email) {
            out.push(FieldValue::Email(email));
        } else {
            out.mark_malformed(BookingField::Email);
        }
    }
    let rest = EMAIL_RE.replace_all(text, ",").into_owned();
    if rest.contains('@') {
        out.mark_malformed(BookingField::Email);
    }
    rest
}

fn take_dates(text: &str, out: &mut ParsedUtterance) -> String {
    for caps in DATE_RE.captures_iter(text) {
        let date = (|| {
            let y = caps[1].parse().ok()?;
            let m = caps[2].parse().ok()?;
            let d = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, d)
        })();
        match date {
            Some(d) => out.push(FieldValue::Date(d)),
            None => out.mark_malformed(BookingField::Date),
        }
    }
    DATE_RE.replace_all(text, ",").into_owned()
}

fn take_times(text: &str, out: &mut ParsedUtterance) -> String {
    for caps in CLOCK_RE.captures_iter(text) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let minute: u32 = caps[2].parse().unwrap_or(99);
        let meridiem = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
        match to_time(hour, minute, meridiem.as_deref()) {
            Some(t) => out.push(FieldValue::Time(t)),
            None => out.mark_malformed(BookingField::Time),
        }
    }
    let rest = CLOCK_RE.replace_all(text, ",").into_owned();

    for caps in HOUR_RE.captures_iter(&rest) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let meridiem = caps[2].to_ascii_lowercase();
        match to_time(hour, 0, Some(&meridiem)) {
            Some(t) => out.push(FieldValue::Time(t)),
            None => out.mark_malformed(BookingField::Time),
        }
    }
    HOUR_RE.replace_all(&rest, ",").into_owned()
}

fn to_time(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match m {
                "pm" => hour % 12 + 12,
                _ => hour % 12,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn valid_party_size(n: u32) -> Option<u32> {
    (1..=MAX_PARTY_SIZE).contains(&n).then_some(n)
}

fn take_party_size(
    text: &str,
    out: &mut ParsedUtterance,
    awaiting: Option<BookingField>,
) -> String {
    let mut found = false;
    for caps in PARTY_RE.captures_iter(text) {
        found = true;
        let size = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .and_then(valid_party_size);
        match size {
            Some(n) => out.push(FieldValue::PartySize(n)),
            None => out.mark_malformed(BookingField::PartySize),
        }
    }
    let rest = PARTY_RE.replace_all(text, ",").into_owned();

    // A lone number only counts as a party size when that is what was asked.
    if !found && awaiting == Some(BookingField::PartySize) {
        let numbers: Vec<_> = BARE_NUMBER_RE.captures_iter(&rest).collect();
        if numbers.len() == 1 {
            match numbers[0][1].parse::<u32>().ok().and_then(valid_party_size) {
                Some(n) => out.push(FieldValue::PartySize(n)),
                None => out.mark_malformed(BookingField::PartySize),
            }
            return BARE_NUMBER_RE.replace_all(&rest, ",").into_owned();
        }
    }
    rest
}

fn take_name(
    text: &str,
    out: &mut ParsedUtterance,
    awaiting: Option<BookingField>,
    name_known: bool,
) {
    // Once a name is on the form, "I'm free at 7pm" is not an introduction.
    if name_known {
        return;
    }

    if let Some(caps) = EXPLICIT_NAME_RE.captures(text) {
        if let Some(name) = leading_name_words(&caps[1]) {
            out.push(FieldValue::Name(name));
            return;
        }
    }

    let asked_for_name = awaiting == Some(BookingField::Name);
    let volunteered = !out.values.is_empty();
    if !(asked_for_name || volunteered) {
        return;
    }

    let candidate = text
        .split([',', ';', '\n'])
        .map(|s| s.trim().trim_matches(|c: char| matches!(c, '.' | '!' | '?')).trim())
        .filter(|s| !s.is_empty())
        .find(|s| looks_like_name(s));

    match candidate {
        Some(name) => out.push(FieldValue::Name(name.to_string())),
        None if asked_for_name && out.values.is_empty() && !text.trim().is_empty() => {
            out.mark_malformed(BookingField::Name)
        }
        None => {}
    }
}

/// Keeps the words of a captured name up to the first word that cannot be
/// part of one ("Mary and I want" becomes "Mary").
fn leading_name_words(captured: &str) -> Option<String> {
    let words: Vec<&str> = captured
        .split_whitespace()
        .take_while(|w| !NON_NAME_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn looks_like_name(segment: &str) -> bool {
    NAME_RE.is_match(segment)
        && segment
            .split_whitespace()
            .all(|w| !NON_NAME_WORDS.contains(&w.to_lowercase().as_str()))
}

/// What the tracker decided after one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Ask {
        field: BookingField,
        reprompt: bool,
        accepted: Vec<BookingField>,
        malformed: Vec<BookingField>,
    },
    Complete {
        draft: BookingDraft,
        accepted: Vec<BookingField>,
    },
}

/// Applies one utterance to the form. Every supplied value is recorded, in
/// or out of order; the form then awaits the first field still unset. If
/// that is the field that was already being asked for and the utterance did
/// not fill anything, or filled it with garbage, the outcome is a re-prompt.
pub fn take_turn(state: &mut DialogueState, parsed: ParsedUtterance) -> TurnOutcome {
    let asked = state.pointer();
    let ParsedUtterance { values, malformed } = parsed;
    let accepted: Vec<BookingField> = values.into_iter().map(|v| state.record(v)).collect();

    if let Some(draft) = state.draft() {
        return TurnOutcome::Complete { draft, accepted };
    }

    let field = state.pointer().unwrap_or(BookingField::Name);
    let reprompt = asked == Some(field) && (accepted.is_empty() || malformed.contains(&field));
    TurnOutcome::Ask {
        field,
        reprompt,
        accepted,
        malformed,
    }
}

/// Reply text for an outcome that still needs input.
pub fn ask_reply(outcome: &TurnOutcome) -> Option<String> {
    let TurnOutcome::Ask {
        field,
        reprompt,
        accepted,
        malformed,
    } = outcome
    else {
        return None;
    };

    let mut reply = String::new();
    if !*reprompt && !accepted.is_empty() {
        reply.push_str("Thanks! ");
    }
    if let Some(bad) = malformed.iter().find(|f| *f != field) {
        reply.push_str(bad.reprompt());
        reply.push(' ');
    }
    if *reprompt {
        reply.push_str(field.reprompt());
    } else {
        reply.push_str(field.prompt());
    }
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DialogueStep;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_everything_in_one_utterance() {
        let parsed = parse_utterance(
            "Mary, 2024-05-01, 14:00, 4 people, mary@example.com",
            Some(BookingField::Name),
            false,
        );
        assert!(parsed.malformed.is_empty());
        assert!(parsed.values.contains(&FieldValue::Name("Mary".to_string())));
        assert!(parsed.values.contains(&FieldValue::Date(date(2024, 5, 1))));
        assert!(parsed.values.contains(&FieldValue::Time(time(14, 0))));
        assert!(parsed.values.contains(&FieldValue::PartySize(4)));
        assert!(parsed
            .values
            .contains(&FieldValue::Email("mary@example.com".to_string())));
    }

    #[test]
    fn test_parse_out_of_order_scenario_completes() {
        let mut state = DialogueState::new();
        let parsed = parse_utterance(
            "mary@example.com, 4 people, 14:00, 2024-05-01, Mary",
            state.pointer(),
            false,
        );
        let outcome = take_turn(&mut state, parsed);
        match outcome {
            TurnOutcome::Complete { draft, accepted } => {
                assert_eq!(accepted.len(), 5);
                assert_eq!(draft.name, "Mary");
                assert_eq!(draft.date, date(2024, 5, 1));
                assert_eq!(draft.time, time(14, 0));
                assert_eq!(draft.party_size, 4);
                assert_eq!(draft.email, "mary@example.com");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(state.step, DialogueStep::Complete);
    }

    #[test]
    fn test_parse_times() {
        let parsed = parse_utterance("at 2pm", Some(BookingField::Time), true);
        assert_eq!(parsed.values, vec![FieldValue::Time(time(14, 0))]);

        let parsed = parse_utterance("7:30 am please", Some(BookingField::Time), true);
        assert_eq!(parsed.values, vec![FieldValue::Time(time(7, 30))]);

        let parsed = parse_utterance("12am", Some(BookingField::Time), true);
        assert_eq!(parsed.values, vec![FieldValue::Time(time(0, 0))]);

        let parsed = parse_utterance("25:00", Some(BookingField::Time), true);
        assert!(parsed.values.is_empty());
        assert_eq!(parsed.malformed, vec![BookingField::Time]);
    }

    #[test]
    fn test_parse_party_size_forms() {
        let parsed = parse_utterance("a table for 6", Some(BookingField::PartySize), true);
        assert_eq!(parsed.values, vec![FieldValue::PartySize(6)]);

        let parsed = parse_utterance("3", Some(BookingField::PartySize), true);
        assert_eq!(parsed.values, vec![FieldValue::PartySize(3)]);

        let parsed = parse_utterance("3", Some(BookingField::Date), true);
        assert!(parsed.values.is_empty());

        let parsed = parse_utterance("45 guests", Some(BookingField::PartySize), true);
        assert_eq!(parsed.malformed, vec![BookingField::PartySize]);
    }

    #[test]
    fn test_parse_explicit_name() {
        let parsed = parse_utterance(
            "Hi, my name is Mary Jane and I want to book",
            Some(BookingField::Name),
            false,
        );
        assert_eq!(parsed.values, vec![FieldValue::Name("Mary Jane".to_string())]);
    }

    #[test]
    fn test_leftover_words_are_not_a_name_unless_asked() {
        let parsed = parse_utterance("Mary", Some(BookingField::Date), false);
        assert!(parsed.values.is_empty());

        let parsed = parse_utterance("I'd like to book a table", Some(BookingField::Name), false);
        assert!(parsed.values.is_empty());
        assert_eq!(parsed.malformed, vec![BookingField::Name]);

        let parsed = parse_utterance("Bob, 2024-05-02", Some(BookingField::Time), true);
        assert_eq!(parsed.values, vec![FieldValue::Date(date(2024, 5, 2))]);
    }

    #[test]
    fn test_malformed_date_reprompts_same_field() {
        let mut state = DialogueState::new();
        take_turn(
            &mut state,
            parse_utterance("Mary", Some(BookingField::Name), false),
        );
        assert_eq!(state.pointer(), Some(BookingField::Date));

        let parsed = parse_utterance("2024-13-45", state.pointer(), true);
        assert_eq!(parsed.malformed, vec![BookingField::Date]);
        let outcome = take_turn(&mut state, parsed);
        assert_eq!(
            outcome,
            TurnOutcome::Ask {
                field: BookingField::Date,
                reprompt: true,
                accepted: vec![],
                malformed: vec![BookingField::Date],
            }
        );
        assert_eq!(
            ask_reply(&outcome).as_deref(),
            Some(BookingField::Date.reprompt())
        );
        assert_eq!(state.pointer(), Some(BookingField::Date));
    }

    #[test]
    fn test_unrecognized_input_reprompts() {
        let mut state = DialogueState::new();
        take_turn(&mut state, parse_utterance("Mary", Some(BookingField::Name), false));
        let awaiting = state.pointer();
        let outcome = take_turn(&mut state, parse_utterance("whenever", awaiting, true));
        assert!(matches!(
            outcome,
            TurnOutcome::Ask {
                field: BookingField::Date,
                reprompt: true,
                ..
            }
        ));
    }

    #[test]
    fn test_volunteered_field_keeps_pointer() {
        let mut state = DialogueState::new();
        take_turn(&mut state, parse_utterance("Mary", Some(BookingField::Name), false));

        let awaiting = state.pointer();
        let outcome = take_turn(
            &mut state,
            parse_utterance("my email is mary@example.com", awaiting, true),
        );
        assert_eq!(
            outcome,
            TurnOutcome::Ask {
                field: BookingField::Date,
                reprompt: false,
                accepted: vec![BookingField::Email],
                malformed: vec![],
            }
        );
        assert_eq!(
            ask_reply(&outcome).unwrap(),
            format!("Thanks! {}", BookingField::Date.prompt())
        );
    }

    #[test]
    fn test_malformed_email_mentioned_while_asking_next_field() {
        let mut state = DialogueState::new();
        take_turn(&mut state, parse_utterance("Mary", Some(BookingField::Name), false));
        let awaiting = state.pointer();
        let outcome = take_turn(
            &mut state,
            parse_utterance("2024-05-01, mary@@example", awaiting, true),
        );
        let reply = ask_reply(&outcome).unwrap();
        assert!(reply.starts_with("Thanks! "));
        assert!(reply.contains(BookingField::Email.reprompt()));
        assert!(reply.ends_with(BookingField::Time.prompt()));
    }

    #[test]
    fn test_collected_name_is_not_overwritten() {
        let mut state = DialogueState::new();
        take_turn(&mut state, parse_utterance("Mary", Some(BookingField::Name), false));
        take_turn(&mut state, parse_utterance("2024-05-01", Some(BookingField::Date), true));

        let parsed = parse_utterance("I'm free at 7pm", state.pointer(), true);
        assert_eq!(parsed.values, vec![FieldValue::Time(time(19, 0))]);
        take_turn(&mut state, parsed);
        assert_eq!(state.fields.name.as_deref(), Some("Mary"));
        assert_eq!(state.pointer(), Some(BookingField::PartySize));

        let parsed = parse_utterance("I am hoping for 4 people", state.pointer(), true);
        assert_eq!(parsed.values, vec![FieldValue::PartySize(4)]);
        take_turn(&mut state, parsed);
        assert_eq!(state.fields.name.as_deref(), Some("Mary"));
        assert_eq!(state.pointer(), Some(BookingField::Email));
    }

    #[test]
    fn test_reprompt_mentions_other_malformed_field() {
        let mut state = DialogueState::new();
        take_turn(&mut state, parse_utterance("Mary", Some(BookingField::Name), false));

        let awaiting = state.pointer();
        let outcome = take_turn(
            &mut state,
            parse_utterance("2024-13-45, mary@@example", awaiting, true),
        );
        assert!(matches!(
            outcome,
            TurnOutcome::Ask {
                field: BookingField::Date,
                reprompt: true,
                ..
            }
        ));
        assert_eq!(
            ask_reply(&outcome).unwrap(),
            format!(
                "{} {}",
                BookingField::Email.reprompt(),
                BookingField::Date.reprompt()
            )
        );
    }

    #[test]
    fn test_pointer_never_skips_unset_field() {
        let pool = [
            "Mary",
            "2024-05-01",
            "14:00",
            "4 people",
            "mary@example.com",
            "2024-02-30",
            "blah",
            "6 guests, bob@example.com",
            "9pm, 2025-01-01",
        ];

        for a in pool {
            for b in pool {
                for c in pool {
                    let mut state = DialogueState::new();
                    for utterance in [a, b, c] {
                        let name_known = state.fields.name.is_some();
                        let parsed = parse_utterance(utterance, state.pointer(), name_known);
                        let outcome = take_turn(&mut state, parsed);

                        let first_unset = BookingField::ORDER
                            .into_iter()
                            .find(|f| !state.fields.is_set(*f));
                        match first_unset {
                            Some(f) => {
                                assert_eq!(state.step, DialogueStep::Awaiting(f));
                                assert!(
                                    matches!(outcome, TurnOutcome::Ask { field, .. } if field == f)
                                );
                            }
                            None => {
                                assert_eq!(state.step, DialogueStep::Complete);
                                assert!(matches!(outcome, TurnOutcome::Complete { .. }));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_extracted_validates() {
        let fields = ExtractedFields {
            customer_name: Some("Ana María".to_string()),
            date: Some("tomorrow".to_string()),
            time: Some("18:30".to_string()),
            party_size: Some(0),
            email: Some("ANA@example.com".to_string()),
        };
        let parsed = ParsedUtterance::from_extracted(&fields);
        assert_eq!(
            parsed.values,
            vec![
                FieldValue::Name("Ana María".to_string()),
                FieldValue::Time(time(18, 30)),
                FieldValue::Email("ana@example.com".to_string()),
            ]
        );
        assert_eq!(
            parsed.malformed,
            vec![BookingField::Date, BookingField::PartySize]
        );
    }

    #[test]
    fn test_intents() {
        assert!(is_booking_intent("I'd like to book a table"));
        assert!(is_booking_intent("Can I make a reservation?"));
        assert!(!is_booking_intent("What are your opening hours?"));
        assert!(is_cancel_request("never mind"));
        assert!(is_cancel_request("Cancel that please"));
        assert!(!is_cancel_request("can I cancel later?"));
    }
}
