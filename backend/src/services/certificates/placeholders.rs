//! Placeholder substitution for certificate templates and email text.
//!
//! Tokens are bracketed field names, accepted in single-brace `{fio}` and
//! double-brace `{{fio}}` form, in Russian or English. The text is scanned
//! once, left to right: substituted values are never re-scanned, and
//! unknown tokens are kept verbatim.

use common::model::participant::Participant;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^{}]+)\}\}|\{([^{}]+)\}").expect("token pattern is valid")
});

/// Participant and event field a token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
    Role,
    Place,
    EventName,
    Date,
}

fn field_for(token: &str) -> Option<Field> {
    let field = match token {
        "имя" | "Имя" | "ФИО" | "fio" => Field::Name,
        "email" | "Email" => Field::Email,
        "роль" | "Роль" | "role" => Field::Role,
        "место" | "Место" | "place" => Field::Place,
        "название мероприятия" | "Название мероприятия" | "название" | "event_name"
        | "event" => Field::EventName,
        "дата" | "Дата" | "date" | "issue_date" => Field::Date,
        _ => return None,
    };
    Some(field)
}

/// Values substituted for one participant.
#[derive(Debug, Clone, Copy)]
pub struct Substitution<'a> {
    pub participant: &'a Participant,
    pub event_name: &'a str,
    pub issue_date: Option<&'a str>,
}

impl<'a> Substitution<'a> {
    pub fn new(participant: &'a Participant, event_name: &'a str, issue_date: Option<&'a str>) -> Self {
        Self {
            participant,
            event_name,
            issue_date,
        }
    }

    fn value(&self, field: Field) -> String {
        match field {
            Field::Name => self.participant.fio.clone(),
            Field::Email => self.participant.email.clone(),
            Field::Role => self.participant.role.clone(),
            Field::Place => self.participant.place_label(),
            Field::EventName => self.event_name.to_string(),
            Field::Date => self.issue_date.unwrap_or_default().to_string(),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures| {
                let token = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                match field_for(token) {
                    Some(field) => self.value(field),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
