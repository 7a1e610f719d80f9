//! `POST /api/participants/parse`: reads a CSV/TXT participant list.
//!
//! The delimiter is guessed from the header line. Header cells are matched
//! by name in Russian or English, rows are validated in parallel, and when
//! an `event_id` is given the list is narrowed to the event's roles.

use crate::error::{OrNotFound, ServiceError};
use crate::services::auth::AuthUser;
use crate::services::multipart::read_form;
use crate::store::EventRepository;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::event::EventRole;
use common::model::participant::Participant;
use log::info;
use rayon::prelude::*;
use std::path::Path;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "txt"];
const DEFAULT_ROLE: &str = "участник";

/// Column positions resolved from the header row.
#[derive(Debug, Default, PartialEq, Eq)]
struct Columns {
    fio: Option<usize>,
    email: Option<usize>,
    role: Option<usize>,
    place: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Self {
        let mut columns = Columns::default();
        for (i, cell) in header.iter().enumerate() {
            let slot = match cell.trim().to_lowercase().as_str() {
                "fio" | "фио" | "имя" | "name" => &mut columns.fio,
                "email" | "почта" => &mut columns.email,
                "role" | "роль" => &mut columns.role,
                "place" | "место" => &mut columns.place,
                _ => continue,
            };
            slot.get_or_insert(i);
        }
        columns
    }
}

/// The candidate delimiter occurring most often in the header, `,` if none do.
pub fn detect_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .map(|&d| (d, header_line.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(u8, usize)>, (d, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((d, count)),
        })
        .map_or(b',', |(d, _)| d)
}

fn cell<'r>(record: &'r csv::StringRecord, column: Option<usize>) -> &'r str {
    column.and_then(|i| record.get(i)).map_or("", str::trim)
}

fn row_to_participant(
    line: u64,
    record: &csv::StringRecord,
    columns: &Columns,
) -> Result<Option<Participant>, String> {
    let fio = cell(record, columns.fio);
    if fio.is_empty() {
        return Ok(None);
    }
    let email = cell(record, columns.email);
    if !email.is_empty() && !(email.contains('@') && email.contains('.')) {
        return Err(format!("line {line}: invalid email {email:?}"));
    }
    let role = match cell(record, columns.role) {
        "" => DEFAULT_ROLE,
        role => role,
    };
    Ok(Some(Participant {
        fio: fio.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        place: cell(record, columns.place).parse().ok(),
    }))
}

/// Parse a delimited participant list. The first error by line number is
/// reported.
pub fn parse_participants(bytes: &[u8]) -> Result<Vec<Participant>, ServiceError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ServiceError::Validation("participant file must be UTF-8 text".into()))?;
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text.lines().next().unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .flexible(true)
        .from_reader(text.as_bytes());
    let invalid = |e: csv::Error| ServiceError::Validation(format!("malformed participant file: {e}"));

    let columns = Columns::from_header(reader.headers().map_err(invalid)?);
    if columns.fio.is_none() {
        return Err(ServiceError::Validation(
            "participant file has no name column (fio/фио/имя/name)".into(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(invalid)?;
        let line = record.position().map_or(0, |p| p.line());
        rows.push((line, record));
    }

    let parsed: Vec<Result<Option<Participant>, String>> = rows
        .par_iter()
        .map(|(line, record)| row_to_participant(*line, record, &columns))
        .collect();

    let mut participants = Vec::with_capacity(parsed.len());
    for row in parsed {
        if let Some(participant) = row.map_err(ServiceError::Validation)? {
            participants.push(participant);
        }
    }
    Ok(participants)
}

/// Keep participants whose role (case-insensitive) is one of `roles`.
/// An event without roles accepts everyone.
pub fn filter_by_roles(participants: Vec<Participant>, roles: &[EventRole]) -> Vec<Participant> {
    if roles.is_empty() {
        return participants;
    }
    let allowed: Vec<String> = roles.iter().map(|r| r.name.to_lowercase()).collect();
    participants
        .into_iter()
        .filter(|p| allowed.contains(&p.role.to_lowercase()))
        .collect()
}

fn has_accepted_extension(filename: Option<&str>) -> bool {
    filename
        .and_then(|f| Path::new(f).extension())
        .and_then(|e| e.to_str())
        .is_some_and(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

pub async fn process(
    user: AuthUser,
    events: web::Data<dyn EventRepository>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let form = read_form(payload).await?;
    let roles = match form.field("event_id") {
        Some(event_id) => {
            events
                .get_event(&user.organization, event_id)
                .or_not_found("event")?
                .roles
        }
        None => Vec::new(),
    };
    let file = form
        .file
        .ok_or_else(|| ServiceError::Validation("participant file is required".into()))?;
    if !has_accepted_extension(file.filename.as_deref()) {
        return Err(ServiceError::Validation(
            "participant file must be .csv or .txt".into(),
        ));
    }

    let participants = tokio::task::spawn_blocking(move || parse_participants(&file.bytes)).await??;
    let participants = filter_by_roles(participants, &roles);
    info!("{} parsed {} participants", user.username, participants.len());
    Ok(HttpResponse::Ok().json(participants))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_the_dominant_delimiter() {
        assert_eq!(detect_delimiter("fio;email;role"), b';');
        assert_eq!(detect_delimiter("fio\temail"), b'\t');
        assert_eq!(detect_delimiter("fio|email|role|place"), b'|');
        assert_eq!(detect_delimiter("fio"), b',');
    }

    #[test]
    fn parses_russian_headers_with_semicolons() {
        let csv = "\u{feff}ФИО;Почта;Роль;Место\n\
                   Иванов И.И.;a@b.com;победитель;1\n\
                   Петрова А.А.;p@b.com;;\n\
                   ;skip@b.com;участник;\n";
        let participants = parse_participants(csv.as_bytes()).unwrap();
        assert_eq!(
            participants,
            vec![
                Participant {
                    fio: "Иванов И.И.".into(),
                    email: "a@b.com".into(),
                    role: "победитель".into(),
                    place: Some(1),
                },
                Participant {
                    fio: "Петрова А.А.".into(),
                    email: "p@b.com".into(),
                    role: "участник".into(),
                    place: None,
                },
            ]
        );
    }

    #[test]
    fn non_numeric_place_is_none() {
        let csv = "name,email,place\nA,a@b.com,first\n";
        let participants = parse_participants(csv.as_bytes()).unwrap();
        assert_eq!(participants[0].place, None);
    }

    #[test]
    fn invalid_email_names_the_first_bad_line() {
        let csv = "fio,email\nA,a@b.com\nB,broken\nC,also-broken\n";
        let err = parse_participants(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 3: invalid email \"broken\"");
    }

    #[test]
    fn missing_name_column_is_rejected() {
        let err = parse_participants(b"email,role\na@b.com,x\n").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn role_filter_is_case_insensitive() {
        let p = |role: &str| Participant {
            fio: "A".into(),
            email: "a@b.com".into(),
            role: role.into(),
            place: None,
        };
        let roles = vec![EventRole {
            name: "Победитель".into(),
            color: "#FF6B6B".into(),
        }];
        let kept = filter_by_roles(vec![p("победитель"), p("участник")], &roles);
        assert_eq!(kept, vec![p("победитель")]);
        assert_eq!(filter_by_roles(vec![p("x")], &[]).len(), 1);
    }

    #[test]
    fn only_csv_and_txt_are_accepted() {
        assert!(has_accepted_extension(Some("list.CSV")));
        assert!(has_accepted_extension(Some("list.txt")));
        assert!(!has_accepted_extension(Some("list.xlsx")));
        assert!(!has_accepted_extension(None));
    }
}
