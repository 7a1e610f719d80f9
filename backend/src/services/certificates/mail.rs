//! Certificate email delivery.
//!
//! The pipeline hands each message to a [`Mailer`]. [`LogMailer`] only logs;
//! [`OutboxMailer`] writes RFC 822 `.eml` files for a relay to pick up.

use crate::storage::write_atomic;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use log::info;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

const BASE64_LINE: usize = 76;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("cannot write message: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// Stable id of the message, the certificate id.
    pub id: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

fn check_recipient(to: &str) -> Result<(), MailError> {
    if to.trim().is_empty() || !to.contains('@') {
        return Err(MailError::InvalidRecipient(to.to_string()));
    }
    Ok(())
}

pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        info!(
            "email to {}: subject={:?} body={:?} attachment={}",
            mail.to, mail.subject, mail.body, mail.attachment_name
        );
        Ok(())
    }
}

pub struct OutboxMailer {
    dir: PathBuf,
    from: String,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            from: from.into(),
        })
    }

    pub fn message_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.eml"))
    }
}

/// RFC 2047 encoded-word for header values outside ASCII.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", general_purpose::STANDARD.encode(value))
    }
}

fn push_base64_lines(out: &mut String, bytes: &[u8]) {
    let encoded = general_purpose::STANDARD.encode(bytes);
    // base64 output is ASCII, so byte offsets are char boundaries.
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(BASE64_LINE));
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
}

/// Render `mail` as a multipart/mixed message with the attachment in base64.
pub fn to_eml(from: &str, mail: &OutgoingMail) -> String {
    let boundary = format!(
        "----=_CERTIFY_{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let attachment = encode_header(&mail.attachment_name);

    let mut eml = String::new();
    eml.push_str(&format!("From: {from}\r\n"));
    eml.push_str(&format!("To: {}\r\n", mail.to));
    eml.push_str(&format!("Subject: {}\r\n", encode_header(&mail.subject)));
    eml.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
    eml.push_str("MIME-Version: 1.0\r\n");
    eml.push_str(&format!("Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"));

    eml.push_str(&format!("--{boundary}\r\n"));
    eml.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
    eml.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    push_base64_lines(&mut eml, mail.body.as_bytes());

    eml.push_str(&format!("--{boundary}\r\n"));
    eml.push_str(&format!("Content-Type: application/pdf; name=\"{attachment}\"\r\n"));
    eml.push_str(&format!("Content-Disposition: attachment; filename=\"{attachment}\"\r\n"));
    eml.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    push_base64_lines(&mut eml, &mail.attachment);

    eml.push_str(&format!("--{boundary}--\r\n"));
    eml
}

impl Mailer for OutboxMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        check_recipient(&mail.to)?;
        let path = self.message_path(&mail.id);
        write_atomic(&path, to_eml(&self.from, mail).as_bytes())?;
        info!("queued email to {} at {}", mail.to, path.display());
        Ok(())
    }
}
