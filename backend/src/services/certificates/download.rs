//! Archive and single-certificate downloads. Both are linked by URL and
//! need no bearer token.

use crate::error::{OrNotFound, ServiceError};
use crate::storage::Storage;
use crate::store::CertificateRepository;
use actix_files::NamedFile;
use actix_web::http::header::{Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue};
use actix_web::web;
use std::io;

fn open(path: &std::path::Path, what: &str) -> Result<NamedFile, ServiceError> {
    NamedFile::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ServiceError::not_found(what),
        _ => e.into(),
    })
}

/// `certificates_{job_id}.zip`, streamed as `application/zip`.
pub async fn archive(
    storage: web::Data<Storage>,
    name: web::Path<String>,
) -> Result<NamedFile, ServiceError> {
    let path = storage
        .archive_path(&name)
        .ok_or_else(|| ServiceError::not_found("archive"))?;
    open(&path, "archive")
}

/// One certificate PDF, named after its participant.
pub async fn certificate(
    storage: web::Data<Storage>,
    certificates: web::Data<dyn CertificateRepository>,
    certificate_id: web::Path<String>,
) -> Result<NamedFile, ServiceError> {
    let record = certificates
        .get_certificate(&certificate_id)
        .or_not_found("certificate")?;
    let file = open(&storage.certificate_path(&record.id), "certificate")?;
    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: format!("{}_certificate.pdf", record.fio).into_bytes(),
        })],
    }))
}
