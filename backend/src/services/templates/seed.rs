//! Base templates shipped with the binary, installed on first start.

use crate::error::ServiceError;
use crate::storage::{write_atomic, Storage};
use crate::store::TemplateRepository;
use common::model::template::{Template, TemplateType};
use include_dir::{include_dir, Dir};
use log::{info, warn};
use uuid::Uuid;

static BASE_TEMPLATE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/base_templates");

const BASE_TEMPLATES: [(&str, TemplateType, &str); 4] = [
    ("Классический сертификат", TemplateType::Svg, "classic_certificate.svg"),
    ("Современный сертификат", TemplateType::Html, "modern_certificate.html"),
    ("Элегантный сертификат", TemplateType::Svg, "elegant_certificate.svg"),
    ("Минималистичный сертификат", TemplateType::Html, "minimal_certificate.html"),
];

/// Install every base template whose name is not taken yet. Returns how many
/// were installed.
pub fn seed_base_templates(
    templates: &dyn TemplateRepository,
    storage: &Storage,
) -> Result<usize, ServiceError> {
    let mut installed = 0;
    for (name, template_type, file_name) in BASE_TEMPLATES {
        if templates.find_template_by_name(name)?.is_some() {
            continue;
        }
        let Some(file) = BASE_TEMPLATE_DIR.get_file(file_name) else {
            warn!("base template {file_name} is not bundled");
            continue;
        };

        let id = Uuid::new_v4().to_string();
        write_atomic(
            &storage.template_path(&id, template_type.default_extension()),
            file.contents(),
        )?;
        templates.insert_template(&Template::new(id, name.to_string(), template_type))?;
        installed += 1;
    }
    if installed > 0 {
        info!("installed {installed} base templates");
    }
    Ok(installed)
}
