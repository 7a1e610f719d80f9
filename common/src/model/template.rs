use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Markup flavour of an uploaded certificate template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Svg,
    Html,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Svg => "svg",
            TemplateType::Html => "html",
        }
    }

    /// Extension used when the uploaded file name carries none.
    pub fn default_extension(&self) -> &'static str {
        match self {
            TemplateType::Svg => ".svg",
            TemplateType::Html => ".html",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(TemplateType::Svg),
            "html" | "htm" => Ok(TemplateType::Html),
            other => Err(format!("unsupported template type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub file_url: Option<String>,
    pub preview_url: Option<String>,
}

impl Template {
    pub fn new(id: String, name: String, template_type: TemplateType) -> Self {
        let file_url = Some(format!("/api/templates/{id}/file"));
        let preview_url = Some(format!("/api/templates/{id}/preview"));
        Self {
            id,
            name,
            template_type,
            file_url,
            preview_url,
        }
    }
}
