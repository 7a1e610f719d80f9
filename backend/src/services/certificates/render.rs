//! Certificate layout and PDF rendering.
//!
//! Rendering is split in two steps. [`CertificateLayout::compose`] turns a
//! participant and the template markup into a flat list of blocks; a
//! [`CertificateRenderer`] turns those blocks into PDF bytes. Only the second
//! step needs font files.

use crate::config::RenderSettings;
use crate::services::certificates::markup;
use crate::services::certificates::placeholders::Substitution;
use common::model::participant::Participant;
use common::model::template::TemplateType;
use genpdf::elements::{Break, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Document, Element, PaperSize, SimplePageDecorator};
use log::debug;
use std::path::PathBuf;
use thiserror::Error;

const TEMPLATE_LINE_LIMIT: usize = 10;
const PAGE_MARGIN_MM: i32 = 20;
/// Height of one line at the default font size, used to turn spacers into breaks.
const LINE_HEIGHT_MM: f64 = 5.0;
const DEFAULT_ROLE: &str = "участник";
const ISSUE_DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot load font family {family} from {dir}: {source}")]
    Font {
        dir: PathBuf,
        family: String,
        source: genpdf::error::Error,
    },
    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Name,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Vertical gap in millimetres.
    Spacer(f64),
    Paragraph { lines: Vec<String>, style: TextRole },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CertificateLayout {
    pub blocks: Vec<Block>,
}

pub fn today() -> String {
    chrono::Local::now().format(ISSUE_DATE_FORMAT).to_string()
}

impl CertificateLayout {
    /// Layout for one participant. A missing issue date is substituted as
    /// today's date but is not printed by the fixed layout.
    pub fn compose(
        participant: &Participant,
        template_text: &str,
        template_type: TemplateType,
        event_name: &str,
        issue_date: Option<&str>,
    ) -> Self {
        let date = issue_date.map(str::to_string).unwrap_or_else(today);
        let substituted = Substitution::new(participant, event_name, Some(&date)).apply(template_text);
        let lines = markup::text_lines(&substituted);
        if lines.is_empty() {
            debug!("{template_type} template has no text, using the fixed certificate layout");
            return Self::fixed(participant, event_name, issue_date);
        }
        Self::from_template_lines(lines)
    }

    fn from_template_lines(lines: Vec<String>) -> Self {
        let mut blocks = vec![Block::Spacer(40.0)];
        for line in lines.into_iter().take(TEMPLATE_LINE_LIMIT) {
            blocks.push(Block::Paragraph {
                lines: vec![line],
                style: TextRole::Body,
            });
            blocks.push(Block::Spacer(5.0));
        }
        Self { blocks }
    }

    fn fixed(participant: &Participant, event_name: &str, issue_date: Option<&str>) -> Self {
        let mut details = format!("за участие в мероприятии\n{event_name}");
        if participant.role != DEFAULT_ROLE {
            details.push_str(&format!("\nв качестве {}", participant.role));
        }
        let place = participant.place_label();
        if !place.is_empty() {
            details.push_str(&format!("\nи занятие {place} места"));
        }

        let mut blocks = vec![
            Block::Spacer(60.0),
            Block::Paragraph {
                lines: vec!["СЕРТИФИКАТ".to_string()],
                style: TextRole::Title,
            },
            Block::Spacer(20.0),
            Block::Paragraph {
                lines: vec![participant.fio.clone()],
                style: TextRole::Name,
            },
            Block::Spacer(15.0),
            Block::Paragraph {
                lines: details.lines().map(str::to_string).collect(),
                style: TextRole::Body,
            },
            Block::Spacer(20.0),
        ];
        if let Some(date) = issue_date.filter(|d| !d.is_empty()) {
            blocks.push(Block::Paragraph {
                lines: vec![format!("Дата выдачи: {date}")],
                style: TextRole::Body,
            });
        }
        Self { blocks }
    }

    /// Text of every paragraph, in order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph { lines, .. } => Some(lines),
                Block::Spacer(_) => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

pub trait CertificateRenderer: Send + Sync {
    fn render(&self, layout: &CertificateLayout) -> Result<Vec<u8>, RenderError>;
}

/// A4 renderer backed by genpdf. The font family is loaded once.
pub struct GenPdfRenderer {
    fonts: FontFamily<FontData>,
}

impl GenPdfRenderer {
    pub fn load(settings: &RenderSettings) -> Result<Self, RenderError> {
        let fonts = genpdf::fonts::from_files(&settings.fonts_dir, &settings.font_family, None)
            .map_err(|source| RenderError::Font {
                dir: settings.fonts_dir.clone(),
                family: settings.font_family.clone(),
                source,
            })?;
        Ok(Self { fonts })
    }

    fn configure_document(&self) -> Document {
        let mut doc = Document::new(self.fonts.clone());
        doc.set_title("Сертификат");
        doc.set_paper_size(PaperSize::A4);
        doc.set_font_size(14);
        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(PAGE_MARGIN_MM);
        doc.set_page_decorator(decorator);
        doc
    }
}

fn style_for(role: TextRole) -> Style {
    match role {
        TextRole::Title => Style::new()
            .bold()
            .with_font_size(24)
            .with_color(Color::Rgb(0x55, 0x00, 0xd8)),
        TextRole::Name => Style::new().bold().with_font_size(20),
        TextRole::Body => Style::new().with_font_size(14),
    }
}

impl CertificateRenderer for GenPdfRenderer {
    fn render(&self, layout: &CertificateLayout) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.configure_document();
        for block in &layout.blocks {
            match block {
                Block::Spacer(mm) => doc.push(Break::new(mm / LINE_HEIGHT_MM)),
                Block::Paragraph { lines, style } => {
                    for line in lines {
                        doc.push(
                            Paragraph::new(line.as_str())
                                .aligned(Alignment::Center)
                                .styled(style_for(*style)),
                        );
                    }
                }
            }
        }
        let mut out = Vec::new();
        doc.render(&mut out)?;
        Ok(out)
    }
}
