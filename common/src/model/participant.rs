use serde::{Deserialize, Serialize};

/// A certificate recipient, supplied with each generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Full name as printed on the certificate.
    pub fio: String,
    pub email: String,
    pub role: String,
    /// Placement in a competition, if any.
    #[serde(default)]
    pub place: Option<u32>,
}

impl Participant {
    /// Placement rendered for text output; absent or zero places become empty.
    pub fn place_label(&self) -> String {
        match self.place {
            Some(place) if place > 0 => place.to_string(),
            _ => String::new(),
        }
    }
}
