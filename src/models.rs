use serde::{Deserialize, Serialize};

pub type DocumentId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: DocumentId,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Query parameters any view may receive.
#[derive(Debug, Deserialize, Default)]
pub struct ViewQuery {
    pub query: Option<String>,
}

/// Union of every field submitted by the view forms.
#[derive(Debug, Deserialize, Default)]
pub struct SubmitForm {
    pub action: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl SubmitForm {
    pub fn draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone().unwrap_or_default(),
            body: self.body.clone().unwrap_or_default(),
        }
    }
}
