//! Shape of the documents and settings exchanged with the remote service.
//!
//! Only the fields the playground reads are modelled; anything else the
//! service sends is ignored so additive schema changes stay compatible.

use serde::{Deserialize, Serialize};

/// A document as returned by the reference and document endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub references: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub contents: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    #[serde(default)]
    pub paragraphs: Option<Vec<Paragraph>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub references: Option<Vec<Reference>>,
}

/// A match between the uploaded document and a library document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub document_id: String,
    pub similarity: f64,
    #[serde(default)]
    pub has_opposite_meaning: Option<bool>,
}

impl Document {
    /// Rebuilds the plain text of the document.
    ///
    /// Paragraphs of one content block are joined with `\n`; the blocks
    /// themselves are appended back to back. Blocks without a paragraph list
    /// are skipped.
    pub fn text_content(&self) -> String {
        let mut content = String::new();
        for page in &self.pages {
            for block in &page.contents {
                if let Some(paragraphs) = &block.paragraphs {
                    let joined = paragraphs
                        .iter()
                        .map(|p| p.text.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    content.push_str(&joined);
                }
            }
        }
        content
    }

    /// Document-level references, empty when the service reported none.
    pub fn references(&self) -> &[Reference] {
        self.references.as_deref().unwrap_or_default()
    }

    /// First paragraph of the first content block of the first page.
    pub fn first_paragraph(&self) -> Option<&Paragraph> {
        self.pages
            .first()?
            .contents
            .first()?
            .paragraphs
            .as_ref()?
            .first()
    }
}

/// One row of a library listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    pub name: String,
}

/// Partial domain settings. Only the similarity model is touched by the playground.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_model_id: Option<String>,
}
