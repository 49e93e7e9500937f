//! # Documento do Toolkit
//!
//! Representação de documento usada por toolkits de NLP: tokens com
//! marcadores IOB por token (`ent_iob`, `ent_type`) e a lista de entidades
//! do documento (`ents`).
//!
//! É a forma de troca com o modelo externo ([`crate::model::DocModel`]) e o
//! alvo de [`crate::sample::Sample::to_doc`].

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::scheme::{bio_to_bilou, Scheme, OUTSIDE};
use crate::tokenizer::Token;

/// Marcador IOB de um token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntIob {
    #[serde(rename = "B")]
    Begin,
    #[serde(rename = "I")]
    Inside,
    #[default]
    #[serde(rename = "O")]
    Outside,
}

impl EntIob {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntIob::Begin => "B",
            EntIob::Inside => "I",
            EntIob::Outside => "O",
        }
    }
}

/// Um token do documento e sua marcação de entidade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocToken {
    #[serde(flatten)]
    pub token: Token,
    #[serde(default)]
    pub ent_iob: EntIob,
    /// Tipo da entidade; vazio quando `ent_iob` é `O`.
    #[serde(default)]
    pub ent_type: String,
}

impl From<Token> for DocToken {
    fn from(token: Token) -> Self {
        Self {
            token,
            ent_iob: EntIob::Outside,
            ent_type: String::new(),
        }
    }
}

/// Uma entidade do documento, em offsets de caractere e de token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntity {
    pub label: String,
    pub text: String,
    /// Offset inicial em caracteres.
    pub start_char: usize,
    /// Offset final (exclusivo) em caracteres.
    pub end_char: usize,
    /// Índice do primeiro token.
    pub start: usize,
    /// Índice do token seguinte ao último (exclusivo).
    pub end: usize,
}

/// Documento do toolkit: texto, tokens e entidades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<DocToken>,
    #[serde(default)]
    pub ents: Vec<DocEntity>,
}

impl Doc {
    /// Documento sem entidades.
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            text: text.into(),
            tokens: tokens.into_iter().map(DocToken::from).collect(),
            ents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Cria uma entidade sobre os tokens `range`.
    ///
    /// Retorna `None` se o intervalo for vazio ou passar do fim.
    pub fn entity(&self, range: Range<usize>, label: impl Into<String>) -> Option<DocEntity> {
        if range.is_empty() || range.end > self.tokens.len() {
            return None;
        }
        let start_char = self.tokens[range.start].token.start;
        let end_char = self.tokens[range.end - 1].token.end();
        let text = self
            .text
            .chars()
            .skip(start_char)
            .take(end_char.saturating_sub(start_char))
            .collect();
        Some(DocEntity {
            label: label.into(),
            text,
            start_char,
            end_char,
            start: range.start,
            end: range.end,
        })
    }

    /// Define as entidades e reescreve os marcadores IOB dos tokens.
    ///
    /// Entidades sobrepostas não são validadas: a última escrita vence.
    pub fn set_ents(&mut self, ents: Vec<DocEntity>) {
        for token in &mut self.tokens {
            token.ent_iob = EntIob::Outside;
            token.ent_type.clear();
        }
        for ent in &ents {
            let end = ent.end.min(self.tokens.len());
            for i in ent.start..end {
                let token = &mut self.tokens[i];
                token.ent_iob = if i == ent.start {
                    EntIob::Begin
                } else {
                    EntIob::Inside
                };
                token.ent_type = ent.label.clone();
            }
        }
        self.ents = ents;
    }

    /// Tags BIO a partir dos marcadores IOB (`B-X`, `I-X` ou `O`).
    pub fn iob_tags(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| match t.ent_iob {
                EntIob::Outside => OUTSIDE.to_string(),
                iob => format!("{}-{}", iob.as_str(), t.ent_type),
            })
            .collect()
    }

    /// Tags IO: o tipo da entidade, ou `O` quando vazio.
    pub fn entity_type_tags(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| {
                if t.ent_type.is_empty() {
                    OUTSIDE.to_string()
                } else {
                    t.ent_type.clone()
                }
            })
            .collect()
    }

    /// Tags no esquema pedido.
    pub fn tags(&self, scheme: Scheme) -> Vec<String> {
        match scheme {
            Scheme::Io => self.entity_type_tags(),
            Scheme::Bio => self.iob_tags(),
            Scheme::Bilou => bio_to_bilou(&self.iob_tags()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn sample_doc() -> Doc {
        let text = "Ana mora em Belo Horizonte";
        let mut doc = Doc::new(text, tokenize(text));
        let ents = vec![
            doc.entity(0..1, "PERSON").unwrap(),
            doc.entity(3..5, "GPE").unwrap(),
        ];
        doc.set_ents(ents);
        doc
    }

    #[test]
    fn test_entity_offsets() {
        let doc = sample_doc();
        assert_eq!(doc.ents[1].text, "Belo Horizonte");
        assert_eq!(doc.ents[1].start_char, 12);
        assert_eq!(doc.ents[1].end_char, 26);
        assert!(doc.entity(2..2, "X").is_none());
        assert!(doc.entity(4..9, "X").is_none());
    }

    #[test]
    fn test_tags_per_scheme() {
        let doc = sample_doc();
        assert_eq!(doc.tags(Scheme::Io), ["PERSON", "O", "O", "GPE", "GPE"]);
        assert_eq!(doc.tags(Scheme::Bio), ["B-PERSON", "O", "O", "B-GPE", "I-GPE"]);
        assert_eq!(doc.tags(Scheme::Bilou), ["U-PERSON", "O", "O", "B-GPE", "L-GPE"]);
    }

    #[test]
    fn test_set_ents_resets_markers() {
        let mut doc = sample_doc();
        doc.set_ents(Vec::new());
        assert!(doc.iob_tags().iter().all(|t| t == "O"));
        assert!(doc.ents.is_empty());
    }

    #[test]
    fn test_doc_serde_flattens_token() {
        let doc = sample_doc();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["tokens"][0]["text"], "Ana");
        assert_eq!(json["tokens"][0]["ent_iob"], "B");
        let back: Doc = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
