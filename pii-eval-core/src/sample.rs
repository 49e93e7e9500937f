//! # Amostra de Avaliação
//!
//! Um [`Sample`] agrega tudo o que a avaliação precisa sobre um texto: o
//! texto completo, os spans anotados (a verdade de referência), os tokens e
//! uma tag por token, além de metadados livres e do template de origem.
//!
//! ## Ciclo de vida
//!
//! - [`Sample::from_spans`]: texto + spans; tokens e tags são derivados na
//!   construção pelo motor de alinhamento.
//! - [`Sample::from_record`] (e a desserialização): tokens e tags chegam
//!   prontos e são preservados como estão.
//! - [`Sample::from_doc`]: documento de um toolkit de NLP.
//!
//! As tags podem ser reescritas no lugar (esquema ou vocabulário) sem tocar
//! nos tokens; por isso `spans` e `tags` podem divergir temporariamente.
//! A invariante `tags.len() == tokens.len()` vale sempre.
//!
//! ```rust
//! use pii_eval_core::{Sample, Scheme, Span, WordTokenizer};
//!
//! let mut sample = Sample::from_spans(
//!     "Ana mora em Belo Horizonte",
//!     vec![Span::new("LOCATION", "Belo Horizonte", 12, 26)],
//!     &WordTokenizer,
//!     Scheme::Bilou,
//! );
//! assert_eq!(sample.tags(), ["O", "O", "O", "B-LOCATION", "L-LOCATION"]);
//!
//! sample.bilou_to_bio();
//! assert_eq!(sample.tags(), ["O", "O", "O", "B-LOCATION", "I-LOCATION"]);
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::align::span_to_tag;
use crate::doc::Doc;
use crate::error::{EvalError, Result};
use crate::model::TokenMismatch;
use crate::scheme::{self, Scheme, OUTSIDE};
use crate::span::Span;
use crate::tokenizer::{Token, Tokenizer};
use crate::vocab::{translate_tags, LabelMap};

/// Metadados livres de uma amostra (ex: `Gender`, `Country`, `Template#`).
pub type Metadata = serde_json::Map<String, Value>;

/// Chave de metadado com o template de origem de amostras geradas.
pub const TEMPLATE_KEY: &str = "Template#";

/// Registro persistido de uma amostra.
///
/// É o esquema de troca em JSON; [`Sample`] serializa através dele.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub full_text: String,
    #[serde(default)]
    pub masked: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Aceita string ou número; gravado sempre como string.
    #[serde(default, deserialize_with = "template_id_from_value")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

fn template_id_from_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

/// Uma amostra rotulada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord", into = "SampleRecord")]
pub struct Sample {
    /// Texto bruto.
    pub full_text: String,
    /// Versão mascarada do texto (saída desejada), se houver.
    pub masked: Option<String>,
    /// Spans de referência.
    pub spans: Vec<Span>,
    /// Template de origem, para amostras geradas.
    pub template_id: Option<String>,
    pub metadata: Option<Metadata>,
    tokens: Vec<Token>,
    tags: Vec<String>,
}

impl Sample {
    /// Constrói a amostra a partir dos spans, derivando tokens e tags.
    pub fn from_spans<T: Tokenizer + ?Sized>(
        full_text: impl Into<String>,
        spans: Vec<Span>,
        tokenizer: &T,
        scheme: Scheme,
    ) -> Self {
        let full_text = full_text.into();
        let (tokens, tags) = span_to_tag(&full_text, tokenizer, &spans, scheme);
        Self {
            full_text,
            masked: None,
            spans,
            template_id: None,
            metadata: None,
            tokens,
            tags,
        }
    }

    /// Reconstrói a amostra de um registro persistido, sem re-derivar tags.
    pub fn from_record(record: SampleRecord) -> Result<Self> {
        if record.tokens.len() != record.tags.len() {
            return Err(EvalError::LengthMismatch {
                tokens: record.tokens.len(),
                tags: record.tags.len(),
            });
        }
        let sample = Self {
            full_text: record.full_text,
            masked: record.masked,
            spans: record.spans,
            template_id: record.template_id,
            metadata: None,
            tokens: record.tokens,
            tags: record.tags,
        };
        Ok(match record.metadata {
            Some(metadata) => sample.with_metadata(metadata),
            None => sample,
        })
    }

    /// Constrói a amostra a partir de um documento do toolkit.
    ///
    /// Os spans vêm de `doc.ents` e as tags dos marcadores IOB dos tokens.
    /// Com `map_toolkit_entities`, tipos e tags são traduzidos para o
    /// vocabulário de PII. Só aceita esquemas com prefixo (BIO ou BILOU).
    pub fn from_doc(doc: &Doc, map_toolkit_entities: bool, scheme: Scheme) -> Result<Self> {
        if scheme == Scheme::Io {
            return Err(EvalError::UnsupportedScheme {
                scheme: scheme.to_string(),
                context: "building a sample from a toolkit document",
            });
        }

        let dictionary = LabelMap::toolkit_to_pii();
        let rename = |label: &str| {
            if map_toolkit_entities {
                dictionary.get(label).unwrap_or(label).to_string()
            } else {
                label.to_string()
            }
        };

        let spans = doc
            .ents
            .iter()
            .map(|ent| {
                Span::new(
                    rename(&ent.label),
                    ent.text.clone(),
                    ent.start_char,
                    ent.end_char,
                )
            })
            .collect();

        let mut tags = doc.tags(scheme);
        if map_toolkit_entities {
            tags = translate_tags(&tags, &dictionary, false);
        }

        Ok(Self {
            full_text: doc.text.clone(),
            masked: None,
            spans,
            template_id: None,
            metadata: None,
            tokens: doc.tokens.iter().map(|t| t.token.clone()).collect(),
            tags,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_masked(mut self, masked: impl Into<String>) -> Self {
        self.masked = Some(masked.into());
        self
    }

    /// Define os metadados. Sem template explícito, usa `metadata["Template#"]`.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        if self.template_id.is_none() {
            self.template_id = metadata.get(TEMPLATE_KEY).and_then(value_to_string);
        }
        self.metadata = Some(metadata);
        self
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Pares (token, tag) em ordem.
    pub fn tagged_tokens(&self) -> impl Iterator<Item = (&Token, &str)> {
        self.tokens.iter().zip(self.tags.iter().map(String::as_str))
    }

    /// Valor textual de um metadado.
    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata.as_ref()?.get(key).and_then(value_to_string)
    }

    /// Substitui as tags, exigindo uma por token.
    pub fn replace_tags(&mut self, tags: Vec<String>) -> Result<()> {
        if tags.len() != self.tokens.len() {
            return Err(EvalError::LengthMismatch {
                tokens: self.tokens.len(),
                tags: tags.len(),
            });
        }
        self.tags = tags;
        Ok(())
    }

    /// Re-tokeniza o texto e re-deriva as tags a partir dos spans.
    ///
    /// Se a nova tokenização tiver outro número de tokens, a troca acontece
    /// mesmo assim e a divergência é devolvida como diagnóstico.
    pub fn regenerate_tags<T: Tokenizer + ?Sized>(
        &mut self,
        tokenizer: &T,
        scheme: Scheme,
    ) -> Option<TokenMismatch> {
        let (tokens, tags) = span_to_tag(&self.full_text, tokenizer, &self.spans, scheme);
        let mismatch = (tokens.len() != self.tokens.len()).then(|| {
            warn!(
                text = %self.full_text,
                expected = self.tokens.len(),
                actual = tokens.len(),
                "re-tokenization changed the token count"
            );
            TokenMismatch {
                expected: self.tokens.len(),
                actual: tokens.len(),
            }
        });
        self.tokens = tokens;
        self.tags = tags;
        mismatch
    }

    /// Reescreve as tags de BILOU para BIO. Não toca nos spans.
    pub fn bilou_to_bio(&mut self) {
        self.tags = scheme::bilou_to_bio(&self.tags);
    }

    /// Reescreve as tags entre dois esquemas quaisquer.
    pub fn convert_scheme(&mut self, from: Scheme, to: Scheme) {
        self.tags = scheme::convert(&self.tags, from, to);
    }

    /// Traduz o vocabulário das tags e dos tipos dos spans.
    pub fn translate_tags(&mut self, dictionary: &LabelMap, ignore_unknown: bool) {
        self.tags = translate_tags(&self.tags, dictionary, ignore_unknown);
        for span in &mut self.spans {
            // Tipos de span não têm prefixo: consulta direta no dicionário.
            match dictionary.get(&span.entity_type) {
                Some(new_type) => span.entity_type = new_type.to_string(),
                None if ignore_unknown => span.entity_type = OUTSIDE.to_string(),
                None => {}
            }
        }
    }

    /// Traduz tags e spans para o vocabulário do toolkit, zerando os
    /// rótulos desconhecidos.
    pub fn translate_to_toolkit(&mut self) {
        self.translate_tags(&LabelMap::pii_to_toolkit(), true);
    }
}

impl TryFrom<SampleRecord> for Sample {
    type Error = EvalError;

    fn try_from(record: SampleRecord) -> Result<Self> {
        Sample::from_record(record)
    }
}

impl From<Sample> for SampleRecord {
    fn from(sample: Sample) -> Self {
        Self {
            full_text: sample.full_text,
            masked: sample.masked,
            spans: sample.spans,
            tokens: sample.tokens,
            tags: sample.tags,
            template_id: sample.template_id,
            metadata: sample.metadata,
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spans: Vec<String> = self.spans.iter().map(Span::to_string).collect();
        let tokens: Vec<&str> = self.tokens.iter().map(|t| t.text.as_str()).collect();
        writeln!(f, "Full text: {}", self.full_text)?;
        writeln!(f, "Spans: [{}]", spans.join("; "))?;
        writeln!(f, "Tokens: {:?}", tokens)?;
        writeln!(f, "Tags: {:?}", self.tags)
    }
}

/// Metadados podem ser números ou strings; ambos viram texto.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
