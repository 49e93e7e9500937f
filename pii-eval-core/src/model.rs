//! # Adaptador de Modelo do Toolkit
//!
//! Conecta um modelo externo de NLP (qualquer coisa que transforme texto em
//! [`Doc`]) às amostras de avaliação. O modelo é uma caixa-preta: o
//! adaptador só traduz vocabulários, projeta o documento em tags e filtra os
//! tipos de entidade de interesse.
//!
//! ```rust
//! use pii_eval_core::{tokenizer::tokenize, Doc, Sample, Scheme, ToolkitModel, WordTokenizer};
//!
//! let model = ToolkitModel::builder()
//!     .model(|text: &str| Doc::new(text, tokenize(text)))
//!     .build()
//!     .unwrap();
//!
//! let mut sample = Sample::from_spans("Oi Ana", vec![], &WordTokenizer, Scheme::Bio);
//! let prediction = model.predict(&mut sample);
//! assert_eq!(prediction.tags, ["O", "O"]);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::doc::Doc;
use crate::error::{EvalError, Result};
use crate::sample::Sample;
use crate::scheme::{entity_type, Scheme, OUTSIDE};
use crate::vocab::LabelMap;

/// Um pipeline externo de NLP.
pub trait DocModel {
    fn process(&self, text: &str) -> Doc;
}

impl<F> DocModel for F
where
    F: Fn(&str) -> Doc,
{
    fn process(&self, text: &str) -> Doc {
        self(text)
    }
}

/// Configuração do adaptador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Tipos de entidade mantidos na predição; `None` mantém todos.
    pub entities_to_keep: Option<Vec<String>>,
    pub labeling_scheme: Scheme,
    /// Traduz as tags da amostra para o vocabulário do toolkit antes de
    /// predizer.
    pub translate_to_toolkit_entities: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            entities_to_keep: None,
            labeling_scheme: Scheme::Bio,
            translate_to_toolkit_entities: true,
        }
    }
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn keeps(&self, entity_type: &str) -> bool {
        self.entities_to_keep
            .as_ref()
            .map_or(true, |keep| keep.iter().any(|e| e == entity_type))
    }
}

/// Modelo e amostra discordaram sobre o número de tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMismatch {
    /// Tokens da amostra.
    pub expected: usize,
    /// Tokens produzidos pelo modelo.
    pub actual: usize,
}

/// Resultado de uma predição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Uma tag por token do documento do modelo.
    pub tags: Vec<String>,
    pub token_mismatch: Option<TokenMismatch>,
}

/// Adaptador entre um [`DocModel`] e as amostras.
#[derive(Debug, Clone)]
pub struct ToolkitModel<M> {
    model: M,
    config: ModelConfig,
    dictionary: LabelMap,
}

pub struct ToolkitModelBuilder<M> {
    model: Option<M>,
    config: ModelConfig,
}

impl<M: DocModel> ToolkitModel<M> {
    pub fn builder() -> ToolkitModelBuilder<M> {
        ToolkitModelBuilder {
            model: None,
            config: ModelConfig::default(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Roda o modelo sobre o texto da amostra e devolve as tags previstas.
    ///
    /// Com `translate_to_toolkit_entities`, as tags da própria amostra são
    /// traduzidas no lugar antes da predição (desconhecidos viram `O`).
    pub fn predict(&self, sample: &mut Sample) -> Prediction {
        if self.config.translate_to_toolkit_entities {
            sample.translate_tags(&self.dictionary, true);
        }

        let doc = self.model.process(&sample.full_text);
        let tags = doc
            .tags(self.config.labeling_scheme)
            .into_iter()
            .map(|tag| match entity_type(&tag) {
                Some(ty) if !self.config.keeps(ty) => OUTSIDE.to_string(),
                _ => tag,
            })
            .collect();

        let token_mismatch = if doc.len() != sample.len() {
            warn!(
                text = %sample.full_text,
                expected = sample.len(),
                actual = doc.len(),
                "model tokens differ from sample tokens"
            );
            Some(TokenMismatch {
                expected: sample.len(),
                actual: doc.len(),
            })
        } else {
            None
        };

        Prediction {
            tags,
            token_mismatch,
        }
    }
}

impl<M: DocModel + Sync> ToolkitModel<M> {
    /// [`ToolkitModel::predict`] sobre um lote, em paralelo.
    pub fn predict_all(&self, samples: &mut [Sample]) -> Vec<Prediction> {
        samples
            .par_iter_mut()
            .map(|sample| self.predict(sample))
            .collect()
    }
}

impl<M: DocModel> ToolkitModelBuilder<M> {
    pub fn model(mut self, model: M) -> Self {
        self.model = Some(model);
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entities_to_keep<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.entities_to_keep = Some(entities.into_iter().map(Into::into).collect());
        self
    }

    pub fn labeling_scheme(mut self, scheme: Scheme) -> Self {
        self.config.labeling_scheme = scheme;
        self
    }

    pub fn translate_to_toolkit_entities(mut self, translate: bool) -> Self {
        self.config.translate_to_toolkit_entities = translate;
        self
    }

    pub fn build(self) -> Result<ToolkitModel<M>> {
        let model = self.model.ok_or(EvalError::MissingModel)?;
        let dictionary = LabelMap::pii_to_toolkit();

        if self.config.translate_to_toolkit_entities {
            for (from, to) in dictionary.sorted_pairs() {
                debug!(from, to, "entity translation");
            }
        }

        Ok(ToolkitModel {
            model,
            config: self.config,
            dictionary,
        })
    }
}
