//! # Tradução de Vocabulário de Rótulos
//!
//! Remapeia tipos de entidade entre dois vocabulários: o do toolkit de NLP
//! (ex: `ORG`, `GPE`, `NORP`) e o vocabulário canônico de PII
//! (ex: `ORGANIZATION`, `LOCATION`).
//!
//! Os dicionários canônicos são constantes nomeadas, convertidas em
//! [`LabelMap`] e passadas explicitamente às funções de tradução. Quem
//! precisar de outro vocabulário monta seu próprio `LabelMap` (inclusive a
//! partir de um objeto JSON).
//!
//! A tradução tem perda nos dois sentidos: `TOOLKIT_TO_PII` colapsa vários
//! rótulos em um só, e o inverso aproximado escolhe um representante. Ida e
//! volta não é a identidade.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scheme::{split_tag, OUTSIDE};

/// Rótulos do toolkit → rótulos canônicos de PII (muitos-para-um).
pub const TOOLKIT_TO_PII: &[(&str, &str)] = &[
    ("ORG", "ORGANIZATION"),
    ("NORP", "ORGANIZATION"),
    ("GPE", "LOCATION"),
    ("LOC", "LOCATION"),
    ("FAC", "LOCATION"),
    ("PERSON", "PERSON"),
    ("LOCATION", "LOCATION"),
    ("ORGANIZATION", "ORGANIZATION"),
];

/// Rótulos canônicos de PII → rótulos do toolkit (inverso aproximado).
pub const PII_TO_TOOLKIT: &[(&str, &str)] = &[
    ("ORGANIZATION", "ORG"),
    ("COUNTRY", "GPE"),
    ("CITY", "GPE"),
    ("LOCATION", "GPE"),
    ("PERSON", "PERSON"),
    ("FIRST_NAME", "PERSON"),
    ("LAST_NAME", "PERSON"),
    ("NATION_MAN", "GPE"),
    ("NATION_WOMAN", "GPE"),
    ("NATION_PLURAL", "GPE"),
    ("NATIONALITY", "GPE"),
    ("GPE", "GPE"),
    ("ORG", "ORG"),
];

/// Dicionário de tipo antigo → tipo novo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    map: HashMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs.iter().copied().collect()
    }

    /// Dicionário canônico toolkit → PII.
    pub fn toolkit_to_pii() -> Self {
        Self::from_pairs(TOOLKIT_TO_PII)
    }

    /// Dicionário canônico PII → toolkit.
    pub fn pii_to_toolkit() -> Self {
        Self::from_pairs(PII_TO_TOOLKIT)
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.map.insert(from.into(), to.into());
    }

    pub fn get(&self, entity_type: &str) -> Option<&str> {
        self.map.get(entity_type).map(String::as_str)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.map.contains_key(entity_type)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Pares ordenados pela chave (para logs e exibição estáveis).
    pub fn sorted_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Traduz o tipo de uma tag, preservando o prefixo.
///
/// - `"O"` nunca é remapeado.
/// - `"B-FOO"` com `{FOO: BAR}` → `"B-BAR"`; `"FOO"` → `"BAR"`.
/// - Tipo ausente do dicionário: `"O"` se `ignore_unknown`, senão a tag
///   original.
pub fn translate_tag(tag: &str, dictionary: &LabelMap, ignore_unknown: bool) -> String {
    if tag == OUTSIDE {
        return OUTSIDE.to_string();
    }

    let (prefix, entity_type) = split_tag(tag);
    match (dictionary.get(entity_type), prefix) {
        (Some(new_type), Some(prefix)) => format!("{}-{}", prefix, new_type),
        (Some(new_type), None) => new_type.to_string(),
        (None, _) if ignore_unknown => OUTSIDE.to_string(),
        (None, _) => tag.to_string(),
    }
}

/// Aplica [`translate_tag`] a cada tag, preservando ordem e comprimento.
pub fn translate_tags<S: AsRef<str>>(
    tags: &[S],
    dictionary: &LabelMap,
    ignore_unknown: bool,
) -> Vec<String> {
    tags.iter()
        .map(|tag| translate_tag(tag.as_ref(), dictionary, ignore_unknown))
        .collect()
}

/// Rótulos do toolkit → PII, mantendo os desconhecidos.
pub fn rename_from_toolkit_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    translate_tags(tags, &LabelMap::toolkit_to_pii(), false)
}

/// Rótulos de PII → toolkit, zerando os desconhecidos para `O`.
pub fn rename_to_toolkit_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    translate_tags(tags, &LabelMap::pii_to_toolkit(), true)
}
