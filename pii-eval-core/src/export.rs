//! # Exportadores de Formato
//!
//! Projeções de um [`Sample`] para os formatos consumidos por ferramentas
//! externas. Nenhum exportador cria informação nova: todos preservam a ordem
//! dos tokens e a relação uma tag por token.
//!
//! | Formato             | Método                         | Lote                      |
//! |---------------------|--------------------------------|---------------------------|
//! | Linhas por token    | [`Sample::to_conll`]           | [`create_conll_dataset`]  |
//! | Texto + entidades   | [`Sample::to_span_annotations`]| [`create_span_dataset`]   |
//! | JSON de treinamento | [`Sample::to_json_document`]   | [`create_json_corpus`]    |
//! | Documento do toolkit| [`Sample::to_doc`]             | -                         |
//! | Flair (texto)       | [`Sample::to_flair`]           | [`create_flair_dataset`]  |
//!
//! Os lotes processam as amostras em paralelo com `rayon`; cada amostra é
//! independente e a ordem de saída segue a ordem de entrada.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::align::token_ranges;
use crate::doc::Doc;
use crate::sample::Sample;
use crate::scheme::{entity_type, OUTSIDE};
use crate::vocab::{translate_tag, LabelMap};

/// Uma linha por token, no estilo CoNLL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConllRow {
    pub text: String,
    pub pos: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "Template#")]
    pub template_id: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub label: String,
    /// Índice da amostra no lote (preenchido por [`create_conll_dataset`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<usize>,
}

/// Entidades de um documento como `(início, fim, rótulo)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanAnnotations {
    pub entities: Vec<(usize, usize, String)>,
}

/// Token no JSON de treinamento: forma, tag morfológica e rótulo NER.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonToken {
    pub orth: String,
    pub tag: Option<String>,
    pub ner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSentence {
    pub tokens: Vec<JsonToken>,
}

/// Um parágrafo do JSON de treinamento: texto bruto e suas sentenças.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub raw: String,
    pub sentences: Vec<JsonSentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonCorpusEntry {
    pub id: usize,
    pub paragraphs: Vec<JsonDocument>,
}

fn keep_entity(entities: Option<&[&str]>, entity_type: &str) -> bool {
    entities.map_or(true, |keep| keep.contains(&entity_type))
}

fn translate_label(label: &str, dictionary: Option<&LabelMap>) -> String {
    match dictionary {
        Some(dictionary) => translate_tag(label, dictionary, true),
        None => label.to_string(),
    }
}

impl Sample {
    /// Linhas por token. Com `dictionary`, os rótulos são traduzidos e os
    /// desconhecidos viram `O`.
    pub fn to_conll(&self, dictionary: Option<&LabelMap>) -> Vec<ConllRow> {
        let gender = self.metadata_value("Gender");
        let country = self.metadata_value("Country");

        self.tagged_tokens()
            .map(|(token, tag)| ConllRow {
                text: token.text.clone(),
                pos: token.pos.clone(),
                tag: token.tag.clone(),
                template_id: self.template_id.clone(),
                gender: gender.clone(),
                country: country.clone(),
                label: translate_label(tag, dictionary),
                sentence: None,
            })
            .collect()
    }

    /// Texto bruto e entidades `(início, fim, tipo)`.
    ///
    /// `entities` filtra pelos tipos originais, antes da tradução.
    pub fn to_span_annotations(
        &self,
        entities: Option<&[&str]>,
        dictionary: Option<&LabelMap>,
    ) -> (String, SpanAnnotations) {
        let entities = self
            .spans
            .iter()
            .filter(|span| keep_entity(entities, &span.entity_type))
            .map(|span| {
                (
                    span.start_position,
                    span.end_position,
                    translate_label(&span.entity_type, dictionary),
                )
            })
            .collect();
        (self.full_text.clone(), SpanAnnotations { entities })
    }

    /// Documento JSON de treinamento com uma única sentença.
    ///
    /// Tags cujo tipo não está em `entities` viram `O`.
    pub fn to_json_document(
        &self,
        entities: Option<&[&str]>,
        dictionary: Option<&LabelMap>,
    ) -> JsonDocument {
        let tokens = self
            .tagged_tokens()
            .map(|(token, tag)| {
                let tag = match entity_type(tag) {
                    Some(ty) if !keep_entity(entities, ty) => OUTSIDE,
                    _ => tag,
                };
                JsonToken {
                    orth: token.text.clone(),
                    tag: token.tag.clone(),
                    ner: translate_label(tag, dictionary),
                }
            })
            .collect();

        JsonDocument {
            raw: self.full_text.clone(),
            sentences: vec![JsonSentence { tokens }],
        }
    }

    /// Documento do toolkit com as entidades projetadas sobre os tokens.
    ///
    /// Spans que não cobrem nenhum token são descartados com um aviso.
    pub fn to_doc(&self) -> Doc {
        let mut doc = Doc::new(self.full_text.clone(), self.tokens().to_vec());
        let ranges = token_ranges(self.tokens(), &self.spans);

        let mut ents = Vec::with_capacity(self.spans.len());
        for (span, range) in self.spans.iter().zip(ranges) {
            match range.and_then(|r| doc.entity(r, span.entity_type.clone())) {
                Some(ent) => ents.push(ent),
                None => warn!(span = %span, "span does not align with any token, dropped"),
            }
        }
        ents.sort_by_key(|ent| ent.start);
        doc.set_ents(ents);
        doc
    }

    /// Uma linha `"texto pos tag"` por token; `_` quando não há POS.
    pub fn to_flair(&self) -> String {
        self.tagged_tokens()
            .map(|(token, tag)| {
                let pos = token.pos.as_deref().unwrap_or("_");
                format!("{} {} {}", token.text, pos, tag)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Ordena por template: numericamente quando possível, senão pelo texto.
/// Amostras sem template vão para o fim.
fn by_template(a: &Sample, b: &Sample) -> Ordering {
    match (a.template_id.as_deref(), b.template_id.as_deref()) {
        (Some(x), Some(y)) => match (x.parse::<i64>(), y.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn ordered(dataset: &[Sample], sort_by_template_id: bool) -> Vec<&Sample> {
    let mut samples: Vec<&Sample> = dataset.iter().collect();
    if sort_by_template_id {
        samples.sort_by(|a, b| by_template(a, b));
    }
    samples
}

/// Linhas de todas as amostras, com o índice da amostra em `sentence`.
///
/// Com `to_bio`, as tags de cada amostra são convertidas de BILOU para BIO
/// no lugar antes da exportação.
pub fn create_conll_dataset(
    dataset: &mut [Sample],
    dictionary: Option<&LabelMap>,
    to_bio: bool,
) -> Vec<ConllRow> {
    dataset
        .par_iter_mut()
        .enumerate()
        .map(|(i, sample)| {
            if to_bio {
                sample.bilou_to_bio();
            }
            let mut rows = sample.to_conll(dictionary);
            for row in &mut rows {
                row.sentence = Some(i);
            }
            rows
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// `(texto, entidades)` para cada amostra.
pub fn create_span_dataset(
    dataset: &[Sample],
    entities: Option<&[&str]>,
    sort_by_template_id: bool,
    dictionary: Option<&LabelMap>,
) -> Vec<(String, SpanAnnotations)> {
    ordered(dataset, sort_by_template_id)
        .into_par_iter()
        .map(|sample| sample.to_span_annotations(entities, dictionary))
        .collect()
}

/// Corpus JSON de treinamento: um parágrafo por amostra, com `id` sequencial.
pub fn create_json_corpus(
    dataset: &[Sample],
    entities: Option<&[&str]>,
    sort_by_template_id: bool,
    dictionary: Option<&LabelMap>,
) -> Vec<JsonCorpusEntry> {
    ordered(dataset, sort_by_template_id)
        .into_par_iter()
        .enumerate()
        .map(|(id, sample)| JsonCorpusEntry {
            id,
            paragraphs: vec![sample.to_json_document(entities, dictionary)],
        })
        .collect()
}

pub fn create_flair_dataset(dataset: &[Sample]) -> Vec<String> {
    dataset.par_iter().map(Sample::to_flair).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::scheme::Scheme;
    use crate::span::Span;
    use crate::tokenizer::WordTokenizer;

    fn sample(text: &str, spans: Vec<Span>, template: &str) -> Sample {
        let metadata = json!({"Gender": "male", "Country": "Brazil", "Template#": template});
        Sample::from_spans(text, spans, &WordTokenizer, Scheme::Bilou)
            .with_metadata(metadata.as_object().cloned().unwrap())
    }

    fn dataset() -> Vec<Sample> {
        vec![
            sample(
                "Pedro mora em São Paulo",
                vec![
                    Span::new("PERSON", "Pedro", 0, 5),
                    Span::new("LOCATION", "São Paulo", 14, 23),
                ],
                "10",
            ),
            sample(
                "Ligue 555-1234",
                vec![Span::new("PHONE_NUMBER", "555-1234", 6, 14)],
                "2",
            ),
        ]
    }

    #[test]
    fn test_to_conll_rows() {
        let rows = dataset()[0].to_conll(Some(&LabelMap::pii_to_toolkit()));
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["U-PERSON", "O", "O", "B-GPE", "L-GPE"]);
        assert_eq!(rows[0].template_id.as_deref(), Some("10"));
        assert_eq!(rows[0].gender.as_deref(), Some("male"));
        assert_eq!(rows[0].country.as_deref(), Some("Brazil"));
    }

    #[test]
    fn test_create_conll_dataset_converts_to_bio() {
        let mut samples = dataset();
        let rows = create_conll_dataset(&mut samples, None, true);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels[..5], ["B-PERSON", "O", "O", "B-LOCATION", "I-LOCATION"]);
        assert_eq!(rows.len(), samples[0].len() + samples[1].len());
        assert_eq!(rows[0].sentence, Some(0));
        assert_eq!(rows.last().unwrap().sentence, Some(1));
        // A conversão é feita no lugar.
        assert_eq!(samples[0].tags()[0], "B-PERSON");

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["Template#"], "10");
    }

    #[test]
    fn test_span_annotations_filter_and_translate() {
        let (text, annotations) = dataset()[0].to_span_annotations(
            Some(&["LOCATION"][..]),
            Some(&LabelMap::pii_to_toolkit()),
        );
        assert_eq!(text, "Pedro mora em São Paulo");
        assert_eq!(annotations.entities, [(14, 23, "GPE".to_string())]);
    }

    #[test]
    fn test_create_span_dataset_sorted_by_template() {
        let out = create_span_dataset(&dataset(), None, true, None);
        assert_eq!(out[0].0, "Ligue 555-1234");
        assert_eq!(out[1].1.entities.len(), 2);
    }

    #[test]
    fn test_json_document() {
        let to_toolkit = LabelMap::pii_to_toolkit();
        let doc = dataset()[0].to_json_document(Some(&["PERSON"][..]), Some(&to_toolkit));
        assert_eq!(doc.raw, "Pedro mora em São Paulo");
        let ner: Vec<&str> = doc.sentences[0].tokens.iter().map(|t| t.ner.as_str()).collect();
        assert_eq!(ner, ["U-PERSON", "O", "O", "O", "O"]);
        assert_eq!(doc.sentences[0].tokens[3].orth, "São");
    }

    #[test]
    fn test_create_json_corpus_ids() {
        let corpus = create_json_corpus(&dataset(), None, true, None);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].id, 0);
        assert_eq!(corpus[0].paragraphs[0].raw, "Ligue 555-1234");
        let json = serde_json::to_value(&corpus[1]).unwrap();
        assert_eq!(json["paragraphs"][0]["sentences"][0]["tokens"][0]["orth"], "Pedro");
    }

    #[test]
    fn test_to_doc_projects_spans() {
        let doc = dataset()[0].to_doc();
        assert_eq!(doc.ents.len(), 2);
        assert_eq!(doc.ents[1].label, "LOCATION");
        assert_eq!((doc.ents[1].start, doc.ents[1].end), (3, 5));
        assert_eq!(doc.iob_tags(), ["B-PERSON", "O", "O", "B-LOCATION", "I-LOCATION"]);
    }

    #[test]
    fn test_to_doc_drops_unaligned_span() {
        let sample = Sample::from_spans(
            "Ana  Bia",
            vec![Span::new("PERSON", "", 3, 5)],
            &WordTokenizer,
            Scheme::Io,
        );
        assert!(sample.to_doc().ents.is_empty());
    }

    #[test]
    fn test_doc_roundtrip_through_sample() {
        let samples = dataset();
        let first = &samples[0];
        let rebuilt = Sample::from_doc(&first.to_doc(), false, Scheme::Bilou).unwrap();
        assert_eq!(rebuilt.tags(), first.tags());
        assert_eq!(rebuilt.spans, first.spans);
    }

    #[test]
    fn test_to_flair_lines() {
        let flair = dataset()[1].to_flair();
        let lines: Vec<&str> = flair.lines().collect();
        assert_eq!(lines.len(), dataset()[1].len());
        assert_eq!(lines[0], "Ligue _ O");
        assert_eq!(create_flair_dataset(&dataset()).len(), 2);
    }
}
