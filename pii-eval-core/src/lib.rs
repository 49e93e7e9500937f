//! # pii-eval-core: Amostras Rotuladas para Avaliação de NER/PII
//!
//! Este crate representa textos rotulados de forma uniforme para avaliar
//! modelos de reconhecimento de entidades (nomes, locais, documentos, telefones
//! e outros dados pessoais) e converte essas amostras entre os formatos de
//! anotação usados por ferramentas de terceiros.
//!
//! ## Arquitetura
//!
//! O núcleo é o motor de alinhamento span → tag e de conversão entre esquemas:
//!
//! 1.  **Spans** ([`span`]): entidades em offsets de caractere `[início, fim)`.
//! 2.  **Tokenização** ([`tokenizer`]): segmentação do texto preservando offsets.
//! 3.  **Alinhamento** ([`align`]): uma tag por token nos esquemas IO, BIO ou BILOU.
//! 4.  **Esquemas** ([`scheme`]): conversão BILOU ↔ BIO ↔ IO.
//! 5.  **Vocabulários** ([`vocab`]): tradução de rótulos entre dicionários.
//! 6.  **Amostras** ([`sample`]): texto, spans, tokens, tags e metadados.
//! 7.  **Exportação** ([`export`]): CoNLL, anotações de span, JSON de
//!     treinamento, documento do toolkit ([`doc`]) e Flair.
//! 8.  **Modelo** ([`model`]): adaptador para um pipeline externo de NLP.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pii_eval_core::{LabelMap, Sample, Scheme, Span, WordTokenizer};
//!
//! // 1. Texto e spans anotados
//! let text = "Maria mora em Porto Alegre";
//! let spans = vec![
//!     Span::new("PERSON", "Maria", 0, 5),
//!     Span::new("LOCATION", "Porto Alegre", 14, 26),
//! ];
//!
//! // 2. Tokens e tags são derivados na construção
//! let mut sample = Sample::from_spans(text, spans, &WordTokenizer, Scheme::Bilou);
//! assert_eq!(sample.tags(), ["U-PERSON", "O", "O", "B-LOCATION", "L-LOCATION"]);
//!
//! // 3. Conversão de esquema e de vocabulário
//! sample.bilou_to_bio();
//! sample.translate_tags(&LabelMap::pii_to_toolkit(), true);
//! assert_eq!(sample.tags(), ["B-PERSON", "O", "O", "B-GPE", "I-GPE"]);
//! ```

pub mod align;
pub mod doc;
pub mod error;
pub mod export;
pub mod model;
pub mod sample;
pub mod scheme;
pub mod span;
pub mod tokenizer;
pub mod vocab;

pub use doc::{Doc, DocEntity, DocToken, EntIob};
pub use error::{EvalError, Result};
pub use export::{ConllRow, JsonDocument, SpanAnnotations};
pub use model::{DocModel, ModelConfig, Prediction, TokenMismatch, ToolkitModel};
pub use sample::{Sample, SampleRecord};
pub use scheme::Scheme;
pub use span::Span;
pub use tokenizer::{PatternTokenizer, Token, Tokenizer, WordTokenizer};
pub use vocab::LabelMap;
