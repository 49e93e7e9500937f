//! # Tokens e Tokenizadores
//!
//! O tokenizador é um colaborador externo: qualquer implementação de
//! [`Tokenizer`] serve, desde que devolva os tokens em ordem, da esquerda
//! para a direita, com offsets únicos.
//!
//! Offsets são contados em caracteres (valores escalares Unicode), não em
//! bytes, para que registros persistidos por outras ferramentas continuem
//! válidos.
//!
//! ## Tokenizadores disponíveis
//!
//! - [`WordTokenizer`]: fronteiras de palavra Unicode (UAX #29). Pontuação
//!   vira token próprio. É o padrão usado por [`tokenize`].
//! - [`PatternTokenizer`]: cada casamento de uma regex é um token.
//!
//! ```rust
//! use pii_eval_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Dana mora em Tel Aviv.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["Dana", "mora", "em", "Tel", "Aviv", "."]);
//! assert_eq!(tokens[3].start, 13);
//! ```

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

/// Um token com sua posição no texto original.
///
/// Os atributos linguísticos (`pos`, `tag`, `dep`, `lemma`) são opcionais e
/// vêm do toolkit que tokenizou o texto. Extensões arbitrárias do toolkit
/// ficam em `extensions` e são serializadas como estão, sob a chave `_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// O texto do token.
    pub text: String,
    /// Offset inicial, em caracteres.
    #[serde(rename = "idx")]
    pub start: usize,
    /// Tag morfológica de granularidade fina.
    #[serde(rename = "tag_", default)]
    pub tag: Option<String>,
    /// Classe gramatical (part-of-speech).
    #[serde(rename = "pos_", default)]
    pub pos: Option<String>,
    /// Relação de dependência.
    #[serde(rename = "dep_", default)]
    pub dep: Option<String>,
    #[serde(rename = "lemma_", default)]
    pub lemma: Option<String>,
    /// Extensões do toolkit: nome -> valor.
    #[serde(rename = "_", default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        Self {
            text: text.into(),
            start,
            tag: None,
            pos: None,
            dep: None,
            lemma: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Comprimento em caracteres.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Offset final (exclusivo), em caracteres.
    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

/// Divide um texto bruto em tokens.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Tokenizador por fronteiras de palavra Unicode.
///
/// Segmentos compostos apenas de espaço em branco são descartados.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        // Os segmentos particionam o texto, então o offset em caracteres é
        // a soma acumulada dos comprimentos.
        let mut char_pos = 0;

        for segment in text.split_word_bounds() {
            let len = segment.chars().count();
            if !segment.chars().all(char::is_whitespace) {
                tokens.push(Token::new(segment, char_pos));
            }
            char_pos += len;
        }

        tokens
    }
}

/// Tokenizador por expressão regular: cada casamento não vazio é um token.
#[derive(Debug, Clone)]
pub struct PatternTokenizer {
    pattern: Regex,
}

impl PatternTokenizer {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Separa apenas por espaço em branco.
    pub fn whitespace() -> Self {
        Self {
            pattern: Regex::new(r"\S+").expect("static pattern"),
        }
    }
}

impl Tokenizer for PatternTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut last_byte = 0;
        let mut char_pos = 0;

        for m in self.pattern.find_iter(text) {
            if m.as_str().is_empty() {
                continue;
            }
            char_pos += text[last_byte..m.start()].chars().count();
            tokens.push(Token::new(m.as_str(), char_pos));
            char_pos += m.as_str().chars().count();
            last_byte = m.end();
        }

        tokens
    }
}

/// Tokeniza com o tokenizador padrão ([`WordTokenizer`]).
pub fn tokenize(text: &str) -> Vec<Token> {
    WordTokenizer.tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_word_tokenizer_basic() {
        let tokens = tokenize("My name is Dana, I live in Tel Aviv.");
        assert_eq!(
            texts(&tokens),
            ["My", "name", "is", "Dana", ",", "I", "live", "in", "Tel", "Aviv", "."]
        );
        assert_eq!(tokens[3].start, 11);
        assert_eq!(tokens[4].start, 15);
    }

    #[test]
    fn test_offsets_are_characters() {
        let tokens = tokenize("José está em São Paulo");
        assert_eq!(texts(&tokens), ["José", "está", "em", "São", "Paulo"]);
        let starts: Vec<usize> = tokens.iter().map(|t| t.start).collect();
        assert_eq!(starts, [0, 5, 10, 13, 17]);
        assert_eq!(tokens[4].end(), 22);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t").is_empty());
    }

    #[test]
    fn test_pattern_tokenizer_whitespace() {
        let tokens = PatternTokenizer::whitespace().tokenize("Ligue  para Ângela, já!");
        assert_eq!(texts(&tokens), ["Ligue", "para", "Ângela,", "já!"]);
        let starts: Vec<usize> = tokens.iter().map(|t| t.start).collect();
        assert_eq!(starts, [0, 7, 12, 20]);
    }

    #[test]
    fn test_pattern_tokenizer_invalid_pattern() {
        assert!(PatternTokenizer::new("(unclosed").is_err());
    }

    #[test]
    fn test_token_record_field_names() {
        let mut token = Token::new("Dana", 11);
        token.pos = Some("PROPN".into());
        token.extensions.insert("is_pii".into(), serde_json::json!(true));

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["idx"], 11);
        assert_eq!(json["pos_"], "PROPN");
        assert_eq!(json["tag_"], serde_json::Value::Null);
        assert_eq!(json["_"]["is_pii"], true);

        let back: Token = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_token_record_minimal() {
        let token: Token = serde_json::from_str(r#"{"text": "Dana", "idx": 3}"#).unwrap();
        assert_eq!(token, Token::new("Dana", 3));
    }
}
