//! # Spans de Entidades
//!
//! Um [`Span`] é uma ocorrência rotulada de entidade no texto: tipo, valor
//! textual e o intervalo semiaberto `[start, end)` em caracteres.
//!
//! Igualdade e hash são estruturais (os quatro campos), o que permite
//! deduplicar spans ou usá-los em `HashSet` no código de avaliação.
//!
//! ## Exemplo
//!
//! ```rust
//! use pii_eval_core::span::Span;
//!
//! let gold = Span::new("PERSON", "Maria Silva", 10, 21);
//! let pred = Span::new("PERSON", "Silva", 16, 21);
//!
//! assert_eq!(gold.intersect(&pred, false), 5);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Uma entidade anotada sobre um texto fixo.
///
/// As posições são índices de caractere (não de byte) em um intervalo
/// semiaberto: `start_position` é inclusivo, `end_position` é exclusivo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Tipo da entidade (ex: "PERSON", "LOCATION").
    pub entity_type: String,
    /// Texto coberto pela entidade (ex: "Maria Silva").
    pub entity_value: String,
    /// Posição inicial (inclusiva).
    pub start_position: usize,
    /// Posição final (exclusiva).
    pub end_position: usize,
}

impl Span {
    pub fn new(
        entity_type: impl Into<String>,
        entity_value: impl Into<String>,
        start_position: usize,
        end_position: usize,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_value: entity_value.into(),
            start_position,
            end_position,
        }
    }

    /// Como [`Span::new`], mas rejeita `start_position > end_position`.
    pub fn try_new(
        entity_type: impl Into<String>,
        entity_value: impl Into<String>,
        start_position: usize,
        end_position: usize,
    ) -> Result<Self> {
        if start_position > end_position {
            return Err(EvalError::InvalidSpan {
                start: start_position,
                end: end_position,
            });
        }
        Ok(Self::new(entity_type, entity_value, start_position, end_position))
    }

    /// Número de caracteres cobertos.
    pub fn len(&self) -> usize {
        self.end_position.saturating_sub(self.start_position)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Número de caracteres em comum com `other`.
    ///
    /// Retorna 0 quando os intervalos são disjuntos, ou quando
    /// `ignore_entity_type` é falso e os tipos diferem. Caso contrário,
    /// `min(fim) - max(início)`. Intervalos que apenas se tocam
    /// (`a.end == b.start`) têm interseção 0.
    pub fn intersect(&self, other: &Span, ignore_entity_type: bool) -> usize {
        if self.end_position < other.start_position || other.end_position < self.start_position {
            return 0;
        }

        if !ignore_entity_type && self.entity_type != other.entity_type {
            return 0;
        }

        self.char_overlap(other.start_position, other.end_position)
    }

    /// Caracteres em comum com o intervalo `[start, end)`, sem olhar tipos.
    pub fn char_overlap(&self, start: usize, end: usize) -> usize {
        self.end_position
            .min(end)
            .saturating_sub(self.start_position.max(start))
    }

    /// Verdadeiro se os dois spans compartilham ao menos um caractere,
    /// independentemente do tipo.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.intersect(other, true) > 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type: {}, value: {}, start: {}, end: {}",
            self.entity_type, self.entity_value, self.start_position, self.end_position
        )
    }
}
