//! # Alinhamento Span → Tag
//!
//! Projeta spans em offsets de caractere sobre uma sequência de tokens,
//! produzindo exatamente uma tag por token no esquema escolhido.
//!
//! ## Política de alinhamento
//!
//! 1. Um token é coberto por todo span com o qual compartilha ao menos um
//!    caractere.
//! 2. Um token coberto por vários spans pertence ao de maior sobreposição;
//!    empates vão para o span que começa antes e, depois, para o primeiro da
//!    lista.
//! 3. Uma *run* é uma sequência máxima de tokens consecutivos atribuídos ao
//!    **mesmo** span (identidade, não tipo). Dois spans adjacentes do mesmo
//!    tipo geram duas entidades.
//!
//! Spans desalinhados (que cortam um token ao meio) ainda geram tags; spans
//! vazios não cobrem token nenhum. Nada aqui falha por causa dos dados.
//!
//! ## Exemplo
//!
//! ```rust
//! use pii_eval_core::{align::align, scheme::Scheme, span::Span, tokenizer::tokenize};
//!
//! let text = "Visitei Tel Aviv ontem";
//! let tokens = tokenize(text);
//! let spans = [Span::new("LOCATION", "Tel Aviv", 8, 16)];
//!
//! assert_eq!(
//!     align(&tokens, &spans, Scheme::Bilou),
//!     ["O", "B-LOCATION", "L-LOCATION", "O"]
//! );
//! ```

use std::ops::Range;

use tracing::debug;

use crate::scheme::{Scheme, OUTSIDE};
use crate::span::Span;
use crate::tokenizer::{Token, Tokenizer};

/// Para cada token, o índice do span ao qual ele pertence (se houver).
pub fn assign_tokens(tokens: &[Token], spans: &[Span]) -> Vec<Option<usize>> {
    tokens
        .iter()
        .map(|token| {
            let (start, end) = (token.start, token.end());
            let mut best: Option<(usize, usize)> = None; // (índice, sobreposição)

            for (idx, span) in spans.iter().enumerate() {
                let overlap = span.char_overlap(start, end);
                if overlap == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_idx, best_overlap)) => {
                        overlap > best_overlap
                            || (overlap == best_overlap
                                && span.start_position < spans[best_idx].start_position)
                    }
                };
                if better {
                    best = Some((idx, overlap));
                }
            }

            best.map(|(idx, _)| idx)
        })
        .collect()
}

/// Gera uma tag por token para os spans dados.
///
/// O resultado sempre tem `tokens.len()` elementos.
pub fn align(tokens: &[Token], spans: &[Span], scheme: Scheme) -> Vec<String> {
    let assignment = assign_tokens(tokens, spans);
    log_uncovered(&assignment, spans);

    let n = assignment.len();
    (0..n)
        .map(|i| {
            let Some(span_idx) = assignment[i] else {
                return OUTSIDE.to_string();
            };
            let entity_type = &spans[span_idx].entity_type;
            let starts = i == 0 || assignment[i - 1] != Some(span_idx);
            let ends = i + 1 == n || assignment[i + 1] != Some(span_idx);

            match scheme {
                Scheme::Io => entity_type.clone(),
                Scheme::Bio if starts => format!("B-{}", entity_type),
                Scheme::Bio => format!("I-{}", entity_type),
                Scheme::Bilou => {
                    let prefix = match (starts, ends) {
                        (true, true) => 'U',
                        (true, false) => 'B',
                        (false, false) => 'I',
                        (false, true) => 'L',
                    };
                    format!("{}-{}", prefix, entity_type)
                }
            }
        })
        .collect()
}

/// Tokeniza o texto e alinha os spans sobre os tokens.
pub fn span_to_tag<T: Tokenizer + ?Sized>(
    text: &str,
    tokenizer: &T,
    spans: &[Span],
    scheme: Scheme,
) -> (Vec<Token>, Vec<String>) {
    let tokens = tokenizer.tokenize(text);
    let tags = align(&tokens, spans, scheme);
    (tokens, tags)
}

/// Para cada span, o intervalo de índices de token atribuídos a ele.
///
/// `None` para spans que não ficaram com token nenhum. Se outro span
/// "roubou" tokens do meio, o intervalo vai do primeiro ao último token
/// atribuído.
pub fn token_ranges(tokens: &[Token], spans: &[Span]) -> Vec<Option<Range<usize>>> {
    let mut ranges: Vec<Option<Range<usize>>> = vec![None; spans.len()];
    for (token_idx, span_idx) in assign_tokens(tokens, spans).into_iter().enumerate() {
        let Some(span_idx) = span_idx else { continue };
        let range = ranges[span_idx].get_or_insert(token_idx..token_idx + 1);
        range.end = token_idx + 1;
    }
    ranges
}

fn log_uncovered(assignment: &[Option<usize>], spans: &[Span]) {
    for (idx, span) in spans.iter().enumerate() {
        if !assignment.contains(&Some(idx)) {
            debug!(span = %span, "span covers no token");
        }
    }
}
