//! # Esquemas de Tags (IO, BIO/IOB, BILOU)
//!
//! Define os esquemas de anotação por token e a reescrita de sequências de
//! tags entre eles.
//!
//! | Esquema | Tags possíveis                                   |
//! |---------|--------------------------------------------------|
//! | IO      | `O`, `TIPO`                                      |
//! | BIO     | `O`, `B-TIPO`, `I-TIPO`                          |
//! | BILOU   | `O`, `B-TIPO`, `I-TIPO`, `L-TIPO`, `U-TIPO`      |
//!
//! - `B`: Begin, primeiro token de uma entidade
//! - `I`: Inside, tokens do meio (ou seguintes, no BIO)
//! - `L`: Last, último token de uma entidade com mais de um token
//! - `U`: Unit, entidade de um único token
//! - `O`: Outside, fora de qualquer entidade
//!
//! As tags continuam sendo `String`s para que registros persistidos sejam
//! reproduzidos byte a byte. Uma tag só tem prefixo quando tem mais de dois
//! caracteres e o segundo é `-` (ver [`split_tag`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A tag sentinela "fora de entidade".
pub const OUTSIDE: &str = "O";

/// Esquema de tags por token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// Apenas o tipo da entidade em cada token coberto.
    #[default]
    #[serde(rename = "IO")]
    Io,
    #[serde(rename = "BIO", alias = "IOB")]
    Bio,
    #[serde(rename = "BILOU", alias = "BILUO")]
    Bilou,
}

impl Scheme {
    /// Nome canônico (ex: "BIO").
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Io => "IO",
            Scheme::Bio => "BIO",
            Scheme::Bilou => "BILOU",
        }
    }
}

impl FromStr for Scheme {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IO" => Ok(Scheme::Io),
            "BIO" | "IOB" => Ok(Scheme::Bio),
            "BILOU" | "BILUO" => Ok(Scheme::Bilou),
            _ => Err(EvalError::InvalidScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Separa uma tag em prefixo opcional e tipo.
///
/// `"B-PERSON"` → `(Some('B'), "PERSON")`, `"PERSON"` → `(None, "PERSON")`.
/// Tags curtas como `"O"` ou `"B-"` não têm prefixo.
pub fn split_tag(tag: &str) -> (Option<char>, &str) {
    let mut chars = tag.chars();
    if let (Some(first), Some('-'), Some(_)) = (chars.next(), chars.next(), chars.next()) {
        return (Some(first), &tag[first.len_utf8() + 1..]);
    }
    (None, tag)
}

/// Tipo da entidade de uma tag, ou `None` para a sentinela `O`.
pub fn entity_type(tag: &str) -> Option<&str> {
    if tag == OUTSIDE {
        return None;
    }
    Some(split_tag(tag).1)
}

fn with_prefix(prefix: char, entity_type: &str) -> String {
    format!("{}-{}", prefix, entity_type)
}

/// Reescreve BILOU em BIO: `U-X` → `B-X`, `L-X` → `I-X`.
///
/// Todas as outras tags passam inalteradas. Idempotente.
pub fn bilou_to_bio<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|tag| {
            let tag = tag.as_ref();
            match split_tag(tag) {
                (Some('U'), ty) => with_prefix('B', ty),
                (Some('L'), ty) => with_prefix('I', ty),
                _ => tag.to_string(),
            }
        })
        .collect()
}

/// Reescreve BIO em BILOU.
///
/// Uma entidade começa em `B-X`, ou em `I-X` que não continua uma entidade
/// do mesmo tipo. Entidades de um token viram `U-X`; o último token de uma
/// entidade maior vira `L-X`. Entradas já em BILOU são normalizadas antes.
pub fn bio_to_bilou<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let bio = bilou_to_bio(tags);
    let parsed: Vec<(Option<char>, &str)> = bio.iter().map(|t| split_tag(t)).collect();

    let continues = |i: usize| -> bool {
        match (parsed.get(i), i.checked_sub(1).and_then(|p| parsed.get(p))) {
            (Some((Some('I'), ty)), Some((Some('B' | 'I'), prev_ty))) => ty == prev_ty,
            _ => false,
        }
    };

    bio.iter()
        .enumerate()
        .map(|(i, tag)| match parsed[i] {
            (Some('B' | 'I'), ty) => {
                let starts = !continues(i);
                let ends = !continues(i + 1);
                let prefix = match (starts, ends) {
                    (true, true) => 'U',
                    (true, false) => 'B',
                    (false, false) => 'I',
                    (false, true) => 'L',
                };
                with_prefix(prefix, ty)
            }
            _ => tag.clone(),
        })
        .collect()
}

/// Reescreve IO em BIO.
///
/// Com perda: tokens consecutivos do mesmo tipo viram uma única entidade,
/// mesmo que fossem entidades distintas na origem.
pub fn io_to_bio<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut previous: Option<&str> = None;
    tags.iter()
        .map(|tag| {
            let current = entity_type(tag.as_ref());
            let out = match current {
                None => OUTSIDE.to_string(),
                Some(ty) if previous == Some(ty) => with_prefix('I', ty),
                Some(ty) => with_prefix('B', ty),
            };
            previous = current;
            out
        })
        .collect()
}

/// Remove os prefixos, deixando apenas o tipo (esquema IO).
pub fn to_io<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(|tag| match entity_type(tag.as_ref()) {
            Some(ty) => ty.to_string(),
            None => OUTSIDE.to_string(),
        })
        .collect()
}

/// Converte uma sequência de tags entre quaisquer dois esquemas.
pub fn convert<S: AsRef<str>>(tags: &[S], from: Scheme, to: Scheme) -> Vec<String> {
    match (from, to) {
        (Scheme::Io, Scheme::Io) | (Scheme::Bio, Scheme::Bio) | (Scheme::Bilou, Scheme::Bilou) => {
            tags.iter().map(|t| t.as_ref().to_string()).collect()
        }
        (_, Scheme::Io) => to_io(tags),
        (Scheme::Io, Scheme::Bio) => io_to_bio(tags),
        (Scheme::Io, Scheme::Bilou) => bio_to_bilou(&io_to_bio(tags)),
        (Scheme::Bio, Scheme::Bilou) => bio_to_bilou(tags),
        (Scheme::Bilou, Scheme::Bio) => bilou_to_bio(tags),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("IO".parse::<Scheme>().unwrap(), Scheme::Io);
        assert_eq!("iob".parse::<Scheme>().unwrap(), Scheme::Bio);
        assert_eq!("BIO".parse::<Scheme>().unwrap(), Scheme::Bio);
        assert_eq!("BILUO".parse::<Scheme>().unwrap(), Scheme::Bilou);
        assert!(matches!(
            "BIOES".parse::<Scheme>(),
            Err(EvalError::InvalidScheme(name)) if name == "BIOES"
        ));
    }

    #[test]
    fn test_scheme_serde_names() {
        assert_eq!(serde_json::to_string(&Scheme::Bilou).unwrap(), "\"BILOU\"");
        let scheme: Scheme = serde_json::from_str("\"IOB\"").unwrap();
        assert_eq!(scheme, Scheme::Bio);
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(split_tag("B-PERSON"), (Some('B'), "PERSON"));
        assert_eq!(split_tag("PERSON"), (None, "PERSON"));
        assert_eq!(split_tag("O"), (None, "O"));
        assert_eq!(split_tag("B-"), (None, "B-"));
        assert_eq!(split_tag("X1"), (None, "X1"));
        assert_eq!(split_tag("U-X"), (Some('U'), "X"));
    }

    #[test]
    fn test_bilou_to_bio() {
        let tags = ["U-PERSON", "O", "B-LOCATION", "I-LOCATION", "L-LOCATION", "LOCATION"];
        assert_eq!(
            bilou_to_bio(&tags),
            ["B-PERSON", "O", "B-LOCATION", "I-LOCATION", "I-LOCATION", "LOCATION"]
        );
    }

    #[test]
    fn test_bio_to_bilou() {
        let tags = ["B-PERSON", "O", "B-LOCATION", "I-LOCATION", "I-LOCATION", "B-LOCATION"];
        assert_eq!(
            bio_to_bilou(&tags),
            ["U-PERSON", "O", "B-LOCATION", "I-LOCATION", "L-LOCATION", "U-LOCATION"]
        );
    }

    #[test]
    fn test_bio_to_bilou_ill_formed_inside() {
        // I sem B anterior inicia uma entidade; I de outro tipo também.
        let tags = ["I-PERSON", "I-PERSON", "I-LOCATION", "O", "I-ORG"];
        assert_eq!(
            bio_to_bilou(&tags),
            ["B-PERSON", "L-PERSON", "U-LOCATION", "O", "U-ORG"]
        );
    }

    #[test]
    fn test_io_to_bio_merges_adjacent_same_type() {
        let tags = ["PERSON", "PERSON", "O", "LOCATION", "PERSON"];
        assert_eq!(
            io_to_bio(&tags),
            ["B-PERSON", "I-PERSON", "O", "B-LOCATION", "B-PERSON"]
        );
    }

    #[test]
    fn test_convert_all_pairs() {
        let bilou = ["U-PERSON", "O", "B-LOCATION", "L-LOCATION"];
        assert_eq!(
            convert(&bilou, Scheme::Bilou, Scheme::Io),
            ["PERSON", "O", "LOCATION", "LOCATION"]
        );
        assert_eq!(
            convert(&bilou, Scheme::Bilou, Scheme::Bio),
            ["B-PERSON", "O", "B-LOCATION", "I-LOCATION"]
        );
        let io = ["PERSON", "O", "LOCATION", "LOCATION"];
        assert_eq!(
            convert(&io, Scheme::Io, Scheme::Bilou),
            ["U-PERSON", "O", "B-LOCATION", "L-LOCATION"]
        );
        assert_eq!(convert(&io, Scheme::Io, Scheme::Io), io);
        assert_eq!(convert(&bilou, Scheme::Bilou, Scheme::Bilou), bilou);
        let bio = ["B-PERSON", "I-PERSON", "O"];
        assert_eq!(convert(&bio, Scheme::Bio, Scheme::Bio), bio);
    }

    fn arb_tag() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("O".to_string()),
            Just("X".to_string()),
            Just("B-".to_string()),
            ("[BILU]", "(PERSON|LOCATION)").prop_map(|(p, t)| format!("{}-{}", p, t)),
        ]
    }

    proptest! {
        #[test]
        fn prop_bilou_to_bio_is_idempotent(tags in prop::collection::vec(arb_tag(), 0..20)) {
            let once = bilou_to_bio(&tags);
            prop_assert_eq!(bilou_to_bio(&once), once.clone());
            prop_assert_eq!(once.len(), tags.len());
        }

        #[test]
        fn prop_bilou_roundtrips_through_bio(tags in prop::collection::vec(arb_tag(), 0..20)) {
            let bilou = bio_to_bilou(&tags);
            prop_assert_eq!(bio_to_bilou(&bilou_to_bio(&bilou)), bilou.clone());
            prop_assert_eq!(bilou.len(), tags.len());
        }
    }
}
