use thiserror::Error;

/// Erros das operações do avaliador.
///
/// Apenas uso estrutural incorreto (configuração inválida, registros
/// corrompidos) vira erro. Problemas de qualidade dos dados, como spans
/// desalinhados ou rótulos desconhecidos, nunca chegam aqui.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Nome de esquema de tags desconhecido (ex: "BIOES").
    #[error("invalid tagging scheme: {0:?} (expected IO, BIO, IOB, BILOU or BILUO)")]
    InvalidScheme(String),

    /// Esquema conhecido, mas não aceito pela operação.
    #[error("scheme {scheme} is not supported when {context}")]
    UnsupportedScheme {
        scheme: String,
        context: &'static str,
    },

    /// O adaptador de modelo foi construído sem modelo.
    #[error("a model must be supplied")]
    MissingModel,

    /// Registro persistido com tags e tokens fora de sincronia.
    #[error("tags and tokens out of lock-step: {tokens} tokens, {tags} tags")]
    LengthMismatch { tokens: usize, tags: usize },

    /// Span com início depois do fim.
    #[error("invalid span: start {start} is after end {end}")]
    InvalidSpan { start: usize, end: usize },

    #[error("tokenizer pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias de resultado para as operações do avaliador.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = EvalError::InvalidScheme("BIOES".into());
        assert!(err.to_string().contains("BIOES"));

        let err = EvalError::LengthMismatch { tokens: 3, tags: 2 };
        assert_eq!(
            err.to_string(),
            "tags and tokens out of lock-step: 3 tokens, 2 tags"
        );

        assert_eq!(EvalError::MissingModel.to_string(), "a model must be supplied");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EvalError>();
    }
}
