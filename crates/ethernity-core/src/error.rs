use thiserror::Error;

/// Erros comuns da biblioteca Ethernity
#[derive(Error, Debug)]
pub enum Error {
    /// Erro de comunicação com o node Ethereum
    #[error("Erro de RPC: {0}")]
    RpcError(String),

    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Erro de validação
    #[error("Erro de validação: {0}")]
    ValidationError(String),

    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Bloco inexistente no node; aborta a requisição inteira
    #[error("Bloco {0} não encontrado")]
    BlockNotFound(u64),

    /// Recibo ausente para uma transação do bloco
    #[error("Recibo da transação {0} não encontrado")]
    ReceiptMissing(String),

    /// Oráculo de preço ou consulta de decimais indisponível
    #[error("Oráculo indisponível: {0}")]
    OracleUnavailable(String),

    /// Requisição cancelada pelo chamador
    #[error("Requisição cancelada")]
    Cancelled,

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Indica se o erro é transitório e pode ser repetido pela camada de I/O
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RpcError(_) | Error::TimeoutError(_))
    }
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;
