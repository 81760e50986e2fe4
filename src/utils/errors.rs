use thiserror::Error;

use crate::abi::AbiError;
use crate::codec::CodecError;
use crate::types::{Name, PrimitiveError, Regid};

/// Broad failure classes a host can attach different penalty policy to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    ResourceLimit,
    Schema,
    NativeModule,
    State,
    Execution,
}

/// Unified error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("missing authority of {0}")]
    MissingAuth(Regid),

    #[error("missing authority of {account}@{perm} for inline call to {contract}")]
    MissingInlineAuth { contract: Regid, account: Regid, perm: Name },

    #[error("recipients size must be <= {max}")]
    RecipientsExceeded { max: usize },

    #[error("max inline transaction depth {max} exceeded")]
    InlineDepthExceeded { max: u32 },

    #[error("inline transaction too big: {size} > {max} bytes")]
    InlineTransactionTooBig { size: usize, max: usize },

    #[error("too many inline transactions queued (max {max})")]
    InlineQueueFull { max: usize },

    #[error("transaction exceeded the {limit_ms}ms execution limit")]
    Timeout { limit_ms: u64 },

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Primitive(#[from] PrimitiveError),

    #[error("{0}")]
    NativeAssert(String),

    #[error("native module {module} dispatched with receiver {receiver}")]
    WrongReceiver { module: Regid, receiver: Regid },

    #[error("{module} has no action '{action}'")]
    ActionNotFound { module: Regid, action: Name },

    #[error("account {0} does not exist")]
    AccountNotFound(Regid),

    #[error("contract error: {0}")]
    Contract(String),

    #[error("state error: {0}")]
    State(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("[({contract},{action})->{receiver}] {source}")]
    Dispatch {
        contract: Regid,
        action: Name,
        receiver: Regid,
        console: String,
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// The innermost error beneath any dispatch wrappers.
    pub fn root_cause(&self) -> &EngineError {
        let mut current = self;
        while let EngineError::Dispatch { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn kind(&self) -> ErrorKind {
        use EngineError::*;
        match self.root_cause() {
            MissingAuth(_) | MissingInlineAuth { .. } => ErrorKind::Authorization,
            RecipientsExceeded { .. }
            | InlineDepthExceeded { .. }
            | InlineTransactionTooBig { .. }
            | InlineQueueFull { .. }
            | Timeout { .. }
            | Abi(AbiError::ArraySizeExceeded { .. }) => ErrorKind::ResourceLimit,
            Abi(_) | Codec(_) => ErrorKind::Schema,
            Primitive(_) | NativeAssert(_) | WrongReceiver { .. } | ActionNotFound { .. } => {
                ErrorKind::NativeModule
            }
            AccountNotFound(_) | Contract(_) | State(_) => ErrorKind::State,
            Executor(_) | Dispatch { .. } => ErrorKind::Execution,
        }
    }
}

/// Store collaborators report failures through `anyhow`.
impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        EngineError::State(format!("{e:#}"))
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, EngineError>;
