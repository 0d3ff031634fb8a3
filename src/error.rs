#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Bitcoin(#[from] bitcoin::Error),
    #[error(transparent)]
    BitcoinEncode(#[from] bitcoin::consensus::encode::Error),
    #[error(transparent)]
    BitcoinHex(#[from] bitcoin::hashes::hex::Error),
    #[error(transparent)]
    Secp(#[from] bitcoin::secp256k1::Error),
    #[error(transparent)]
    Psbt(#[from] bitcoin::util::psbt::Error),
    #[error(transparent)]
    TaprootBuilder(#[from] bitcoin::util::taproot::TaprootBuilderError),
    #[error(transparent)]
    Sighash(#[from] bitcoin::util::sighash::Error),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("No keys provided")]
    EmptyKeySet,
    #[error("Required number of valid signers is greater than number of provided keys")]
    ThresholdExceedsKeys,
    #[error("Duplicate key in list of keys")]
    DuplicateKey,
    #[error("Invalid public key length: {0}")]
    InvalidKeyLength(usize),
    #[error("Invalid staking parameters: {0}")]
    InvalidParams(String),
    #[error("Insufficient input value: have {available} sats, need {required} sats")]
    InsufficientFunds { available: u64, required: u64 },
    #[error("No Schnorr signature found in witness")]
    SignatureNotFound,
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Invalid transition from {state} on {event}")]
    InvalidTransition { state: String, event: String },
    #[error("Proof of possession scheme cannot be verified locally")]
    UnsupportedPopScheme,
    #[error("Transaction not found")]
    TxNotFound,
    #[error("Failed to finalize taproot tree")]
    TaprootFinalize,
    #[error("{0}")]
    Relayer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
