mod client;
mod config;
mod error;
mod logger;
mod protocol;
mod proxy;
mod types;
mod vars;

pub use client::{Transport, UponorClient, UponorClientBuilder, DEFAULT_TIMEOUT};
pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use logger::MessageLogMode;
pub use protocol::{JnapVar, SetPayload, GET_ATTRIBUTES, SET_ATTRIBUTES};
pub use proxy::{CacheState, UponorProxy, DEFAULT_EXPIRATION};
pub use types::*;
pub use vars::{VarChange, Variables, DEFAULT_MODEL, DEFAULT_NAME};

pub use rust_decimal::Decimal;
