//! Protocol configuration.
//!
//! [`ProtocolConfig`] holds the funding limit, the minimum liquidity
//! threshold, fee and EMA settings, the shutdown policy and the token
//! whitelist.  Per-token parameters live in [`TokenConfig`].

mod protocol_config;

pub use protocol_config::{
    ProtocolConfig, ShutdownPolicy, TokenConfig, DEFAULT_EMA_ALPHA, DEFAULT_EMA_TOLERANCE,
    DEFAULT_EXIT_FEE,
};
