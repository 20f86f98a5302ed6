#[cfg(feature = "client")]
pub use walletkit_client as client;
#[cfg(feature = "proxy")]
pub use dev_proxy as proxy;
#[cfg(feature = "types")]
pub use walletkit_types as types;
