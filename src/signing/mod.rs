pub mod signer;

pub use signer::{
    load_private_key, load_public_key, sign, sign_with_key, verify, KeyPolicy, Signer,
};
