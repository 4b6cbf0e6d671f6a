pub mod codec;
pub mod handoff;

pub use codec::{decode, encode, encoded_len, CodecError};
pub use handoff::HandoffStore;
