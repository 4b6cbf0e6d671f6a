pub mod descriptor;
pub mod kind;
pub mod validate;

pub use descriptor::*;
pub use kind::*;
pub use validate::*;
