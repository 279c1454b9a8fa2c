//! Re-exports of the most commonly used items in this crate.

pub use crate::{
    errors::ParamsError,
    protocol::{ProtocolParams, RATIO_DENOMINATOR},
};
