//! Feature derivation domain module

mod deriver;

pub use deriver::{
    derive, derive_all, derive_frame, drop_zero_listening_time, PUB_DAY_TIME_SEPARATOR,
};
