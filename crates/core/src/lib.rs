#![forbid(unsafe_code)]

pub mod bank;
pub mod model;
pub mod radix;
pub mod time;

pub use bank::QuestionBank;
pub use radix::{Base, Conversion, Numeral, RadixError};
pub use time::Clock;
