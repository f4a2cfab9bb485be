#![doc = include_str!("../README.md")]

mod config;
mod counter;
mod epoch;
mod error;
mod generator;
mod pipeline;
mod prefix;
mod radix;
mod scheduler;
mod stats;
mod time;

pub use crate::config::*;
pub use crate::counter::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::prefix::*;
pub use crate::radix::*;
pub use crate::stats::*;
pub use crate::time::*;
