pub mod edgex;

pub use edgex::{EdgeXAdapter, Ticker};
