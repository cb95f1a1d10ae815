pub mod grid_engine;

pub use grid_engine::GridEngine;
