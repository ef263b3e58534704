//! Core library for TICCL corpus clean-up: anagram hashing, confusion
//! generation, indexing, LD-calc, ranking, and chaining.

pub mod alphabet;
pub mod anahash;
pub mod chain;
pub mod chainclean;
pub mod config;
pub mod confusion;
pub mod error;
pub mod freq;
pub mod index;
pub mod ldrecord;
pub mod lexicon;
pub mod rank;
pub mod wordvec;
pub mod workers;

pub use error::{Result, TicclError};
