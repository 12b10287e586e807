pub mod controller;
pub mod rl;
pub mod store;
pub mod training;

pub use controller::{DuelController, PolicyKind};
pub use rl::{AgentParams, QAgent, QTable, SharedAgent, StateKey};
pub use store::{JsonFileStore, LoadStatus, MemoryStore, PolicyStore, StoreError};
pub use training::{Tally, Trainer, TrainerConfig, TrainingMode, TrainingReport};
