pub mod bot;
pub mod policy;

pub use bot::{DrawDecision, DrawEstimate, DrawReason, HeuristicParams};
pub use policy::{HeuristicPolicy, Policy, PolicyContext, ScriptedPolicy};
