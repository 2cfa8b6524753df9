pub mod ai;
pub mod assistant;
pub mod dialogue;
pub mod export;
pub mod knowledge;
pub mod notify;
