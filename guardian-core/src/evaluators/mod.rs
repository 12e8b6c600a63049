//! Sub-score evaluators. Each one reads its own inputs, appends its own
//! evidence, and never sees another evaluator's output except the
//! fundamental turnaround flag handed to the technical evaluator.

pub mod chip_flow;
pub mod fundamental;
pub mod macro_overlay;
pub mod technical;

pub use chip_flow::{evaluate_chip_flow, ChipFlowConfig, ChipFlowOutcome, SignalSource};
pub use fundamental::{evaluate_fundamentals, FundamentalConfig, FundamentalOutcome};
pub use macro_overlay::{evaluate_macro, MacroConfig, MacroOutcome};
pub use technical::{evaluate_technical, StopBreach, TechnicalConfig, TechnicalOutcome};
