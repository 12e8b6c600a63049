//! Domain types: bars, financial statements, order flow, macro context, profiles.

pub mod bar;
pub mod financial;
pub mod flow;
pub mod macro_context;
pub mod profile;

pub use bar::{Bar, BarError, BarSeries};
pub use financial::{FinancialSnapshot, QuarterlyReport, MIN_REPORT_GAP_DAYS};
pub use flow::{ChipFlow, ChipFlowStatus};
pub use macro_context::{MacroContext, MarketRegime};
pub use profile::SecurityProfile;
