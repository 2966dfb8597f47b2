//! Checkout: state machine, unit of work and order summaries.

mod flow;
mod orchestrator;
mod order;
mod unit_of_work;

pub use flow::{CheckoutFlow, CheckoutState};
pub use orchestrator::CheckoutOrchestrator;
pub use order::{OrderLine, OrderSummary};
pub use unit_of_work::{Applied, UnitOfWork};
