//! Reporting and sales alerts over qualified leads.

pub mod dispatch;
pub mod email;
pub mod error;
pub mod report;

pub use dispatch::{dispatch_alerts, render_alert_email, AlertEmail, DispatchOutcome, Notifier};
pub use email::SmtpNotifier;
pub use error::AlertError;
pub use report::{LeadReport, ScoreStats};
