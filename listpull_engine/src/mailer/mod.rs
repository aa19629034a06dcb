//! Customer email: templates, transports and the queue dispatcher.
mod dispatcher;
mod templates;
mod transport;

pub use dispatcher::{DrainOutcome, DrainSummary, EmailDispatcher, MAX_EMAIL_ATTEMPTS};
pub use templates::render_email;
pub use transport::{
    ConfiguredTransport,
    EmailMessage,
    HttpMailConfig,
    HttpMailTransport,
    LogMailTransport,
    MailError,
    MailTransport,
};
