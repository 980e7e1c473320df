pub mod handlers;
pub mod links;
pub mod mailer;
