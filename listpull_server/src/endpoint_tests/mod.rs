mod email_queue;
mod helpers;
mod mocks;
mod orders;
mod status;
