pub mod health;
pub mod invite;
pub mod resolve;
pub mod tracks;
