//! Identity authority services.

mod authorization;
mod token;

pub use authorization::AuthorizationService;
pub use token::TokenService;
