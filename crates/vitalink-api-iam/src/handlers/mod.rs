//! HTTP handlers for the identity authority.

mod authorize;
mod discovery;
mod patients;
mod revocation;
mod token;

pub use authorize::{authorize_page_handler, authorize_submit_handler};
pub use discovery::{discovery_handler, jwks_handler};
pub use patients::{
    delete_patient_handler, get_patient_handler, list_patients_handler, register_patient_handler,
};
pub use revocation::revoke_handler;
pub use token::token_handler;
