//! Auth-domain credential, grant, and token models.

pub mod grant;
pub mod token;

pub use grant::*;
pub use token::*;
