pub mod table;
pub mod validator_registration;
