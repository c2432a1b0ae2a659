pub mod clock;
pub mod validator;
