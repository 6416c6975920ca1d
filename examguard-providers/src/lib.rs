pub mod form;
pub mod parse;
pub mod request;
pub mod runtime;
pub mod tab_switch;
pub mod upload;
