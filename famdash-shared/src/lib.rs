pub mod api;
pub mod domain;
pub mod lockout;
pub mod shopping;
