pub mod activity;
pub mod customer;
pub mod legacy;
pub mod vehicle;
