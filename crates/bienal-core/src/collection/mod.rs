pub mod account;
pub mod artist;
pub mod confirmation;
pub mod event;
pub mod image;
pub mod rating;
pub mod sculpture;
