pub mod blurring;
pub mod config;
pub mod presentation;
pub mod scheduling;
pub mod shared;
