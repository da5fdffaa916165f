pub mod checkout;
pub mod lifecycle;
pub mod matcher;
pub mod otp;
pub mod stats;
pub mod tracker;
