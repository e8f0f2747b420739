pub mod deploy;
pub mod new;
pub mod retire;
pub mod show;
