mod dispatch;
mod init;
mod run;

pub use dispatch::dispatch;
