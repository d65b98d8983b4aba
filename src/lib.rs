pub mod cli;
pub mod config;
pub mod fetch;
pub mod logger;
pub mod presenter;
pub mod progress_bar;

#[cfg(test)]
mod test_server;
