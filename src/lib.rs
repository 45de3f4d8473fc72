pub mod cli;
pub mod client;
pub mod client_adapter;
pub mod config;
pub mod interpreter;
pub mod supervisor;

// Re-export main types
pub use client::{Client, ClientError, ClientFuture, FriendTarget, Xyz};
pub use config::Config;
pub use interpreter::{Compiler, Program, Stmt, VM};
pub use supervisor::{TaskId, TaskSupervisor};
