//! # IVI Layer Manager (`ivi-layermanager`)
//!
//! The command-driven engine of the IVI layer manager. Communicator plugins
//! turn client requests into [`Command`]s and call
//! [`CommandExecutor::execute`]; the [`Layermanager`] applies them to the
//! scene under its lock, asks the renderer to repaint when something visible
//! changed and queues notifications for subscribed clients.
//!
//! ## Transactions
//!
//! Property changes are queued per sender and applied together by the
//! sender's next [`CommandKind::Commit`], under one lock acquisition. A
//! concurrent render or notification drain sees either none or all of them.
//!
//! ## Plugins
//!
//! Renderers, communicators, scene providers and health monitors implement
//! the traits in [`plugin`]. [`Layermanager::start_management`] starts them
//! in that order and [`Layermanager::stop_management`] stops them again.

pub mod application;
pub mod command;
pub mod error;
pub mod executor;
pub mod layermanager;
pub mod plugin;

pub use application::ApplicationReference;
pub use command::{Command, CommandKind, ExecutionContext, ExecutionResult, ExecutionType};
pub use error::{LayermanagerError, PluginError};
pub use executor::CommandExecutor;
pub use layermanager::Layermanager;
pub use plugin::{
    Communicator, HealthMonitor, HealthState, Plugin, PluginContext, PluginHandle, PluginSet, Renderer,
    SceneProvider,
};
