//! Client for the tracker API and the state a UI renders from it.

pub mod api;
pub mod board;
pub mod view;

pub use api::Client;
pub use board::{Board, CompletionAction, Sections};
pub use view::ViewState;
