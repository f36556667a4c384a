//! Protected API endpoints: code assistance and history.

pub mod handlers;
