//! mldash: controller for an ML classification dashboard.
//!
//! Talks to a prediction backend over HTTP and keeps a set of named display
//! slots up to date: model details, the feature form, the latest result,
//! classification history, model comparison and EDA charts. The same
//! controller drives the browser page (`web`) and the terminal (`cli`).

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod web;
