mod build;
mod interaction;
mod view;

pub(in crate::app) use build::{INITIAL_VIEWPORT, generate};
