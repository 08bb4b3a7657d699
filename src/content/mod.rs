//! Content module - posts, categories and the links between them

pub mod links;
mod post;

pub use links::{posts_in, LinkGraph, UnresolvedReference};
pub use post::{Category, CategoryRef, ListResponse, Post};
