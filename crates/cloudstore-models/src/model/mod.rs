//! Typed model objects over dynamic documents.
//!
//! The [`Model`] trait is the construction seam: every concrete type wraps
//! an [`Entity`] (one document, one property cache) and is built through
//! `from_document`. Variant dispatch by the `type` discriminator lives in
//! [`factory`].

pub mod collection;
pub mod entity;
pub mod factory;
pub mod item;
pub mod order;

pub use collection::Collection;
pub use entity::{Entity, Model};
pub use factory::{register, ModelObject};
pub use item::{File, Folder, Item, SyncState};
pub use order::SortOrder;
