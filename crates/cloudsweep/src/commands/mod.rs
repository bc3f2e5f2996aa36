pub mod destroy;
pub mod list;
