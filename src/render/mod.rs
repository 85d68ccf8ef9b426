pub mod compositor;
pub mod filters;
pub mod frame;
pub mod prepare;
pub mod timeline;
pub mod transitions;
