pub mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod patch;
pub mod scan;
pub mod scheduler;
pub mod slides;
pub mod processing {
    pub mod decay;
    pub mod restore;
}
pub mod render {
    pub mod sink;
}
pub mod tasks {
    pub mod loader;
    pub mod viewer;
}
