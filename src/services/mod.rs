pub mod ai;
pub mod carrier;
pub mod esign;
pub mod integration;
pub mod resource;
pub mod storage;
pub mod summary;

pub use resource::ResourceService;
